const FULL_BLOCK: char = '\u{2588}';
const EIGHTH_BLOCK: char = '\u{258F}';

/// Share of `total` held by `count`, in percent. Zero when `total` is zero.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

/// Bar of `count` scaled so that `max_count` spans `width` full blocks,
/// followed by a partial block for the remaining eighths. An empty bucket
/// still gets the thinnest glyph so the column never collapses.
pub fn bar(count: usize, max_count: usize, width: usize) -> String {
    if count == 0 || max_count == 0 {
        return EIGHTH_BLOCK.to_string();
    }
    let scale = width as f64 / max_count as f64;
    let size = count as f64 * scale;
    let full = size as usize;
    let decimal = size % 1.0 * 10.0;
    let partial = (decimal / 10.0 * 8.0) as u32;

    let mut out = FULL_BLOCK.to_string().repeat(full);
    if partial > 0 {
        out.push(char::from_u32(EIGHTH_BLOCK as u32 - partial).unwrap_or(EIGHTH_BLOCK));
    }
    out
}

/// Formats like C's `%.Ng`: `digits` significant digits, trailing zeros
/// dropped, exponent notation outside `1e-4 <= |v| < 10^digits`.
pub fn format_g(v: f64, digits: usize) -> String {
    if v.is_nan() {
        return "NaN".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf".into() } else { "-Inf".into() };
    }
    if v == 0.0 {
        return "0".into();
    }
    let digits = digits.max(1);
    let sci = format!("{:.*e}", digits - 1, v);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", trim_zeros(mantissa), sign, exp.abs());
    }
    let decimals = (digits as i32 - 1 - exp).max(0) as usize;
    trim_zeros(&format!("{:.*}", decimals, v)).to_string()
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
