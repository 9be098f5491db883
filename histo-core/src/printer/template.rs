use std::sync::OnceLock;

use histo_common::{HistoError, Result};
use regex::Regex;

use crate::bucket::Bucket;
use crate::printer::format::{bar, format_g, percentage};
use crate::sample::Sample;

/// A value a placeholder expands to.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// `{range}` / `{range:N}`: `min-max`, optionally to N significant digits.
    Range { digits: Option<usize> },
    /// `{min}` / `{min:N}`
    Min { digits: Option<usize> },
    /// `{max}` / `{max:N}`
    Max { digits: Option<usize> },
    /// `{pct:N}`: share of the histogram total, N significant digits (default 4).
    Pct { digits: usize },
    /// `{bar:W}`: proportional bar, `W` cells for the fullest bucket.
    Bar { width: usize },
    /// `{count}`, `{count:W}`, `{count:W|TEXT}`: right-aligned count, or TEXT for an empty bucket.
    Count { width: usize, empty: Option<String> },
    /// `{total}`
    Total,
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Literal(String),
    Field(Field),
}

/// Row layout for the printer. Cells are separated by `\t` and aligned
/// across rows; each cell mixes literal text and `{name[:arg]}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    cells: Vec<Vec<Piece>>,
}

/// Per-row values handed to a template.
pub(crate) struct Row<'a, T> {
    pub bucket: &'a Bucket<T>,
    pub total: usize,
    pub max_bucket_count: usize,
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{(\w+)(?::([^}]*))?\}").expect("placeholder regex is valid")
    })
}

fn parse_number(name: &str, arg: &str) -> Result<usize> {
    arg.trim()
        .parse()
        .map_err(|_| HistoError::Template(format!("{{{name}}}: {arg:?} is not a number")))
}

fn parse_digits(name: &str, arg: Option<&str>) -> Result<Option<usize>> {
    match arg {
        None => Ok(None),
        Some(a) => match parse_number(name, a)? {
            0 => Err(HistoError::Template(format!("{{{name}}}: digits must be at least 1"))),
            d => Ok(Some(d)),
        },
    }
}

fn parse_field(name: &str, arg: Option<&str>) -> Result<Field> {
    let field = match name {
        "range" => Field::Range { digits: parse_digits(name, arg)? },
        "min" => Field::Min { digits: parse_digits(name, arg)? },
        "max" => Field::Max { digits: parse_digits(name, arg)? },
        "pct" => Field::Pct { digits: parse_digits(name, arg)?.unwrap_or(4) },
        "bar" => match arg {
            Some(a) => Field::Bar { width: parse_number(name, a)? },
            None => return Err(HistoError::Template("{bar} needs a width, e.g. {bar:50}".into())),
        },
        "count" => match arg.map(|a| a.split_once('|').unwrap_or((a, ""))) {
            None => Field::Count { width: 0, empty: None },
            Some((w, empty)) => Field::Count {
                width: if w.trim().is_empty() { 0 } else { parse_number(name, w)? },
                empty: arg.filter(|a| a.contains('|')).map(|_| empty.to_string()),
            },
        },
        "total" => Field::Total,
        other => return Err(HistoError::Template(format!("unknown placeholder {{{other}}}"))),
    };
    Ok(field)
}

fn parse_cell(text: &str) -> Result<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for caps in placeholder().captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else { continue };
        if whole.start() > last {
            pieces.push(Piece::Literal(text[last..whole.start()].to_string()));
        }
        let arg = caps.get(2).map(|m| m.as_str());
        pieces.push(Piece::Field(parse_field(name.as_str(), arg)?));
        last = whole.end();
    }
    if last < text.len() {
        pieces.push(Piece::Literal(text[last..].to_string()));
    }
    Ok(pieces)
}

impl Template {
    pub fn parse(template: &str) -> Result<Self> {
        let template = template.trim_end_matches('\n');
        if template.is_empty() {
            return Err(HistoError::Template("empty template".into()));
        }
        let cells = template.split('\t').map(parse_cell).collect::<Result<Vec<_>>>()?;
        Ok(Self { cells })
    }

    /// `min-max  pct%  bar  count` with ranges printed as-is.
    pub fn int_format(bar_width: usize) -> Self {
        Self::stock(Field::Range { digits: None }, bar_width)
    }

    /// `min-max  pct%  bar  count` with ranges to 3 significant digits.
    pub fn float_format(bar_width: usize) -> Self {
        Self::stock(Field::Range { digits: Some(3) }, bar_width)
    }

    /// The stock layout suited to the sample type.
    pub fn for_sample<T: Sample>(bar_width: usize) -> Self {
        if T::INTEGRAL {
            Self::int_format(bar_width)
        } else {
            Self::float_format(bar_width)
        }
    }

    fn stock(range: Field, bar_width: usize) -> Self {
        Self {
            cells: vec![
                vec![Piece::Field(range)],
                vec![Piece::Field(Field::Pct { digits: 4 }), Piece::Literal("%".into())],
                vec![Piece::Field(Field::Bar { width: bar_width })],
                vec![Piece::Field(Field::Count { width: 4, empty: Some("   -".into()) })],
            ],
        }
    }

    pub fn columns(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn render_row<T: Sample>(&self, row: &Row<'_, T>) -> Vec<String> {
        self.cells
            .iter()
            .map(|cell| {
                cell.iter()
                    .map(|piece| match piece {
                        Piece::Literal(s) => s.clone(),
                        Piece::Field(f) => expand(f, row),
                    })
                    .collect()
            })
            .collect()
    }
}

fn value<T: Sample>(v: T, digits: Option<usize>) -> String {
    match digits {
        Some(d) => format_g(v.as_f64(), d),
        None => v.to_string(),
    }
}

fn expand<T: Sample>(field: &Field, row: &Row<'_, T>) -> String {
    let b = row.bucket;
    match field {
        Field::Range { digits } => format!("{}-{}", value(b.min, *digits), value(b.max, *digits)),
        Field::Min { digits } => value(b.min, *digits),
        Field::Max { digits } => value(b.max, *digits),
        Field::Pct { digits } => format_g(percentage(b.count, row.total), *digits),
        Field::Bar { width } => bar(b.count, row.max_bucket_count, *width),
        Field::Count { width, empty } => match empty {
            Some(text) if b.count == 0 => text.clone(),
            _ => format!("{:>width$}", b.count, width = *width),
        },
        Field::Total => row.total.to_string(),
    }
}
