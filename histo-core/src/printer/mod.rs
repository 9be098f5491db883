//! Text rendering of histograms.
//!
//! A [`Template`] describes one row per bucket; cells separated by `\t` are
//! aligned across rows the way a tab writer does it (minimum cell width 2,
//! padding 2, the trailing cell left unpadded).

pub mod format;
pub mod template;

pub use format::{bar, format_g, percentage};
pub use template::{Field, Template};

use std::io::Write;

use histo_common::Result;

use crate::histogram::Histogram;
use crate::sample::Sample;
use template::Row;

const MIN_WIDTH: usize = 2;
const PADDING: usize = 2;

/// Writes one aligned row per bucket to `w`. An empty histogram writes nothing.
pub fn render<T: Sample, W: Write>(w: &mut W, hist: &Histogram<T>, template: &Template) -> Result<()> {
    let rows: Vec<Vec<String>> = hist
        .buckets()
        .iter()
        .map(|bucket| {
            template.render_row(&Row {
                bucket,
                total: hist.count(),
                max_bucket_count: hist.max_bucket_count(),
            })
        })
        .collect();

    let mut widths = vec![0usize; template.columns()];
    for row in &rows {
        for (i, cell) in row.iter().enumerate().take(row.len().saturating_sub(1)) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    for row in &rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            line.push_str(cell);
            if i + 1 < row.len() {
                let width = (widths[i] + PADDING).max(MIN_WIDTH);
                line.push_str(&" ".repeat(width - cell.chars().count()));
            }
        }
        writeln!(w, "{line}")?;
    }
    w.flush()?;
    Ok(())
}

pub fn render_to_string<T: Sample>(hist: &Histogram<T>, template: &Template) -> Result<String> {
    let mut buf = Vec::new();
    render(&mut buf, hist, template)?;
    String::from_utf8(buf).map_err(|e| histo_common::HistoError::Other(e.to_string()))
}
