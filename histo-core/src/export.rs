use histo_common::{HistoError, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::bucket::Bucket;
use crate::histogram::Histogram;
use crate::printer::percentage;
use crate::sample::Sample;

/// Serializable view of a histogram, tagged with how it was built.
#[derive(Debug, Serialize)]
pub struct HistogramReport<'a, T> {
    pub strategy: &'a str,
    pub count: usize,
    pub min_bucket_count: usize,
    pub max_bucket_count: usize,
    pub buckets: &'a [Bucket<T>],
}

impl<'a, T: Sample + Serialize> HistogramReport<'a, T> {
    pub fn new(strategy: &'a str, hist: &'a Histogram<T>) -> Self {
        Self {
            strategy,
            count: hist.count(),
            min_bucket_count: hist.min_bucket_count(),
            max_bucket_count: hist.max_bucket_count(),
            buckets: hist.buckets(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let out = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        out.map_err(|e| HistoError::Other(e.to_string()))
    }
}

pub fn export_json<T: Sample + Serialize>(
    output_path: &Path,
    report: &HistogramReport<'_, T>,
    pretty: bool,
) -> Result<()> {
    std::fs::write(output_path, report.to_json(pretty)?)?;
    Ok(())
}

pub fn export_csv<T: Sample>(output_path: &Path, hist: &Histogram<T>) -> Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(output_path)?);
    writeln!(file, "index,min,max,count,pct")?;
    for (i, b) in hist.buckets().iter().enumerate() {
        writeln!(
            file,
            "{},{},{},{},{:.4}",
            i,
            b.min,
            b.max,
            b.count,
            percentage(b.count, hist.count())
        )?;
    }
    file.flush()?;
    Ok(())
}
