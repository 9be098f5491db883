pub mod bucket;
pub mod duration;
pub mod export;
pub mod histogram;
pub mod input;
pub mod printer;
pub mod sample;

pub use bucket::Bucket;
pub use duration::Nanos;
pub use export::{export_csv, export_json, HistogramReport};
pub use histo_common::{HistoError, Result};
pub use histogram::{Histogram, MAX_BUCKETS};
pub use input::{parse_samples, read_samples_from_paths, resolve_inputs};
pub use printer::{render, render_to_string, Template};
pub use sample::Sample;
