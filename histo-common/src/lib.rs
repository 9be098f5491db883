pub mod config;
pub use config::{BucketingConfig, Config, ExportConfig, RenderConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: cannot parse {token:?} as a sample")]
    Parse { line: usize, token: String },
    #[error("template error: {0}")]
    Template(String),
    #[error("config error: {0}")]
    Config(String),
    /// The looked-up value fell outside every bucket; `clamped` is the
    /// best-effort index (the last bucket).
    #[error("value outside of histogram range (clamped to bucket {clamped})")]
    ValueOutOfRange { clamped: usize },
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HistoError>;
