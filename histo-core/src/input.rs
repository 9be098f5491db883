use histo_common::{HistoError, Result};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Parses numbers separated by whitespace or commas. `#` starts a comment
/// running to the end of the line.
pub fn parse_samples<T: FromStr, R: BufRead>(reader: R) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.split('#').next().unwrap_or("");
        for token in content.split(|c: char| c.is_whitespace() || c == ',') {
            if token.is_empty() {
                continue;
            }
            let value = token.parse().map_err(|_| HistoError::Parse {
                line: idx + 1,
                token: token.to_string(),
            })?;
            out.push(value);
        }
    }
    Ok(out)
}

/// Regular files directly inside `dir`, sorted by path.
fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            results.push(path);
        }
    }
    results.sort();
    Ok(results)
}

/// Resolves an input string: a single file, a directory, or a glob pattern.
pub fn resolve_inputs(input: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(input);
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if path.is_dir() {
        return scan_directory(path);
    }
    let entries = glob::glob(input).map_err(|e| HistoError::Other(format!("{input}: {e}")))?;
    let mut results: Vec<PathBuf> = entries.flatten().filter(|p| p.is_file()).collect();
    results.sort();
    if results.is_empty() {
        return Err(HistoError::Other(format!("no input files match {input}")));
    }
    Ok(results)
}

pub fn read_samples_from_paths<T: FromStr>(paths: &[PathBuf]) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for path in paths {
        let file = std::fs::File::open(path)?;
        let samples: Vec<T> = parse_samples(std::io::BufReader::new(file)).map_err(|e| match e {
            HistoError::Parse { .. } => HistoError::Other(format!("{}: {e}", path.display())),
            other => other,
        })?;
        debug!(path = %path.display(), samples = samples.len(), "read samples");
        out.extend(samples);
    }
    Ok(out)
}
