//! Identity source: a flat CSV list of handles.
//!
//! One identity per row, first column only. Rows whose first column is blank
//! are skipped and values are trimmed. There is no header row.

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open source list {}: {source}", .path.display())]
    Open { path: PathBuf, source: csv::Error },

    #[error("failed to read row {row} of source list: {source}")]
    Row { row: usize, source: csv::Error },
}

/// Load identities from a CSV file on disk.
pub fn load_identities(path: &Path) -> Result<Vec<String>, SourceError> {
    let reader = csv_reader()
        .from_path(path)
        .map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    collect_identities(reader)
}

/// Read identities from any CSV byte stream.
pub fn read_identities<R: Read>(input: R) -> Result<Vec<String>, SourceError> {
    collect_identities(csv_reader().from_reader(input))
}

fn csv_reader() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All);
    builder
}

fn collect_identities<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<String>, SourceError> {
    let mut identities = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|source| SourceError::Row {
            row: idx + 1,
            source,
        })?;
        if let Some(first) = record.get(0).map(str::trim).filter(|s| !s.is_empty()) {
            identities.push(first.to_string());
        }
    }
    Ok(identities)
}
