//! Storage Layer
//!
//! Read-only property listings and labelled evaluation samples, loaded
//! from CSV into memory.

mod listings;
mod samples;

pub use listings::{DistrictSummary, ListingQuery, ListingRepository, PropertyListing};
pub use samples::load_labelled_samples;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed CSV in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Missing column {column} in {path}")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("District not found: {0}")]
    NotFound(String),
}

pub(crate) fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>, StorageError> {
    let file = std::fs::File::open(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::Reader::from_reader(file))
}
