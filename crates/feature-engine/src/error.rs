//! Encoding and Artifact Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while encoding a property into a feature vector.
///
/// Both variants are caused by the caller's input and carry the string
/// after canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Location not present in the location group map
    #[error("Invalid location name: {0}")]
    UnknownLocation(String),

    /// District not one of the known Madrid districts
    #[error("Invalid district name: {0}")]
    UnknownDistrict(String),
}

/// Errors raised while loading a fitted artifact from disk
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Artifact file could not be read
    #[error("Failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact file is not valid JSON for the expected shape
    #[error("Failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Artifact parsed but its contents disagree with the feature schema
    #[error("Artifact schema mismatch: {0}")]
    Schema(String),
}

impl ArtifactError {
    /// Read and deserialize a JSON artifact
    pub(crate) fn read_json<T: serde::de::DeserializeOwned>(
        path: &std::path::Path,
    ) -> Result<T, ArtifactError> {
        let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
