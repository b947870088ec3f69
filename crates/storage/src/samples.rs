//! Labelled Sample Loading

use crate::{open_csv, StorageError};
use feature_engine::{LabelledSample, PropertyFeatures};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct ObservedPrice {
    price: f64,
}

/// Load properties with their observed price for offline evaluation.
///
/// The CSV carries one column per `PropertyFeatures` field plus `price`.
pub fn load_labelled_samples(path: &Path) -> Result<Vec<LabelledSample>, StorageError> {
    let mut reader = open_csv(path)?;
    let csv_error = |source| StorageError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let headers = reader.headers().map_err(csv_error)?.clone();
    if !headers.iter().any(|h| h == "price") {
        return Err(StorageError::MissingColumn {
            path: path.to_path_buf(),
            column: "price",
        });
    }

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let features: PropertyFeatures = record.deserialize(Some(&headers)).map_err(csv_error)?;
        let observed: ObservedPrice = record.deserialize(Some(&headers)).map_err(csv_error)?;
        samples.push(LabelledSample {
            features,
            price: observed.price,
        });
    }

    info!("Loaded {} labelled samples from {}", samples.len(), path.display());
    Ok(samples)
}
