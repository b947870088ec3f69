//! Fitted Standard Scaler

use crate::error::ArtifactError;
use crate::features::{
    ContinuousColumn, ContinuousFeatures, FeatureVector, CONTINUOUS_DIMENSION, FEATURE_DIMENSION,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// On-disk form of a fitted standard scaler.
///
/// Field names follow the fitted attributes of the training library's
/// `StandardScaler` (`feature_names_in_`, `mean_`, `scale_`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub feature_names_in: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Z-score scaler over the continuous columns, with parameters fixed at
/// training time
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: [f64; CONTINUOUS_DIMENSION],
    scale: [f64; CONTINUOUS_DIMENSION],
}

impl StandardScaler {
    /// Create from per-column mean and scale in scaler order
    pub fn new(
        mean: [f64; CONTINUOUS_DIMENSION],
        scale: [f64; CONTINUOUS_DIMENSION],
    ) -> Result<Self, ArtifactError> {
        for (idx, column) in ContinuousColumn::ALL.iter().enumerate() {
            if !mean[idx].is_finite() {
                return Err(ArtifactError::Schema(format!(
                    "scaler mean for {} is not finite",
                    column.name()
                )));
            }
            if !scale[idx].is_finite() || scale[idx] <= 0.0 {
                return Err(ArtifactError::Schema(format!(
                    "scaler scale for {} must be positive, got {}",
                    column.name(),
                    scale[idx]
                )));
            }
        }
        Ok(Self { mean, scale })
    }

    /// Build from a deserialized artifact, checking its column order
    pub fn from_artifact(artifact: ScalerArtifact) -> Result<Self, ArtifactError> {
        let expected: Vec<&str> = ContinuousColumn::ALL.iter().map(|c| c.name()).collect();
        if artifact.feature_names_in != expected {
            return Err(ArtifactError::Schema(format!(
                "scaler columns {:?} do not match expected {:?}",
                artifact.feature_names_in, expected
            )));
        }

        let mean: [f64; CONTINUOUS_DIMENSION] =
            artifact.mean.as_slice().try_into().map_err(|_| {
                ArtifactError::Schema(format!(
                    "scaler has {} means, expected {}",
                    artifact.mean.len(),
                    CONTINUOUS_DIMENSION
                ))
            })?;
        let scale: [f64; CONTINUOUS_DIMENSION] =
            artifact.scale.as_slice().try_into().map_err(|_| {
                ArtifactError::Schema(format!(
                    "scaler has {} scales, expected {}",
                    artifact.scale.len(),
                    CONTINUOUS_DIMENSION
                ))
            })?;

        Self::new(mean, scale)
    }

    /// Load a scaler artifact from JSON
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let artifact: ScalerArtifact = ArtifactError::read_json(path)?;
        let scaler = Self::from_artifact(artifact)?;
        info!("Loaded scaler from {}", path.display());
        Ok(scaler)
    }

    /// Mean and scale of one column
    pub fn params(&self, column: ContinuousColumn) -> (f64, f64) {
        let idx = column.index();
        (self.mean[idx], self.scale[idx])
    }

    /// Scale the continuous columns of a vector: `(value - mean) / scale`.
    ///
    /// Flags and indicators pass through untouched.
    pub fn transform(&self, vector: FeatureVector) -> ScaledFeatures {
        let mut values = vector.continuous.to_array();
        for (idx, value) in values.iter_mut().enumerate() {
            *value = (*value - self.mean[idx]) / self.scale[idx];
        }

        ScaledFeatures(FeatureVector {
            continuous: ContinuousFeatures::from_array(values),
            ..vector
        })
    }
}

/// A feature vector whose continuous columns have been scaled.
///
/// Only [`StandardScaler::transform`] produces this type, so a row cannot
/// reach the model unscaled or scaled twice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledFeatures(FeatureVector);

impl ScaledFeatures {
    /// Underlying scaled vector
    pub fn vector(&self) -> &FeatureVector {
        &self.0
    }

    /// Model input row
    pub fn to_row(&self) -> [f64; FEATURE_DIMENSION] {
        self.0.to_row()
    }
}
