//! Price Inference Engine
//!
//! Loads the fitted artifacts once and turns property descriptions into
//! price estimates. ONNX models run through tract-onnx.

mod artifacts;
mod gateway;
mod metrics;
mod regressor;

pub use artifacts::{ArtifactConfig, ModelArtifact};
pub use gateway::{PredictionResult, PricePredictor};
pub use metrics::{Evaluation, RegressionMetrics};
pub use regressor::{
    LinearArtifact, LinearRegressor, OnnxRegressor, Regressor, VotingRegressor,
};

use feature_engine::{ArtifactError, EncodingError};
use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error(transparent)]
    InvalidInput(#[from] EncodingError),
    #[error("Artifact load failed: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
}

impl InferenceError {
    /// Whether the caller's input caused this error
    pub fn is_client_error(&self) -> bool {
        matches!(self, InferenceError::InvalidInput(_))
    }
}
