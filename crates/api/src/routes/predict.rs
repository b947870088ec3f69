//! Price prediction endpoint

use crate::error::ApiError;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use feature_engine::PropertyFeatures;
use inference_engine::PredictionResult;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Estimate the price of the property in the request body
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PropertyFeatures>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(features) = payload.map_err(|rejection| {
        counter!("predictions_total", "outcome" => "malformed").increment(1);
        ApiError::from(rejection)
    })?;

    let validation = state.validator.validate(&features);
    if !validation.valid {
        counter!("predictions_total", "outcome" => "invalid").increment(1);
        return Err(ApiError::InvalidInput(validation.message()));
    }

    debug!(
        "Predicting for location={:?} district={:?}",
        features.location, features.district
    );

    let start = Instant::now();
    let predictor = state.predictor.clone();
    let result = tokio::task::spawn_blocking(move || predictor.encode_and_predict(&features))
        .await
        .map_err(|e| ApiError::Internal(format!("inference task failed: {}", e)))?;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) if e.is_client_error() => "invalid",
        Err(_) => "error",
    };
    counter!("predictions_total", "outcome" => outcome).increment(1);
    histogram!("prediction_latency_seconds").record(start.elapsed().as_secs_f64());

    let prediction = result?;
    info!("Predicted price {:.2} EUR", prediction.price);
    Ok(Json(prediction))
}
