//! Feature Encoder & Inference Gateway

use crate::metrics::{Evaluation, RegressionMetrics};
use crate::regressor::Regressor;
use crate::InferenceError;
use feature_engine::{
    EncodingError, FeatureEncoder, FeatureVector, LabelledSample, LocationGroupMap,
    PropertyFeatures, ScaledFeatures, StandardScaler,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// Price estimate for one property
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Estimated price in euros
    #[serde(rename = "Predicted label")]
    pub price: f64,
}

/// Immutable prediction context: location groups, fitted scaler and trained
/// model, loaded once and shared by every request.
pub struct PricePredictor {
    encoder: FeatureEncoder,
    scaler: StandardScaler,
    model: Box<dyn Regressor>,
}

impl PricePredictor {
    /// Assemble a predictor from already loaded artifacts
    pub fn new(
        locations: LocationGroupMap,
        scaler: StandardScaler,
        model: Box<dyn Regressor>,
    ) -> Self {
        Self {
            encoder: FeatureEncoder::new(locations),
            scaler,
            model,
        }
    }

    /// Canonicalize, resolve and one-hot encode a property
    pub fn encode(&self, features: &PropertyFeatures) -> Result<FeatureVector, EncodingError> {
        self.encoder.encode(features)
    }

    /// Encode a property and scale its continuous columns
    pub fn prepare(&self, features: &PropertyFeatures) -> Result<ScaledFeatures, EncodingError> {
        Ok(self.scaler.transform(self.encode(features)?))
    }

    /// Estimate the price of a property.
    ///
    /// Unknown locations and districts are rejected before the model runs.
    pub fn encode_and_predict(
        &self,
        features: &PropertyFeatures,
    ) -> Result<PredictionResult, InferenceError> {
        let start = Instant::now();

        let scaled = self.prepare(features)?;
        let price = self.model.predict(&scaled.to_row())?;

        if !price.is_finite() {
            return Err(InferenceError::InferenceFailed(format!(
                "model {} returned a non-finite price",
                self.model.name()
            )));
        }

        debug!(
            "Inference completed in {}us: {:.2} EUR",
            start.elapsed().as_micros(),
            price
        );

        Ok(PredictionResult { price })
    }

    /// Run the model over labelled samples and score it.
    ///
    /// Samples whose location or district cannot be encoded are skipped;
    /// any other failure aborts the evaluation.
    pub fn evaluate(&self, samples: &[LabelledSample]) -> Result<Evaluation, InferenceError> {
        let mut observed = Vec::with_capacity(samples.len());
        let mut predicted = Vec::with_capacity(samples.len());
        let mut skipped = 0;

        for sample in samples {
            match self.encode_and_predict(&sample.features) {
                Ok(result) => {
                    observed.push(sample.price);
                    predicted.push(result.price);
                }
                Err(InferenceError::InvalidInput(e)) => {
                    warn!("Skipping sample: {}", e);
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Evaluation {
            metrics: RegressionMetrics::compute(&observed, &predicted),
            evaluated: observed.len(),
            skipped,
        })
    }

    /// Name of the loaded model
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Number of known locations
    pub fn location_count(&self) -> usize {
        self.encoder.locations().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regressor::LinearRegressor;
    use feature_engine::{District, FEATURE_DIMENSION};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns the sum of the row and counts how often it was called
    struct Recording {
        calls: Arc<AtomicUsize>,
        rows: RecordedRows,
    }

    impl Regressor for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn predict(&self, row: &[f64; FEATURE_DIMENSION]) -> Result<f64, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rows.lock().unwrap().push(*row);
            Ok(1000.0 + row.iter().sum::<f64>())
        }
    }

    struct Broken;

    impl Regressor for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn predict(&self, _row: &[f64; FEATURE_DIMENSION]) -> Result<f64, InferenceError> {
            Ok(f64::NAN)
        }
    }

    fn locations() -> LocationGroupMap {
        LocationGroupMap::from_entries([("IBIZA", 3u8), ("SOL", 0)]).unwrap()
    }

    fn scaler() -> StandardScaler {
        StandardScaler::new(
            [90.0, 1990.0, 3.0, 0.5, 2.5, 2.5, 1.5, 3.0],
            [40.0, 20.0, 1.5, 0.25, 1.0, 1.0, 0.5, 2.0],
        )
        .unwrap()
    }

    type RecordedRows = Arc<std::sync::Mutex<Vec<[f64; FEATURE_DIMENSION]>>>;

    fn recording() -> (PricePredictor, Arc<AtomicUsize>, RecordedRows) {
        let calls = Arc::new(AtomicUsize::new(0));
        let rows = Arc::new(std::sync::Mutex::new(Vec::new()));
        let model = Recording {
            calls: calls.clone(),
            rows: rows.clone(),
        };
        (PricePredictor::new(locations(), scaler(), Box::new(model)), calls, rows)
    }

    fn retiro_ibiza() -> PropertyFeatures {
        PropertyFeatures {
            constructed_area: 80.0,
            has_terrace: false,
            is_parkingspace_included: false,
            number_of_rooms: 3,
            number_of_bathrooms: 1,
            has_swimming_pool: false,
            is_top_floor: false,
            distance_to_city_center: 2.0,
            distance_to_city_metro: 1.0,
            distance_to_city_castellana: 3.0,
            constructed_year: 2000,
            floorclean: 2,
            location: "Ibiza".to_string(),
            district: "Retiro".to_string(),
        }
    }

    #[test]
    fn test_reference_property_row() {
        let (predictor, calls, rows) = recording();
        let result = predictor.encode_and_predict(&retiro_ibiza()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let row = rows.lock().unwrap()[0];
        let col = |name: &str| FeatureVector::COLUMNS.iter().position(|c| *c == name).unwrap();

        assert_eq!(row[col("DISTRICTS_RETIRO")], 1.0);
        assert_eq!(row[col("LOCATIONNAME_3")], 1.0);
        assert_eq!(row[FeatureVector::LOCATION_OFFSET..].iter().sum::<f64>(), 2.0);
        assert!((row[col("CONSTRUCTEDAREA")] - (-0.25)).abs() < 1e-12);
        assert!((row[col("CADMAXBUILDINGFLOOR")] - 0.5).abs() < 1e-12);
        assert!((row[col("DISTANCE_TO_METRO")] - 2.0).abs() < 1e-12);
        assert_eq!(row[col("HASTERRACE")], 0.0);

        assert!((result.price - (1000.0 + row.iter().sum::<f64>())).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_district_never_calls_model() {
        let (predictor, calls, _) = recording();
        let mut features = retiro_ibiza();
        features.district = "Atlantis".to_string();

        let err = predictor.encode_and_predict(&features).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("DISTRICTS_ATLANTIS"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_location_never_calls_model() {
        let (predictor, calls, _) = recording();
        let mut features = retiro_ibiza();
        features.location = "Nowhereville".to_string();

        let err = predictor.encode_and_predict(&features).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::InvalidInput(EncodingError::UnknownLocation(ref loc))
                if loc == "NOWHEREVILLE"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let (predictor, _, _) = recording();
        let first = predictor.encode_and_predict(&retiro_ibiza()).unwrap();
        let second = predictor.encode_and_predict(&retiro_ibiza()).unwrap();
        assert_eq!(first.price.to_bits(), second.price.to_bits());
    }

    #[test]
    fn test_accented_input_matches_plain() {
        let (predictor, _, _) = recording();
        let mut accented = retiro_ibiza();
        accented.district = "Chamartín".to_string();
        let mut plain = retiro_ibiza();
        plain.district = "CHAMARTIN".to_string();

        assert_eq!(predictor.encode(&accented).unwrap().district, District::Chamartin);
        assert_eq!(
            predictor.encode_and_predict(&accented).unwrap(),
            predictor.encode_and_predict(&plain).unwrap()
        );
    }

    #[test]
    fn test_non_finite_output_is_internal_error() {
        let predictor = PricePredictor::new(locations(), scaler(), Box::new(Broken));
        let err = predictor.encode_and_predict(&retiro_ibiza()).unwrap_err();
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_evaluate_skips_unencodable_samples() {
        let mut coefficients = [0.0; FEATURE_DIMENSION];
        coefficients[0] = 40.0;
        let model = LinearRegressor::new(coefficients, 90.0);
        let predictor = PricePredictor::new(locations(), scaler(), Box::new(model));

        // The scaled area times the scale plus the mean reproduces the area.
        let mut unknown = retiro_ibiza();
        unknown.location = "Nowhereville".to_string();
        let samples = vec![
            LabelledSample { features: retiro_ibiza(), price: 80.0 },
            LabelledSample { features: retiro_ibiza(), price: 100.0 },
            LabelledSample { features: unknown, price: 1.0 },
        ];

        let evaluation = predictor.evaluate(&samples).unwrap();
        assert_eq!(evaluation.evaluated, 2);
        assert_eq!(evaluation.skipped, 1);

        let metrics = evaluation.metrics.unwrap();
        assert!((metrics.mae - 10.0).abs() < 1e-9);
        assert!((metrics.mse - 200.0).abs() < 1e-9);
        assert!((metrics.rmse - 200.0f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_result_serializes_with_label_key() {
        let json = serde_json::to_value(PredictionResult { price: 1250.5 }).unwrap();
        assert_eq!(json, serde_json::json!({ "Predicted label": 1250.5 }));
    }
}
