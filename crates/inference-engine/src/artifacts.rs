//! Artifact Configuration and Loading

use crate::gateway::PricePredictor;
use crate::regressor::{LinearRegressor, OnnxRegressor, Regressor, VotingRegressor};
use crate::InferenceError;
use feature_engine::{LocationGroupMap, StandardScaler};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Trained model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    /// ONNX export of the trained regressor
    Onnx { path: PathBuf },
    /// Linear model coefficients as JSON
    Linear { path: PathBuf },
    /// Weighted average of several member models
    Voting {
        members: Vec<ModelArtifact>,
        #[serde(default)]
        weights: Option<Vec<f64>>,
    },
}

impl ModelArtifact {
    /// Load the model this artifact describes
    pub fn load(&self) -> Result<Box<dyn Regressor>, InferenceError> {
        match self {
            ModelArtifact::Onnx { path } => Ok(Box::new(OnnxRegressor::load(path)?)),
            ModelArtifact::Linear { path } => Ok(Box::new(LinearRegressor::load(path)?)),
            ModelArtifact::Voting { members, weights } => {
                let models = members
                    .iter()
                    .map(ModelArtifact::load)
                    .collect::<Result<Vec<_>, _>>()?;
                let ensemble = match weights {
                    Some(weights) => VotingRegressor::with_weights(models, weights.clone())?,
                    None => VotingRegressor::new(models)?,
                };
                Ok(Box::new(ensemble))
            }
        }
    }
}

/// Locations of every artifact the predictor needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// JSON map of location name to location group
    pub location_groups: PathBuf,
    /// JSON parameters of the fitted scaler
    pub scaler: PathBuf,
    /// Trained model
    pub model: ModelArtifact,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            location_groups: PathBuf::from("artifacts/location_groups.json"),
            scaler: PathBuf::from("artifacts/scaler.json"),
            model: ModelArtifact::Onnx {
                path: PathBuf::from("artifacts/voting_regressor.onnx"),
            },
        }
    }
}

impl PricePredictor {
    /// Load every artifact and assemble the predictor.
    ///
    /// Any failure here is fatal to startup.
    pub fn load(config: &ArtifactConfig) -> Result<Self, InferenceError> {
        let locations = LocationGroupMap::load(&config.location_groups)?;
        let scaler = StandardScaler::load(&config.scaler)?;
        let model = config.model.load()?;

        info!(
            "Predictor ready: model={}, locations={}",
            model.name(),
            locations.len()
        );
        Ok(PricePredictor::new(locations, scaler, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regressor::LinearArtifact;
    use feature_engine::{
        ContinuousColumn, FeatureVector, PropertyFeatures, ScalerArtifact, FEATURE_DIMENSION,
    };
    use std::path::Path;

    struct Fixture {
        dir: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("artifacts-{}", uuid::Uuid::new_v4()));
            std::fs::create_dir_all(&dir).unwrap();

            std::fs::write(dir.join("locations.json"), r#"{"IBIZA": 3, "SOL": 0}"#).unwrap();

            let scaler = ScalerArtifact {
                feature_names_in: ContinuousColumn::ALL
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect(),
                mean: vec![0.0; 8],
                scale: vec![1.0; 8],
            };
            let scaler = serde_json::to_string(&scaler).unwrap();
            std::fs::write(dir.join("scaler.json"), scaler).unwrap();

            for (name, intercept) in [("low.json", 1000.0), ("high.json", 3000.0)] {
                let linear = LinearArtifact {
                    feature_names: FeatureVector::COLUMNS.iter().map(|c| c.to_string()).collect(),
                    coefficients: vec![0.0; FEATURE_DIMENSION],
                    intercept,
                };
                std::fs::write(dir.join(name), serde_json::to_string(&linear).unwrap()).unwrap();
            }

            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.join(name)
        }

        fn config(&self, model: ModelArtifact) -> ArtifactConfig {
            ArtifactConfig {
                location_groups: self.path("locations.json"),
                scaler: self.path("scaler.json"),
                model,
            }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    fn property() -> PropertyFeatures {
        serde_json::from_value(serde_json::json!({
            "constructed_area": 80.0, "has_terrace": 0, "is_parkingspace_included": 0,
            "number_of_rooms": 3, "number_of_bathrooms": 1, "has_swimming_pool": 0,
            "is_top_floor": 0, "distance_to_city_center": 2.0, "distance_to_city_metro": 1.0,
            "distance_to_city_castellana": 3.0, "constructed_year": 2000, "floorclean": 2,
            "location": "Ibiza", "district": "Retiro"
        }))
        .unwrap()
    }

    #[test]
    fn test_load_linear_predictor() {
        let fixture = Fixture::new();
        let config = fixture.config(ModelArtifact::Linear { path: fixture.path("low.json") });

        let predictor = PricePredictor::load(&config).unwrap();
        assert_eq!(predictor.model_name(), "linear");
        assert_eq!(predictor.location_count(), 2);
        assert_eq!(predictor.encode_and_predict(&property()).unwrap().price, 1000.0);
    }

    #[test]
    fn test_load_onnx_predictor() {
        let fixture = Fixture::new();
        let mut weights = [0.0f32; FEATURE_DIMENSION];
        weights[0] = 2.0;
        let model_path = crate::regressor::tests::write_linear_onnx(&weights, 1000.0);
        let config = fixture.config(ModelArtifact::Onnx { path: model_path.clone() });

        let predictor = PricePredictor::load(&config);
        std::fs::remove_file(&model_path).ok();
        let predictor = predictor.unwrap();

        // Identity scaler, so the model sees the raw 80 m² area.
        assert_eq!(predictor.model_name(), "onnx");
        assert_eq!(predictor.encode_and_predict(&property()).unwrap().price, 1160.0);
    }

    #[test]
    fn test_load_voting_predictor() {
        let fixture = Fixture::new();
        let config = fixture.config(ModelArtifact::Voting {
            members: vec![
                ModelArtifact::Linear { path: fixture.path("low.json") },
                ModelArtifact::Linear { path: fixture.path("high.json") },
            ],
            weights: Some(vec![3.0, 1.0]),
        });

        let predictor = PricePredictor::load(&config).unwrap();
        assert_eq!(predictor.model_name(), "voting");
        assert_eq!(predictor.encode_and_predict(&property()).unwrap().price, 1500.0);
    }

    #[test]
    fn test_missing_artifact_fails() {
        let fixture = Fixture::new();
        let mut config = fixture.config(ModelArtifact::Linear { path: fixture.path("low.json") });
        config.scaler = Path::new("/nonexistent/scaler.json").to_path_buf();

        let err = PricePredictor::load(&config).err().unwrap();
        assert!(matches!(err, InferenceError::Artifact(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_model_artifact_from_json() {
        let artifact: ModelArtifact = serde_json::from_str(
            r#"{"kind": "voting", "members": [{"kind": "onnx", "path": "rf.onnx"}, {"kind": "linear", "path": "lr.json"}]}"#,
        )
        .unwrap();

        assert_eq!(
            artifact,
            ModelArtifact::Voting {
                members: vec![
                    ModelArtifact::Onnx { path: PathBuf::from("rf.onnx") },
                    ModelArtifact::Linear { path: PathBuf::from("lr.json") },
                ],
                weights: None,
            }
        );
    }
}
