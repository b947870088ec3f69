//! Regression Model Implementations

use crate::InferenceError;
use feature_engine::{FeatureVector, FEATURE_DIMENSION};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use tract_onnx::prelude::*;

/// A trained regression model over the 43-column property row
pub trait Regressor: Send + Sync {
    /// Short description for logs and health output
    fn name(&self) -> &str;

    /// Predict a price from a scaled, ordered model row
    fn predict(&self, row: &[f64; FEATURE_DIMENSION]) -> Result<f64, InferenceError>;
}

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX regressor executed with tract
pub struct OnnxRegressor {
    /// Optimized runnable plan
    plan: OnnxPlan,
}

impl OnnxRegressor {
    /// Load and optimize an ONNX model taking a `[1, 43]` f32 input
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        info!("Loading ONNX model: {}", path.display());

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, FEATURE_DIMENSION]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;

        info!("Model loaded successfully");
        Ok(Self { plan })
    }
}

impl Regressor for OnnxRegressor {
    fn name(&self) -> &str {
        "onnx"
    }

    fn predict(&self, row: &[f64; FEATURE_DIMENSION]) -> Result<f64, InferenceError> {
        let values: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, FEATURE_DIMENSION), values)
            .map_err(|e| InferenceError::InvalidInputShape {
                expected: format!("[1, {}]", FEATURE_DIMENSION),
                actual: e.to_string(),
            })?
            .into();

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no outputs".into()))?
            .cast_to::<f64>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        output
            .as_slice::<f64>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?
            .first()
            .copied()
            .ok_or_else(|| InferenceError::InferenceFailed("model output is empty".into()))
    }
}

/// On-disk form of a fitted linear model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Ordinary linear regressor: `intercept + Σ coefficient·value`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegressor {
    coefficients: [f64; FEATURE_DIMENSION],
    intercept: f64,
}

impl LinearRegressor {
    /// Create from coefficients in model column order
    pub fn new(coefficients: [f64; FEATURE_DIMENSION], intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Build from a deserialized artifact, checking its column order
    pub fn from_artifact(artifact: LinearArtifact) -> Result<Self, InferenceError> {
        if artifact.feature_names != FeatureVector::COLUMNS {
            return Err(InferenceError::ModelLoadError(
                "linear model columns do not match the feature schema".to_string(),
            ));
        }

        let coefficients: [f64; FEATURE_DIMENSION] = artifact
            .coefficients
            .as_slice()
            .try_into()
            .map_err(|_| InferenceError::InvalidInputShape {
                expected: FEATURE_DIMENSION.to_string(),
                actual: artifact.coefficients.len().to_string(),
            })?;

        if !artifact.intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(InferenceError::ModelLoadError(
                "linear model has non-finite parameters".to_string(),
            ));
        }

        Ok(Self::new(coefficients, artifact.intercept))
    }

    /// Load a linear model from JSON
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            InferenceError::ModelLoadError(format!("{}: {}", path.display(), e))
        })?;
        let artifact: LinearArtifact = serde_json::from_str(&content).map_err(|e| {
            InferenceError::ModelLoadError(format!("{}: {}", path.display(), e))
        })?;
        info!("Loaded linear model from {}", path.display());
        Self::from_artifact(artifact)
    }
}

impl Regressor for LinearRegressor {
    fn name(&self) -> &str {
        "linear"
    }

    fn predict(&self, row: &[f64; FEATURE_DIMENSION]) -> Result<f64, InferenceError> {
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(row.iter())
                .map(|(c, v)| c * v)
                .sum::<f64>())
    }
}

/// Weighted average of member regressors.
///
/// Matches a voting ensemble: every member predicts and the outputs are
/// averaged with the given weights.
pub struct VotingRegressor {
    members: Vec<Box<dyn Regressor>>,
    weights: Vec<f64>,
    total_weight: f64,
}

impl VotingRegressor {
    /// Create an equally weighted ensemble
    pub fn new(members: Vec<Box<dyn Regressor>>) -> Result<Self, InferenceError> {
        let weights = vec![1.0; members.len()];
        Self::with_weights(members, weights)
    }

    /// Create an ensemble with explicit weights
    pub fn with_weights(
        members: Vec<Box<dyn Regressor>>,
        weights: Vec<f64>,
    ) -> Result<Self, InferenceError> {
        if members.is_empty() {
            return Err(InferenceError::ModelLoadError(
                "voting regressor needs at least one member".to_string(),
            ));
        }
        if weights.len() != members.len() {
            return Err(InferenceError::ModelLoadError(format!(
                "voting regressor has {} members but {} weights",
                members.len(),
                weights.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(InferenceError::ModelLoadError(
                "voting weights must be finite and non-negative".to_string(),
            ));
        }
        let total_weight: f64 = weights.iter().sum();
        if total_weight <= 0.0 {
            return Err(InferenceError::ModelLoadError(
                "voting weights sum to zero".to_string(),
            ));
        }

        info!("Created voting regressor with {} members", members.len());
        Ok(Self {
            members,
            weights,
            total_weight,
        })
    }

    /// Number of member models
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the ensemble has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Regressor for VotingRegressor {
    fn name(&self) -> &str {
        "voting"
    }

    fn predict(&self, row: &[f64; FEATURE_DIMENSION]) -> Result<f64, InferenceError> {
        let mut weighted = 0.0;
        for (member, weight) in self.members.iter().zip(&self.weights) {
            let prediction = member.predict(row)?;
            debug!("Voting member {} predicted {:.2}", member.name(), prediction);
            weighted += weight * prediction;
        }
        Ok(weighted / self.total_weight)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    fn put_varint(buf: &mut Vec<u8>, mut value: u64) {
        while value >= 0x80 {
            buf.push((value as u8) | 0x80);
            value >>= 7;
        }
        buf.push(value as u8);
    }

    fn put_int(buf: &mut Vec<u8>, field: u64, value: u64) {
        put_varint(buf, field << 3);
        put_varint(buf, value);
    }

    fn put_bytes(buf: &mut Vec<u8>, field: u64, data: &[u8]) {
        put_varint(buf, (field << 3) | 2);
        put_varint(buf, data.len() as u64);
        buf.extend_from_slice(data);
    }

    /// TensorProto holding f32 values
    fn float_tensor(name: &str, dims: &[u64], values: &[f32]) -> Vec<u8> {
        let mut tensor = Vec::new();
        for dim in dims {
            put_int(&mut tensor, 1, *dim);
        }
        put_int(&mut tensor, 2, 1);
        put_bytes(&mut tensor, 8, name.as_bytes());
        let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        put_bytes(&mut tensor, 9, &raw);
        tensor
    }

    /// ValueInfoProto of an f32 tensor with a fixed shape
    fn float_value_info(name: &str, dims: &[u64]) -> Vec<u8> {
        let mut shape = Vec::new();
        for dim in dims {
            let mut dimension = Vec::new();
            put_int(&mut dimension, 1, *dim);
            put_bytes(&mut shape, 1, &dimension);
        }
        let mut tensor_type = Vec::new();
        put_int(&mut tensor_type, 1, 1);
        put_bytes(&mut tensor_type, 2, &shape);
        let mut type_proto = Vec::new();
        put_bytes(&mut type_proto, 1, &tensor_type);

        let mut info = Vec::new();
        put_bytes(&mut info, 1, name.as_bytes());
        put_bytes(&mut info, 2, &type_proto);
        info
    }

    fn node(op_type: &str, inputs: &[&str], output: &str) -> Vec<u8> {
        let mut node = Vec::new();
        for input in inputs {
            put_bytes(&mut node, 1, input.as_bytes());
        }
        put_bytes(&mut node, 2, output.as_bytes());
        put_bytes(&mut node, 3, op_type.to_lowercase().as_bytes());
        put_bytes(&mut node, 4, op_type.as_bytes());
        node
    }

    /// Write an ONNX model computing `input · weights + bias` for a
    /// `[1, 43]` input
    pub(crate) fn write_linear_onnx(weights: &[f32; FEATURE_DIMENSION], bias: f32) -> PathBuf {
        let mut graph = Vec::new();
        put_bytes(&mut graph, 1, &node("MatMul", &["input", "weights"], "product"));
        put_bytes(&mut graph, 1, &node("Add", &["product", "bias"], "price"));
        put_bytes(&mut graph, 2, b"linear");
        put_bytes(&mut graph, 5, &float_tensor("weights", &[FEATURE_DIMENSION as u64, 1], weights));
        put_bytes(&mut graph, 5, &float_tensor("bias", &[1], &[bias]));
        put_bytes(&mut graph, 11, &float_value_info("input", &[1, FEATURE_DIMENSION as u64]));
        put_bytes(&mut graph, 12, &float_value_info("price", &[1, 1]));

        let mut opset = Vec::new();
        put_bytes(&mut opset, 1, b"");
        put_int(&mut opset, 2, 13);

        let mut model = Vec::new();
        put_int(&mut model, 1, 7);
        put_bytes(&mut model, 7, &graph);
        put_bytes(&mut model, 8, &opset);

        let path = std::env::temp_dir().join(format!("model-{}.onnx", uuid::Uuid::new_v4()));
        std::fs::write(&path, model).unwrap();
        path
    }

    struct Constant(f64);

    impl Regressor for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn predict(&self, _row: &[f64; FEATURE_DIMENSION]) -> Result<f64, InferenceError> {
            Ok(self.0)
        }
    }

    fn linear_artifact() -> LinearArtifact {
        LinearArtifact {
            feature_names: FeatureVector::COLUMNS.iter().map(|c| c.to_string()).collect(),
            coefficients: (0..FEATURE_DIMENSION).map(|i| i as f64).collect(),
            intercept: 100.0,
        }
    }

    #[test]
    fn test_linear_prediction() {
        let model = LinearRegressor::from_artifact(linear_artifact()).unwrap();
        let mut row = [0.0; FEATURE_DIMENSION];
        row[0] = 2.0;
        row[3] = 1.5;
        row[42] = 1.0;

        // 100 + 0*2 + 3*1.5 + 42*1
        assert!((model.predict(&row).unwrap() - 146.5).abs() < 1e-9);
    }

    #[test]
    fn test_linear_rejects_reordered_columns() {
        let mut artifact = linear_artifact();
        artifact.feature_names.swap(12, 13);
        assert!(matches!(
            LinearRegressor::from_artifact(artifact),
            Err(InferenceError::ModelLoadError(_))
        ));
    }

    #[test]
    fn test_linear_rejects_wrong_width() {
        let mut artifact = linear_artifact();
        artifact.coefficients.pop();
        assert!(matches!(
            LinearRegressor::from_artifact(artifact),
            Err(InferenceError::InvalidInputShape { .. })
        ));
    }

    #[test]
    fn test_linear_load_from_json() {
        let path = std::env::temp_dir().join(format!("linear-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, serde_json::to_string(&linear_artifact()).unwrap()).unwrap();

        let model = LinearRegressor::load(&path).unwrap();
        assert_eq!(model.predict(&[0.0; FEATURE_DIMENSION]).unwrap(), 100.0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_voting_average() {
        let ensemble = VotingRegressor::new(vec![
            Box::new(Constant(100.0)),
            Box::new(Constant(200.0)),
            Box::new(Constant(600.0)),
        ])
        .unwrap();
        assert_eq!(ensemble.predict(&[0.0; FEATURE_DIMENSION]).unwrap(), 300.0);
        assert_eq!(ensemble.len(), 3);
    }

    #[test]
    fn test_voting_weighted_average() {
        let ensemble = VotingRegressor::with_weights(
            vec![Box::new(Constant(100.0)), Box::new(Constant(400.0))],
            vec![2.0, 1.0],
        )
        .unwrap();
        assert_eq!(ensemble.predict(&[0.0; FEATURE_DIMENSION]).unwrap(), 200.0);
    }

    #[test]
    fn test_voting_rejects_bad_weights() {
        assert!(VotingRegressor::new(Vec::new()).is_err());
        assert!(
            VotingRegressor::with_weights(vec![Box::new(Constant(1.0))], vec![1.0, 1.0]).is_err()
        );
        assert!(VotingRegressor::with_weights(vec![Box::new(Constant(1.0))], vec![0.0]).is_err());
    }

    #[test]
    fn test_onnx_prediction() {
        let mut weights = [0.0f32; FEATURE_DIMENSION];
        for (i, w) in weights.iter_mut().enumerate() {
            *w = (i + 1) as f32;
        }
        let path = write_linear_onnx(&weights, 1000.0);

        let model = OnnxRegressor::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let mut row = [0.0; FEATURE_DIMENSION];
        row[0] = 1.0;
        row[42] = 2.0;

        // 1000 + 1*1 + 43*2
        assert_eq!(model.predict(&row).unwrap(), 1087.0);
        assert_eq!(model.predict(&[0.0; FEATURE_DIMENSION]).unwrap(), 1000.0);
    }

    #[test]
    fn test_onnx_missing_model() {
        let result = OnnxRegressor::load(Path::new("/nonexistent/model.onnx"));
        assert!(matches!(result, Err(InferenceError::ModelLoadError(_))));
    }
}
