//! Regression Metrics

use serde::Serialize;
use std::fmt;

/// Error metrics of a set of price predictions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionMetrics {
    /// Mean absolute error
    pub mae: f64,
    /// Mean squared error
    pub mse: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute percentage error, as a fraction
    pub mape: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Explained variance score
    pub evs: f64,
}

impl RegressionMetrics {
    /// Compute metrics for paired observed/predicted values.
    ///
    /// Returns `None` for empty or mismatched inputs. When the observed
    /// values have zero variance, R² and explained variance are 1.0 for a
    /// perfect fit and 0.0 otherwise.
    pub fn compute(observed: &[f64], predicted: &[f64]) -> Option<Self> {
        if observed.is_empty() || observed.len() != predicted.len() {
            return None;
        }

        let n = observed.len() as f64;
        let residuals: Vec<f64> = observed
            .iter()
            .zip(predicted)
            .map(|(y, p)| y - p)
            .collect();

        let mae = residuals.iter().map(|r| r.abs()).sum::<f64>() / n;
        let mse = residuals.iter().map(|r| r * r).sum::<f64>() / n;
        let mape = observed
            .iter()
            .zip(&residuals)
            .map(|(y, r)| r.abs() / y.abs().max(f64::EPSILON))
            .sum::<f64>()
            / n;

        let observed_mean = observed.iter().sum::<f64>() / n;
        let total_ss = observed
            .iter()
            .map(|y| (y - observed_mean).powi(2))
            .sum::<f64>();
        let residual_ss = residuals.iter().map(|r| r * r).sum::<f64>();

        let residual_mean = residuals.iter().sum::<f64>() / n;
        let residual_var = residuals
            .iter()
            .map(|r| (r - residual_mean).powi(2))
            .sum::<f64>()
            / n;
        let observed_var = total_ss / n;

        Some(Self {
            mae,
            mse,
            rmse: mse.sqrt(),
            mape,
            r2: score_ratio(residual_ss, total_ss),
            evs: score_ratio(residual_var, observed_var),
        })
    }
}

/// `1 - numerator / denominator`, kept finite for a constant target
fn score_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        if numerator == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - numerator / denominator
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAE={:.2} MSE={:.2} RMSE={:.2} MAPE={:.4} R2={:.4} EVS={:.4}",
            self.mae, self.mse, self.rmse, self.mape, self.r2, self.evs
        )
    }
}

/// Outcome of scoring a predictor over labelled samples
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Metrics over the evaluated samples, `None` when nothing was evaluated
    pub metrics: Option<RegressionMetrics>,
    /// Samples that produced a prediction
    pub evaluated: usize,
    /// Samples rejected during encoding
    pub skipped: usize,
}
