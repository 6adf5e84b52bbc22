//! Regressor trait and evaluation metrics

use crate::error::{AutoMlError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::warn;

/// Metrics for a regressor scored on held-out rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// R-squared
    pub r2: f64,
    /// Number of scored samples
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compute regression metrics.
    ///
    /// R² is always finite: a constant `y_true` scores 1.0 when predicted
    /// exactly and 0.0 otherwise.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(AutoMlError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(AutoMlError::ComputationError(
                "cannot score an empty prediction set".to_string(),
            ));
        }
        if y_pred.iter().any(|p| !p.is_finite()) {
            return Err(AutoMlError::ComputationError(
                "predictions contain non-finite values".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let mse = ss_res / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();

        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else {
            warn!(n_samples = y_true.len(), "held-out target is constant, R2 is undefined");
            if ss_res == 0.0 { 1.0 } else { 0.0 }
        };

        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
            n_samples: y_true.len(),
        })
    }
}

/// A regression model that can be fitted and queried.
///
/// Implementors are plain owned values with no interior mutability, so a
/// fitted model can be shared across threads for prediction.
pub trait Regressor: Send + Sync + Debug {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Display name
    fn name(&self) -> &str;

    /// Get feature importances (if available)
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }
}

/// Shape and finiteness checks shared by every regressor's `fit`.
pub(crate) fn check_training_data(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(AutoMlError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(AutoMlError::ComputationError(
            "cannot fit on zero rows".to_string(),
        ));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(AutoMlError::ComputationError(
            "training data contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_regression_metrics() {
        let y_true = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y_pred = array![1.1, 2.0, 2.9, 4.1, 5.0];

        let metrics = RegressionMetrics::compute(&y_true, &y_pred).unwrap();

        assert_abs_diff_eq!(metrics.mse, 0.006, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.rmse, 0.006f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.mae, 0.06, epsilon = 1e-12);
        assert!(metrics.r2 > 0.99);
        assert_eq!(metrics.n_samples, 5);
    }

    #[test]
    fn test_constant_target_r2_is_finite() {
        let y_true = array![3.0, 3.0];
        let perfect = RegressionMetrics::compute(&y_true, &array![3.0, 3.0]).unwrap();
        assert_eq!(perfect.r2, 1.0);

        let off = RegressionMetrics::compute(&y_true, &array![2.0, 4.0]).unwrap();
        assert_eq!(off.r2, 0.0);
        assert_eq!(off.mse, 1.0);
    }

    #[test]
    fn test_metrics_reject_bad_input() {
        assert!(RegressionMetrics::compute(&array![1.0], &array![1.0, 2.0]).is_err());
        assert!(RegressionMetrics::compute(&array![1.0], &array![f64::NAN]).is_err());
    }

    #[test]
    fn test_check_training_data() {
        let x = array![[1.0], [2.0]];
        assert!(check_training_data(&x, &array![1.0, 2.0]).is_ok());
        assert!(matches!(
            check_training_data(&x, &array![1.0]),
            Err(AutoMlError::ShapeError { .. })
        ));
        assert!(matches!(
            check_training_data(&array![[f64::INFINITY], [2.0]], &array![1.0, 2.0]),
            Err(AutoMlError::ComputationError(_))
        ));
    }
}
