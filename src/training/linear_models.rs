//! Linear model implementations

use crate::error::{AutoMlError, Result};
use super::models::{check_training_data, RegressionMetrics, Regressor};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

const MAX_JACOBI_SWEEPS: usize = 100;

/// Relative cutoff below which an eigenvalue of X^T X is treated as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// Eigendecomposition of a symmetric matrix by cyclic Jacobi rotations.
/// Returns eigenvalues and the matrix whose columns are the eigenvectors.
fn symmetric_eigen(a: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut a = a.clone();
    let mut v = Array2::<f64>::eye(n);

    let total: f64 = a.iter().map(|x| x * x).sum();

    for _ in 0..MAX_JACOBI_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[[p, q]] * a[[p, q]];
            }
        }
        if off <= f64::EPSILON * f64::EPSILON * total {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }

                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}

/// Minimum-norm solution of the symmetric system `A w = b` via the
/// pseudo-inverse of `A`. Returns the solution and the numerical rank.
fn pseudo_inverse_solve(a: &Array2<f64>, b: &Array1<f64>) -> (Array1<f64>, usize) {
    let (eigenvalues, eigenvectors) = symmetric_eigen(a);

    let max_eig = eigenvalues.iter().fold(0.0f64, |m, &e| m.max(e.abs()));
    let cutoff = max_eig * RANK_TOLERANCE;

    // w = V diag(1/λ) V^T b over the non-negligible eigenvalues
    let projected = eigenvectors.t().dot(b);
    let mut scaled = Array1::zeros(projected.len());
    let mut rank = 0;
    for (i, &lambda) in eigenvalues.iter().enumerate() {
        if lambda.abs() > cutoff && lambda.abs() > 0.0 {
            scaled[i] = projected[i] / lambda;
            rank += 1;
        }
    }

    (eigenvectors.dot(&scaled), rank)
}

/// Ordinary least squares linear regression.
///
/// Rank-deficient designs (collinear indicator blocks, fewer rows than
/// features) are solved for the minimum-norm coefficient vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    /// Whether to fit intercept
    pub fit_intercept: bool,
    /// Regularization strength (L2)
    pub alpha: f64,
    /// Whether model is fitted
    pub is_fitted: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
            alpha: 0.0,
            is_fitted: false,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Set regularization strength (Ridge regression)
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_training_data(x, y)?;
        let n_features = x.ncols();

        // Center data if fitting intercept
        let (x_work, y_work, means) = if self.fit_intercept {
            let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_features));
            let y_mean = y.mean().unwrap_or(0.0);

            let x_centered = x - &x_mean.view().insert_axis(Axis(0));
            let y_centered = y - y_mean;

            (x_centered, y_centered, Some((x_mean, y_mean)))
        } else {
            (x.clone(), y.clone(), None)
        };

        // Normal equations: (X^T X + alpha*I) w = X^T y
        let mut xtx = x_work.t().dot(&x_work);
        if self.alpha > 0.0 {
            for i in 0..n_features {
                xtx[[i, i]] += self.alpha;
            }
        }
        let xty = x_work.t().dot(&y_work);

        let (coefficients, rank) = pseudo_inverse_solve(&xtx, &xty);
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(AutoMlError::ComputationError(
                "least squares solution is not finite".to_string(),
            ));
        }
        debug!(n_features, rank, "Linear regression solved");

        let intercept = match means {
            Some((x_mean, y_mean)) => y_mean - coefficients.dot(&x_mean),
            None => 0.0,
        };

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        self.is_fitted = true;

        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (coefficients, intercept) = match (&self.coefficients, self.intercept) {
            (Some(c), Some(i)) if self.is_fitted => (c, i),
            _ => return Err(AutoMlError::UnfittedState),
        };

        if x.ncols() != coefficients.len() {
            return Err(AutoMlError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.dot(coefficients) + intercept)
    }

    /// Compute R² score
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        Ok(RegressionMetrics::compute(y, &predictions)?.r2)
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LinearRegression::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LinearRegression::predict(self, x)
    }

    fn name(&self) -> &str {
        "Linear Regression"
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        let coefficients = self.coefficients.as_ref()?;
        let total: f64 = coefficients.iter().map(|c| c.abs()).sum();
        if total > 0.0 {
            Some(coefficients.mapv(|c| c.abs() / total))
        } else {
            None
        }
    }
}
