//! Linear model implementations

use super::ProbabilisticClassifier;
use crate::data::Table;
use crate::error::{Result, RobustError};
use crate::utils::solve_least_squares;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

fn check_lengths(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(RobustError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    Ok(())
}

/// Ordinary least squares regression.
///
/// Serves as the plain baseline the symbolic solver must reproduce when no
/// uncertainty is injected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
        }
    }

    /// Fit by solving the normal equations on centered data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_lengths(x, y)?;
        if x.nrows() == 0 {
            return Err(RobustError::DataError("cannot fit on zero rows".to_string()));
        }

        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| RobustError::DataError("empty matrix".to_string()))?;
        let y_mean = y.mean().unwrap_or(0.0);

        let coefficients = solve_least_squares(&(x - &x_mean), &(y - y_mean)).ok_or_else(|| {
            RobustError::ComputationError("Matrix is singular, cannot solve least squares".to_string())
        })?;

        self.intercept = Some(y_mean - coefficients.dot(&x_mean));
        self.coefficients = Some(coefficients);
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(RobustError::ModelNotFitted)?;
        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }
}

/// Logistic regression for binary classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
    /// Regularization strength (L2)
    pub alpha: f64,
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    pub learning_rate: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            alpha: 0.01,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    /// Fit with batch gradient descent
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_lengths(x, y)?;
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(RobustError::DataError("cannot fit on zero rows".to_string()));
        }

        let mut weights = Array1::zeros(x.ncols());
        let mut bias = 0.0;

        for _ in 0..self.max_iter {
            let predictions = Self::sigmoid(&(x.dot(&weights) + bias));

            let errors = &predictions - y;
            let dw = (x.t().dot(&errors) / n_samples as f64) + (self.alpha * &weights);
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - self.learning_rate * dw;
            bias -= self.learning_rate * db;
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        Ok(self)
    }

    /// Class-1 probabilities
    pub fn predict_proba_matrix(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(RobustError::ModelNotFitted)?;
        if coefficients.len() != x.ncols() {
            return Err(RobustError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        let linear = x.dot(coefficients) + self.intercept.unwrap_or(0.0);
        Ok(Self::sigmoid(&linear))
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, x: &Table) -> Result<Array1<f64>> {
        self.predict_proba_matrix(&x.to_matrix()?)
    }
}
