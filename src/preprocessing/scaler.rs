//! Standard scaling over dense matrices

use crate::error::{Result, RobustError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Z-score scaler: `(x - mean) / std`, with the population standard deviation.
///
/// The fitted parameters must be reused for every later transform so the
/// training and test design matrices live in the same coordinates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }

    pub fn scale(&self) -> Option<&Array1<f64>> {
        self.scale.as_ref()
    }

    /// Fit column means and standard deviations
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(RobustError::DataError(
                "cannot fit a scaler on zero rows".to_string(),
            ));
        }
        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| RobustError::DataError("empty matrix".to_string()))?;
        // Constant columns keep their spread (zero) and are scaled by one
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 { 1.0 } else { s });

        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(self)
    }

    fn params(&self, n_cols: usize) -> Result<(&Array1<f64>, &Array1<f64>)> {
        let (mean, scale) = match (&self.mean, &self.scale) {
            (Some(m), Some(s)) => (m, s),
            _ => return Err(RobustError::ModelNotFitted),
        };
        if mean.len() != n_cols {
            return Err(RobustError::ShapeError {
                expected: format!("{} columns", mean.len()),
                actual: format!("{} columns", n_cols),
            });
        }
        Ok((mean, scale))
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (mean, scale) = self.params(x.ncols())?;
        Ok((x - mean) / scale)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (mean, scale) = self.params(x.ncols())?;
        Ok(x * scale + mean)
    }
}
