//! Data preprocessing for the closed-form solver
//!
//! - [`StandardScaler`] - z-score scaling with retained parameters
//! - [`design_matrix`] - intercept column prepended to a feature matrix

mod scaler;

pub use scaler::StandardScaler;

use ndarray::Array2;

/// Prepend a column of ones to `features`
pub fn design_matrix(features: &Array2<f64>) -> Array2<f64> {
    Array2::from_shape_fn((features.nrows(), features.ncols() + 1), |(i, j)| {
        if j == 0 {
            1.0
        } else {
            features[[i, j - 1]]
        }
    })
}
