//! Prediction bounds and robustness classification on test data

use crate::affine::{concrete_mul_vec, AffineForm};
use crate::error::{Result, RobustError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Worst-case range of one test prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionBound {
    pub center: f64,
    /// Sum of absolute symbol weights in the prediction
    pub radius: f64,
    /// `radius <= robustness_radius`
    pub robust: bool,
}

/// Apply the parameter vector to a plain test design matrix
pub fn predict_affine(test_design: &Array2<f64>, params: &Array1<AffineForm>) -> Result<Array1<AffineForm>> {
    concrete_mul_vec(test_design, params)
}

pub fn classify(predictions: &Array1<AffineForm>, robustness_radius: f64) -> Vec<PredictionBound> {
    predictions
        .iter()
        .map(|p| {
            let radius = p.radius();
            PredictionBound {
                center: p.center(),
                radius,
                robust: radius <= robustness_radius,
            }
        })
        .collect()
}

/// Fraction of robust predictions, in `[0, 1]`
pub fn robust_fraction(bounds: &[PredictionBound]) -> Result<f64> {
    if bounds.is_empty() {
        return Err(RobustError::DataError(
            "robust fraction is undefined for an empty test set".to_string(),
        ));
    }
    let robust = bounds.iter().filter(|b| b.robust).count();
    Ok(robust as f64 / bounds.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::SymbolFactory;
    use ndarray::array;

    #[test]
    fn test_radius_sums_absolute_weights_after_combination() {
        let mut f = SymbolFactory::new();
        let e0 = f.create();
        let params = Array1::from(vec![
            AffineForm::with_symbol(1.0, e0.clone(), 0.5),
            AffineForm::with_symbol(2.0, e0, 0.5),
        ]);
        // Second row cancels the shared symbol: 0.5 - 0.5
        let test = array![[1.0, 2.0], [1.0, -1.0]];
        let preds = predict_affine(&test, &params).unwrap();
        let bounds = classify(&preds, 0.1);

        assert_eq!(bounds[0].center, 5.0);
        assert!((bounds[0].radius - 1.5).abs() < 1e-12);
        assert!(!bounds[0].robust);
        assert_eq!(bounds[1].radius, 0.0);
        assert!(bounds[1].robust);
        assert_eq!(robust_fraction(&bounds).unwrap(), 0.5);
    }

    #[test]
    fn test_boundary_radius_counts_as_robust() {
        let mut f = SymbolFactory::new();
        let preds = Array1::from(vec![AffineForm::with_symbol(0.0, f.create(), 1.0)]);
        assert!(classify(&preds, 1.0)[0].robust);
    }

    #[test]
    fn test_empty_test_set() {
        assert!(robust_fraction(&[]).is_err());
    }
}
