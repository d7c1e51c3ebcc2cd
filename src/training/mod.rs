//! Models used alongside the certification engines
//!
//! - [`LinearRegression`] - plain OLS baseline for the closed-form solver
//! - [`LogisticRegression`] - a concrete [`ProbabilisticClassifier`]

pub mod linear_models;

pub use linear_models::{LinearRegression, LogisticRegression};

use crate::data::Table;
use crate::error::Result;
use ndarray::Array1;

/// A fitted binary classifier exposing class-1 probabilities
pub trait ProbabilisticClassifier: Send + Sync {
    /// Probability of the positive class for each row of `x`
    fn predict_proba(&self, x: &Table) -> Result<Array1<f64>>;
}

impl<C: ProbabilisticClassifier + ?Sized> ProbabilisticClassifier for &C {
    fn predict_proba(&self, x: &Table) -> Result<Array1<f64>> {
        (**self).predict_proba(x)
    }
}
