//! Closed-form least squares over affine forms, and interval tightening

use crate::affine::{
    concrete_mul_vec, free_symbols, gram, to_concrete, transpose_mul_vec, AffineForm, SymbolFactory,
};
use crate::error::{Result, RobustError};
use crate::utils::matrix_inverse;
use ndarray::{Array1, Array2};
use tracing::debug;

/// `(XᵗX)⁻¹ Xᵗy` with uncertainty carried through `Xᵗy`.
///
/// `XᵗX` must come out free of symbols: the inverse is only taken over plain
/// numbers. Uncertainty left in the design matrix after the product is a
/// caller error and aborts the solve.
pub fn solve_closed_form(design: &Array2<AffineForm>, labels: &Array1<AffineForm>) -> Result<Array1<AffineForm>> {
    let xtx = gram(design)?;
    let remaining = free_symbols(xtx.iter());
    if !remaining.is_empty() {
        return Err(RobustError::AlgebraicConsistency(format!(
            "{} symbols remain in XᵗX after the product; design-matrix uncertainty must cancel",
            remaining.len()
        )));
    }
    let xtx = to_concrete(&xtx)?;
    if xtx.iter().any(|v| !v.is_finite()) {
        return Err(RobustError::ComputationError(
            "XᵗX holds non-finite entries; the design matrix carries NaN or infinity".to_string(),
        ));
    }

    let inv = matrix_inverse(&xtx).ok_or_else(|| {
        RobustError::ComputationError("XᵗX is singular, cannot solve normal equations".to_string())
    })?;
    let xty = transpose_mul_vec(design, labels)?;
    let params = concrete_mul_vec(&inv, &xty)?;
    if let Some(i) = params
        .iter()
        .position(|p| !p.center().is_finite() || p.terms().any(|(_, w)| !w.is_finite()))
    {
        return Err(RobustError::ComputationError(format!(
            "parameter {} is not finite after the solve",
            i
        )));
    }

    debug!(
        n_params = params.len(),
        n_symbols = free_symbols(params.iter()).len(),
        "Solved closed-form parameters"
    );
    Ok(params)
}

/// Collapse every uncertain parameter to `constant + radius * fresh_symbol`.
///
/// Fresh symbols come from `factory`, continuing the injection numbering.
/// The result over-approximates the input: correlations between the
/// original symbols are dropped.
pub fn tighten_intervals(params: &Array1<AffineForm>, factory: &mut SymbolFactory) -> Result<Array1<AffineForm>> {
    let tightened = params
        .iter()
        .map(|p| {
            if p.is_constant() {
                Ok(p.clone())
            } else {
                p.collapse(factory.create())
            }
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(symbols_issued = factory.issued(), "Collapsed parameters to intervals");
    Ok(Array1::from(tightened))
}
