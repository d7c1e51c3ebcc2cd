//! Affine arithmetic over unit-interval uncertainty symbols
//!
//! Provides the algebra the robustness engine propagates uncertainty with:
//! - [`Symbol`] / [`SymbolFactory`] - named unknowns in `[-1, 1]`
//! - [`AffineForm`] - `center + Σ weight_i * symbol_i`
//! - matrix helpers for the normal equations (`XᵗX`, `Xᵗy`)

mod form;
mod matrix;
mod symbol;

pub use form::AffineForm;
pub use matrix::{
    concrete_mul_vec, free_symbols, gram, lift_matrix, lift_vector, to_concrete,
    transpose_mul_vec,
};
pub use symbol::{Symbol, SymbolFactory};

use std::collections::BTreeSet;

/// Symbols injected by one call
pub type SymbolSet = BTreeSet<Symbol>;
