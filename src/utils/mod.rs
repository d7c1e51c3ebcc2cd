//! Utility modules

pub mod linalg;

pub use linalg::{cholesky_solve, matrix_inverse, solve_least_squares};
