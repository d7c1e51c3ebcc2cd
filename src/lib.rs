//! Kolosal Robust - robustness certification and fairness sensitivity search
//!
//! This crate provides two engines over tabular training data:
//! - Certification of closed-form linear regression under bounded label
//!   uncertainty, propagated symbolically with affine arithmetic
//! - A pattern search ranking training rows by how much imputing them moves
//!   a group fairness metric
//!
//! # Modules
//!
//! ## Engines
//! - [`robustness`] - Uncertainty injection, symbolic solve, robust fraction
//! - [`patterns`] - Pattern enumeration and sensitivity ranking
//! - [`fairness`] - SPD, TPR parity and predictive parity
//!
//! ## Foundations
//! - [`affine`] - Affine forms, symbols and symbolic matrix products
//! - [`data`] - Tables with stable row ids, splits, CSV loading
//! - [`preprocessing`] - Standardization and design matrices
//! - [`training`] - OLS baseline and the probabilistic classifier seam
//! - [`utils`] - Dense linear algebra helpers
//!
//! ## Interfaces
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Foundations
pub mod affine;
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod utils;

// Engines
pub mod fairness;
pub mod patterns;
pub mod robustness;

// Interfaces
pub mod cli;

pub use error::{Result, RobustError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, RobustError};

    // Affine arithmetic
    pub use crate::affine::{AffineForm, Symbol, SymbolFactory};

    // Data
    pub use crate::data::{Column, ColumnValue, CsvDataSource, DataSource, Dataset, Table};

    // Preprocessing
    pub use crate::preprocessing::{design_matrix, StandardScaler};

    // Training
    pub use crate::training::{LinearRegression, LogisticRegression, ProbabilisticClassifier};

    // Robustness
    pub use crate::robustness::{
        compute_robustness_ratio, compute_robustness_ratio_ranked, RadiusSpec, RobustnessCertifier,
        RobustnessConfig, RobustnessReport, UncertainTarget,
    };

    // Fairness
    pub use crate::fairness::FairnessMetric;

    // Patterns
    pub use crate::patterns::{
        enumerate_patterns, find_important_patterns, Pattern, PatternSensitivityScanner,
        SensitivityConfig, SensitivityRanking,
    };
}
