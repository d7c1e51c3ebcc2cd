//! Error types for robustness certification and pattern sensitivity search

use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, RobustError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum RobustError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    /// Uncertainty symbols survived where the algebra requires them to cancel,
    /// or an affine form lost its single-constant structure.
    #[error("Algebraic consistency violation: {0}")]
    AlgebraicConsistency(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Fairness error: {0}")]
    FairnessError(String),
}

impl RobustError {
    /// Shorthand for an [`RobustError::InvalidParameter`]
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        RobustError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for RobustError {
    fn from(err: polars::error::PolarsError) -> Self {
        RobustError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for RobustError {
    fn from(err: serde_json::Error) -> Self {
        RobustError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for RobustError {
    fn from(err: ndarray::ShapeError) -> Self {
        RobustError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
