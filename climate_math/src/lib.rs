//! # Climate Math
//!
//! Numeric building blocks for climate time series forecasting: min-max
//! scaling and forecast accuracy metrics.

use thiserror::Error;

pub mod metrics;
pub mod scaling;

/// Errors that can occur in series-related calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for climate math operations
pub type Result<T> = std::result::Result<T, MathError>;
