//! Error types for the climate_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the climate_forecast crate
#[derive(Debug, Error)]
pub enum ClimateError {
    /// Upstream fetch, merge or coercion failure; fatal for that retrain attempt
    #[error("Data acquisition error: {0}")]
    DataAcquisition(String),

    /// Error in derived series data or its invariants
    #[error("Data error: {0}")]
    Data(String),

    /// Error during model training
    #[error("Training error: {0}")]
    Training(String),

    /// No model snapshot has been published yet; retryable
    #[error("Model not ready")]
    NotReady,

    /// Malformed or out-of-range forecast request
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unexpected failure during recursive prediction
    #[error("Forecast error: {0}")]
    Forecast(String),

    /// Error from numeric building blocks
    #[error("Math error: {0}")]
    Math(#[from] climate_math::MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ClimateError>;

impl From<PolarsError> for ClimateError {
    fn from(err: PolarsError) -> Self {
        ClimateError::Data(err.to_string())
    }
}

impl From<reqwest::Error> for ClimateError {
    fn from(err: reqwest::Error) -> Self {
        ClimateError::DataAcquisition(err.to_string())
    }
}
