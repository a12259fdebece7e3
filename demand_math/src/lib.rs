//! # Demand Math
//!
//! Numerical building blocks shared by the demand forecasting models.
//! This crate provides the regression solver, seasonal and trend basis
//! functions, and the small statistics helpers the evaluator relies on.

use thiserror::Error;

pub mod fourier;
pub mod regression;
pub mod stats;
pub mod trend;

pub use regression::RidgeRegression;

/// Errors that can occur in forecasting math
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;
