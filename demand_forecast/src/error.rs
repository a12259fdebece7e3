//! Error types for the demand_forecast crate

use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Requested product is not in the catalog
    #[error("Unknown product '{name}'. Valid options are: {valid:?}")]
    UnknownProduct { name: String, valid: Vec<&'static str> },

    /// Fewer daily observations than the pipeline needs
    #[error("Not enough historical data. Minimum {required} days required, found {actual}.")]
    InsufficientHistory { required: usize, actual: usize },

    /// Evaluation join between held-out actuals and forecast is empty
    #[error("No overlapping dates between test data and forecast. Check date alignment.")]
    NoOverlap,

    /// The forecasting model could not be fitted
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error while drawing or encoding a chart
    #[error("Render error: {0}")]
    RenderError(String),

    /// Error in the pipeline configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from the numerical routines
    #[error("Math error: {0}")]
    MathError(#[from] demand_math::MathError),

    /// Anything else that stops the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl ForecastError {
    /// Stable tag for branching on the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::UnknownProduct { .. } => "unknown_product",
            ForecastError::InsufficientHistory { .. } => "insufficient_history",
            ForecastError::NoOverlap => "no_overlap",
            ForecastError::ModelFit(_) => "model_fit",
            ForecastError::DataError(_) => "data",
            ForecastError::InvalidParameter(_) => "invalid_parameter",
            ForecastError::RenderError(_) => "render",
            ForecastError::ConfigError(_) => "config",
            ForecastError::IoError(_) => "io",
            ForecastError::CsvError(_) => "csv",
            ForecastError::MathError(_) => "math",
            ForecastError::Pipeline(_) => "pipeline",
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
