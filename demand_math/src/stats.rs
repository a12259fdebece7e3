//! Small statistics helpers

use crate::{MathError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Round to a fixed number of decimal places
///
/// Non-finite values pass through unchanged.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Root of the mean of squared values, `None` for an empty slice
pub fn root_mean_square(values: &[f64]) -> Option<f64> {
    let squares: Vec<f64> = values.iter().map(|v| v * v).collect();
    mean(&squares).map(f64::sqrt)
}

/// Two-sided standard normal quantile for a central interval width
///
/// An interval width of 0.8 gives the 90th percentile, about 1.2816.
pub fn central_interval_z(width: f64) -> Result<f64> {
    if width <= 0.0 || width >= 1.0 {
        return Err(MathError::InvalidInput(format!(
            "Interval width must be between 0 and 1, got {}",
            width
        )));
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| MathError::CalculationError(format!("Standard normal: {}", e)))?;
    Ok(normal.inverse_cdf(0.5 + width / 2.0))
}
