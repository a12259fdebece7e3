//! Metrics for evaluating forecast performance

use crate::data::ProductSeries;
use crate::error::{ForecastError, Result};
use crate::models::ForecastSeries;
use demand_math::stats::{mean, root_mean_square, round_to};
use serde::{Deserialize, Serialize};

/// Point-forecast accuracy, every field rounded to two decimals
///
/// `mape` and `accuracy` are NaN (serialised as `null`) when every actual
/// value is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Mean Absolute Error
    #[serde(rename = "MAE")]
    pub mae: f64,
    /// Root Mean Squared Error
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    /// Mean Absolute Percentage Error
    #[serde(rename = "MAPE")]
    pub mape: f64,
    /// `100 - MAPE`; negative when MAPE exceeds 100
    #[serde(rename = "ACCURACY")]
    pub accuracy: f64,
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MAE:{}", self.mae)?;
        writeln!(f, "RMSE:{}", self.rmse)?;
        writeln!(f, "MAPE:{}", self.mape)?;
        write!(f, "ACCURACY:{}", self.accuracy)
    }
}

/// Evaluate a forecast against held-out actuals
///
/// Points are matched by date; dates missing from either side are dropped.
pub fn evaluate_forecast(actual: &ProductSeries, forecast: &ForecastSeries) -> Result<Metrics> {
    let (observed, predicted): (Vec<f64>, Vec<f64>) = actual
        .points()
        .iter()
        .filter_map(|point| forecast.get(point.ds).map(|f| (point.y, f.yhat)))
        .unzip();

    if observed.is_empty() {
        return Err(ForecastError::NoOverlap);
    }

    accuracy_metrics(&observed, &predicted)
}

/// Accuracy metrics for already aligned values
///
/// Rows with a zero actual are left out of MAPE only.
pub fn accuracy_metrics(actual: &[f64], predicted: &[f64]) -> Result<Metrics> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "Actual and predicted values must have the same non-zero length".to_string(),
        ));
    }

    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| a - p)
        .collect();

    let absolute: Vec<f64> = errors.iter().map(|e| e.abs()).collect();
    let mae = mean(&absolute).unwrap_or(f64::NAN);
    let rmse = root_mean_square(&errors).unwrap_or(f64::NAN);

    let percentages: Vec<f64> = actual
        .iter()
        .zip(&absolute)
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, e)| e / a.abs())
        .collect();
    let mape = mean(&percentages).map_or(f64::NAN, |m| m * 100.0);

    Ok(Metrics {
        mae: round_to(mae, 2),
        rmse: round_to(rmse, 2),
        mape: round_to(mape, 2),
        accuracy: round_to(100.0 - mape, 2),
    })
}
