//! Forecasting models for daily demand series
//!
//! The pipeline only talks to the [`ForecastModel`] / [`FittedModel`] pair,
//! so the concrete algorithm can be swapped without touching it.

use crate::data::ProductSeries;
use crate::error::Result;
use crate::holidays::HolidaySet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// One forecast day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Forecast date
    pub ds: NaiveDate,
    /// Point forecast
    pub yhat: f64,
    /// Lower bound of the uncertainty interval
    pub yhat_lower: f64,
    /// Upper bound of the uncertainty interval
    pub yhat_upper: f64,
}

/// Forecast points ordered by date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastSeries {
    points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    /// Create a forecast series from ordered points
    pub fn new(points: Vec<ForecastPoint>) -> Self {
        Self { points }
    }

    /// All points
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// The last `n` points
    pub fn tail(&self, n: usize) -> ForecastSeries {
        let start = self.points.len().saturating_sub(n);
        ForecastSeries::new(self.points[start..].to_vec())
    }

    /// Points dated strictly after `date`
    pub fn after(&self, date: NaiveDate) -> ForecastSeries {
        ForecastSeries::new(
            self.points
                .iter()
                .filter(|p| p.ds > date)
                .copied()
                .collect(),
        )
    }

    /// Point for a given date, if forecast
    pub fn get(&self, date: NaiveDate) -> Option<&ForecastPoint> {
        self.points
            .binary_search_by_key(&date, |p| p.ds)
            .ok()
            .map(|i| &self.points[i])
    }

    /// Sum of point forecasts
    pub fn total_demand(&self) -> f64 {
        self.points.iter().map(|p| p.yhat).sum()
    }

    /// Get the number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the forecast is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Fitted model ready to forecast
pub trait FittedModel: Debug {
    /// Forecast every history date plus `horizon_days` future days
    fn predict(&self, horizon_days: usize) -> Result<ForecastSeries>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be fitted on a demand history
pub trait ForecastModel: Debug {
    /// The type of fitted model produced
    type Fitted: FittedModel;

    /// Fit a fresh model on the history
    fn fit(&self, history: &ProductSeries, holidays: Option<&HolidaySet>) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod decomposable;

pub use decomposable::{DecomposableModel, FittedDecomposableModel};
