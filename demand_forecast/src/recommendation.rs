//! Restock advice from forecast demand

use crate::models::ForecastSeries;
use serde::{Serialize, Serializer};
use std::fmt;

/// Surplus units tolerated before stock counts as excess
pub const DEFAULT_EXCESS_TOLERANCE: i64 = 30;

/// What to do with current stock given forecast demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    /// Forecast demand exceeds stock by `units`
    Reorder { units: u64 },
    /// Stock exceeds forecast demand by more than the tolerance
    Excess { units: u64 },
    Balanced,
}

impl Recommendation {
    /// `reorder`, `excess` or `balanced`
    pub fn status(&self) -> &'static str {
        match self {
            Recommendation::Reorder { .. } => "reorder",
            Recommendation::Excess { .. } => "excess",
            Recommendation::Balanced => "balanced",
        }
    }

    pub fn units(&self) -> u64 {
        match self {
            Recommendation::Reorder { units } | Recommendation::Excess { units } => *units,
            Recommendation::Balanced => 0,
        }
    }

    /// Advice shown to the analyst
    pub fn message(&self) -> String {
        match self {
            Recommendation::Reorder { units } => format!("You need to reorder {} units.", units),
            Recommendation::Excess { units } => format!("You have {} excess units.", units),
            Recommendation::Balanced => "Stock level is sufficient.".to_string(),
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

#[derive(Serialize)]
struct RecommendationView {
    status: &'static str,
    units: u64,
    message: String,
}

impl Serialize for Recommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RecommendationView {
            status: self.status(),
            units: self.units(),
            message: self.message(),
        }
        .serialize(serializer)
    }
}

/// Classify stock against the summed point forecast
///
/// `diff = round(demand - stock)`. A positive diff is a reorder; a diff
/// below `-excess_tolerance` is excess; anything in between is balanced.
pub fn recommend_stock_action(
    forecast_tail: &ForecastSeries,
    current_stock: u64,
    excess_tolerance: i64,
) -> Recommendation {
    let diff = (forecast_tail.total_demand() - current_stock as f64).round() as i64;

    if diff > 0 {
        Recommendation::Reorder {
            units: diff.unsigned_abs(),
        }
    } else if diff < -excess_tolerance {
        Recommendation::Excess {
            units: diff.unsigned_abs(),
        }
    } else {
        Recommendation::Balanced
    }
}
