//! Pipeline configuration
//!
//! Every field has a default matching the production settings, so an empty
//! TOML document is a valid configuration:
//!
//! ```toml
//! [model]
//! seasonality_mode = "multiplicative"
//! changepoint_prior_scale = 0.3
//!
//! [evaluation]
//! min_history_days = 30
//! max_test_days = 30
//! max_forecast_days = 3650
//!
//! [recommendation]
//! excess_tolerance = 30
//!
//! [plot]
//! width = 1000
//! height = 500
//! ```

use crate::error::{ForecastError, Result};
use crate::recommendation::DEFAULT_EXCESS_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming a TOML config file
pub const CONFIG_ENV_VAR: &str = "STOCKWISE_CONFIG";

/// How seasonal and holiday effects combine with the trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    /// `y = trend + effects`
    Additive,
    /// `y = trend * (1 + effects)`
    Multiplicative,
}

/// Whether a seasonal component is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityToggle {
    /// Fit when the history is long enough to show the cycle twice
    Auto,
    Enabled,
    Disabled,
}

impl SeasonalityToggle {
    /// Resolve the toggle for a history spanning `span_days`
    pub fn resolve(self, span_days: f64, period_days: f64) -> bool {
        match self {
            SeasonalityToggle::Auto => span_days >= 2.0 * period_days,
            SeasonalityToggle::Enabled => true,
            SeasonalityToggle::Disabled => false,
        }
    }
}

/// Forecasting model hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub seasonality_mode: SeasonalityMode,
    /// How readily the trend may bend at changepoints
    pub changepoint_prior_scale: f64,
    pub n_changepoints: usize,
    /// Share of the history in which changepoints may be placed
    pub changepoint_range: f64,
    pub seasonality_prior_scale: f64,
    pub holidays_prior_scale: f64,
    /// Coverage of the `[yhat_lower, yhat_upper]` band
    pub interval_width: f64,
    pub weekly_seasonality: SeasonalityToggle,
    pub weekly_fourier_order: usize,
    pub yearly_seasonality: SeasonalityToggle,
    pub yearly_fourier_order: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seasonality_mode: SeasonalityMode::Multiplicative,
            changepoint_prior_scale: 0.3,
            n_changepoints: 25,
            changepoint_range: 0.8,
            seasonality_prior_scale: 10.0,
            holidays_prior_scale: 10.0,
            interval_width: 0.8,
            weekly_seasonality: SeasonalityToggle::Auto,
            weekly_fourier_order: 3,
            yearly_seasonality: SeasonalityToggle::Auto,
            yearly_fourier_order: 10,
        }
    }
}

impl ModelConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("changepoint_prior_scale", self.changepoint_prior_scale),
            ("seasonality_prior_scale", self.seasonality_prior_scale),
            ("holidays_prior_scale", self.holidays_prior_scale),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ForecastError::ConfigError(format!(
                    "model.{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::ConfigError(format!(
                "model.changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }

        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::ConfigError(format!(
                "model.interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }

        if self.weekly_fourier_order == 0 || self.yearly_fourier_order == 0 {
            return Err(ForecastError::ConfigError(
                "model Fourier orders must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Train/test split settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Daily observations required before forecasting
    pub min_history_days: usize,
    /// Upper bound on the held-out tail
    pub max_test_days: usize,
    /// Longest forecast horizon a request may ask for
    pub max_forecast_days: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            min_history_days: 30,
            max_test_days: 30,
            max_forecast_days: 3650,
        }
    }
}

/// Restock policy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Surplus units tolerated before stock counts as excess
    pub excess_tolerance: i64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            excess_tolerance: DEFAULT_EXCESS_TOLERANCE,
        }
    }
}

/// Chart image settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub model: ModelConfig,
    pub evaluation: EvaluationConfig,
    pub recommendation: RecommendationConfig,
    pub plot: PlotConfig,
}

impl PipelineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig =
            toml::from_str(text).map_err(|e| ForecastError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            ForecastError::ConfigError(format!(
                "Cannot read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from an explicit path, else from `STOCKWISE_CONFIG`, else defaults
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let from_env = env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;

        if self.evaluation.min_history_days == 0
            || self.evaluation.max_test_days == 0
            || self.evaluation.max_forecast_days == 0
        {
            return Err(ForecastError::ConfigError(
                "evaluation day counts must be at least 1".to_string(),
            ));
        }

        if self.recommendation.excess_tolerance < 0 {
            return Err(ForecastError::ConfigError(format!(
                "recommendation.excess_tolerance must be non-negative, got {}",
                self.recommendation.excess_tolerance
            )));
        }

        if self.plot.width == 0 || self.plot.height == 0 {
            return Err(ForecastError::ConfigError(
                "plot width and height must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
