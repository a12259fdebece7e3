//! Decomposable trend + seasonality + holiday model
//!
//! `y(t) = trend(t) + effects(t)` (additive) or `y(t) = trend(t) * (1 + effects(t))`
//! (multiplicative), where the trend is piecewise linear with changepoints,
//! seasonality is a Fourier series and each holiday offset has its own
//! effect. Coefficients are estimated by ridge regression whose penalties
//! play the role of Gaussian priors; trend and effects are re-estimated in
//! alternating passes.
//!
//! Fitting and prediction are deterministic.

use crate::config::{ModelConfig, SeasonalityMode};
use crate::data::ProductSeries;
use crate::error::{ForecastError, Result};
use crate::holidays::HolidaySet;
use crate::models::{FittedModel, ForecastModel, ForecastPoint, ForecastSeries};
use chrono::{Days, NaiveDate};
use demand_math::fourier::fourier_terms;
use demand_math::regression::{dot, RidgeRegression};
use demand_math::stats::{central_interval_z, mean, root_mean_square};
use demand_math::trend::{changepoint_locations, piecewise_linear, trend_row};
use tracing::debug;

/// Assumed observation noise on the scaled target, used to turn prior scales into penalties
const PRIOR_NOISE_SCALE: f64 = 0.05;
/// Prior scale on the base trend offset and rate
const TREND_BASE_PRIOR_SCALE: f64 = 5.0;
/// Alternating trend / effects estimation passes
const FIT_PASSES: usize = 5;
/// Smallest magnitude a divisor may take in multiplicative mode
const MIN_DIVISOR: f64 = 1e-8;

const WEEKLY_PERIOD: f64 = 7.0;
const YEARLY_PERIOD: f64 = 365.25;

/// A Fourier seasonal component
#[derive(Debug, Clone, Copy, PartialEq)]
struct Seasonality {
    period: f64,
    order: usize,
}

/// Decomposable forecasting model
#[derive(Debug, Clone)]
pub struct DecomposableModel {
    /// Name of the model
    name: String,
    /// Hyperparameters
    config: ModelConfig,
}

/// Fitted decomposable model
#[derive(Debug, Clone)]
pub struct FittedDecomposableModel {
    /// Name of the model
    name: String,
    mode: SeasonalityMode,
    /// History dates the model was fitted on
    history_dates: Vec<NaiveDate>,
    /// First history date, the time origin
    start: NaiveDate,
    /// Days between first and last history date
    span_days: f64,
    /// Divisor applied to observations before fitting
    y_scale: f64,
    /// Changepoint locations on the scaled time axis
    changepoints: Vec<f64>,
    trend_coefficients: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    holidays: Option<HolidaySet>,
    holiday_offsets: Vec<i64>,
    effect_coefficients: Vec<f64>,
    /// Residual standard deviation on the scaled target
    sigma: f64,
    /// Mean absolute rate change at changepoints
    mean_abs_delta: f64,
    /// Normal quantile for the configured interval width
    z: f64,
}

impl DecomposableModel {
    /// Create a new model with the given hyperparameters
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;

        let mode = match config.seasonality_mode {
            SeasonalityMode::Additive => "additive",
            SeasonalityMode::Multiplicative => "multiplicative",
        };

        Ok(Self {
            name: format!(
                "Decomposable ({}, changepoint_prior_scale={})",
                mode, config.changepoint_prior_scale
            ),
            config,
        })
    }

    /// Hyperparameters in use
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl ForecastModel for DecomposableModel {
    type Fitted = FittedDecomposableModel;

    fn fit(&self, history: &ProductSeries, holidays: Option<&HolidaySet>) -> Result<Self::Fitted> {
        let n = history.len();
        if n < 2 {
            return Err(ForecastError::ModelFit(format!(
                "At least 2 observations are required, got {}",
                n
            )));
        }

        let values = history.values();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFit(
                "History contains non-finite values".to_string(),
            ));
        }

        let dates = history.dates();
        let start = dates[0];
        let span_days = (dates[n - 1] - start).num_days() as f64;

        let y_scale = match values.iter().fold(0.0f64, |acc, v| acc.max(v.abs())) {
            max if max > 0.0 => max,
            _ => 1.0,
        };
        let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let t: Vec<f64> = dates
            .iter()
            .map(|d| (*d - start).num_days() as f64 / span_days)
            .collect();
        let changepoints =
            changepoint_locations(&t, self.config.n_changepoints, self.config.changepoint_range);

        let mut seasonalities = Vec::new();
        if self.config.weekly_seasonality.resolve(span_days, WEEKLY_PERIOD) {
            seasonalities.push(Seasonality {
                period: WEEKLY_PERIOD,
                order: self.config.weekly_fourier_order,
            });
        }
        if self.config.yearly_seasonality.resolve(span_days, YEARLY_PERIOD) {
            seasonalities.push(Seasonality {
                period: YEARLY_PERIOD,
                order: self.config.yearly_fourier_order,
            });
        }

        let holidays = holidays.filter(|h| !h.is_empty()).cloned();
        let holiday_offsets = holidays.as_ref().map(HolidaySet::offsets).unwrap_or_default();

        let mut model = FittedDecomposableModel {
            name: self.name.clone(),
            mode: self.config.seasonality_mode,
            history_dates: dates.clone(),
            start,
            span_days,
            y_scale,
            changepoints,
            trend_coefficients: Vec::new(),
            seasonalities,
            holidays,
            holiday_offsets,
            effect_coefficients: Vec::new(),
            sigma: 0.0,
            mean_abs_delta: 0.0,
            z: central_interval_z(self.config.interval_width)?,
        };

        let trend_rows: Vec<Vec<f64>> = t.iter().map(|&ti| trend_row(ti, &model.changepoints)).collect();
        let effect_rows: Vec<Vec<f64>> = dates.iter().map(|&d| model.effect_row(d)).collect();

        let trend_solver = RidgeRegression::new(self.trend_penalties(model.changepoints.len())?)
            .map_err(fit_error)?;
        let effect_solver = if effect_rows[0].is_empty() || y.iter().all(|v| *v == 0.0) {
            None
        } else {
            Some(
                RidgeRegression::new(self.effect_penalties(&model)?).map_err(fit_error)?,
            )
        };

        let mut effects = vec![0.0; n];
        let mut trend = vec![0.0; n];
        for _ in 0..FIT_PASSES {
            let trend_target = y
                .iter()
                .zip(&effects)
                .map(|(&yi, &ei)| model.remove_effect(yi, ei))
                .collect::<Result<Vec<f64>>>()?;
            model.trend_coefficients = trend_solver.fit(&trend_rows, &trend_target).map_err(fit_error)?;
            trend = trend_rows
                .iter()
                .map(|row| dot(row, &model.trend_coefficients))
                .collect();

            let Some(solver) = &effect_solver else {
                break;
            };
            // A trend at zero everywhere leaves no multiplicative effect to estimate.
            if model.mode == SeasonalityMode::Multiplicative
                && trend.iter().all(|t| t.abs() < MIN_DIVISOR)
            {
                break;
            }

            let effect_target = y
                .iter()
                .zip(&trend)
                .map(|(&yi, &ti)| model.effect_share(yi, ti))
                .collect::<Result<Vec<f64>>>()?;
            model.effect_coefficients = solver.fit(&effect_rows, &effect_target).map_err(fit_error)?;
            effects = effect_rows
                .iter()
                .map(|row| dot(row, &model.effect_coefficients))
                .collect();
        }

        let residuals: Vec<f64> = y
            .iter()
            .zip(trend.iter().zip(&effects))
            .map(|(&yi, (&ti, &ei))| yi - model.combine(ti, ei))
            .collect();
        model.sigma = root_mean_square(&residuals).unwrap_or(0.0);

        let deltas: Vec<f64> = model.trend_coefficients[2..].iter().map(|d| d.abs()).collect();
        model.mean_abs_delta = mean(&deltas).unwrap_or(0.0);

        debug!(
            observations = n,
            changepoints = model.changepoints.len(),
            seasonalities = model.seasonalities.len(),
            holiday_offsets = model.holiday_offsets.len(),
            sigma = model.sigma,
            "fitted decomposable model"
        );

        Ok(model)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl DecomposableModel {
    fn trend_penalties(&self, n_changepoints: usize) -> Result<Vec<f64>> {
        let base = RidgeRegression::penalty_for_prior(PRIOR_NOISE_SCALE, TREND_BASE_PRIOR_SCALE)
            .map_err(fit_error)?;
        let delta = RidgeRegression::penalty_for_prior(
            PRIOR_NOISE_SCALE,
            self.config.changepoint_prior_scale,
        )
        .map_err(fit_error)?;

        let mut penalties = vec![base, base];
        penalties.extend(std::iter::repeat(delta).take(n_changepoints));
        Ok(penalties)
    }

    fn effect_penalties(&self, model: &FittedDecomposableModel) -> Result<Vec<f64>> {
        let seasonal = RidgeRegression::penalty_for_prior(
            PRIOR_NOISE_SCALE,
            self.config.seasonality_prior_scale,
        )
        .map_err(fit_error)?;
        let holiday =
            RidgeRegression::penalty_for_prior(PRIOR_NOISE_SCALE, self.config.holidays_prior_scale)
                .map_err(fit_error)?;

        let seasonal_columns: usize = model.seasonalities.iter().map(|s| 2 * s.order).sum();
        let mut penalties = vec![seasonal; seasonal_columns];
        penalties.extend(std::iter::repeat(holiday).take(model.holiday_offsets.len()));
        Ok(penalties)
    }
}

fn fit_error(err: demand_math::MathError) -> ForecastError {
    ForecastError::ModelFit(err.to_string())
}

impl FittedDecomposableModel {
    /// Seasonal and holiday features for one date
    fn effect_row(&self, date: NaiveDate) -> Vec<f64> {
        let t_days = (date - self.start).num_days() as f64;
        let mut row: Vec<f64> = self
            .seasonalities
            .iter()
            .flat_map(|s| fourier_terms(t_days, s.period, s.order))
            .collect();

        if let Some(holidays) = &self.holidays {
            row.extend(self.holiday_offsets.iter().map(|&offset| {
                if holidays.is_active(date, offset) {
                    1.0
                } else {
                    0.0
                }
            }));
        }

        row
    }

    fn combine(&self, trend: f64, effect: f64) -> f64 {
        match self.mode {
            SeasonalityMode::Additive => trend + effect,
            SeasonalityMode::Multiplicative => trend * (1.0 + effect),
        }
    }

    /// Observation with the current effects taken out, the trend's target
    fn remove_effect(&self, y: f64, effect: f64) -> Result<f64> {
        match self.mode {
            SeasonalityMode::Additive => Ok(y - effect),
            SeasonalityMode::Multiplicative => {
                let factor = 1.0 + effect;
                if factor.abs() < MIN_DIVISOR {
                    return Err(ForecastError::ModelFit(
                        "Multiplicative effects cancel the trend".to_string(),
                    ));
                }
                Ok(y / factor)
            }
        }
    }

    /// Part of the observation not explained by the trend, the effects' target
    fn effect_share(&self, y: f64, trend: f64) -> Result<f64> {
        match self.mode {
            SeasonalityMode::Additive => Ok(y - trend),
            SeasonalityMode::Multiplicative => {
                if trend.abs() < MIN_DIVISOR {
                    return Err(ForecastError::ModelFit(
                        "Trend crosses zero; multiplicative effects cannot be estimated"
                            .to_string(),
                    ));
                }
                Ok(y / trend - 1.0)
            }
        }
    }

    /// Forecast a single date
    fn point(&self, date: NaiveDate) -> ForecastPoint {
        let t = (date - self.start).num_days() as f64 / self.span_days;
        let trend = piecewise_linear(t, &self.trend_coefficients, &self.changepoints);
        let effect = if self.effect_coefficients.is_empty() {
            0.0
        } else {
            dot(&self.effect_row(date), &self.effect_coefficients)
        };
        let yhat = self.combine(trend, effect);

        // Trend uncertainty grows with distance past the history.
        let mut trend_sd = self.mean_abs_delta * (t - 1.0).max(0.0);
        if self.mode == SeasonalityMode::Multiplicative {
            trend_sd *= (1.0 + effect).abs();
        }
        let half_width = self.z * (self.sigma.powi(2) + trend_sd.powi(2)).sqrt();

        ForecastPoint {
            ds: date,
            yhat: yhat * self.y_scale,
            yhat_lower: (yhat - half_width) * self.y_scale,
            yhat_upper: (yhat + half_width) * self.y_scale,
        }
    }

}

impl FittedModel for FittedDecomposableModel {
    fn predict(&self, horizon_days: usize) -> Result<ForecastSeries> {
        let last = *self
            .history_dates
            .last()
            .ok_or_else(|| ForecastError::ModelFit("Model has no history".to_string()))?;

        let overflow = || {
            ForecastError::InvalidParameter(format!(
                "Forecast horizon of {} days overflows the calendar",
                horizon_days
            ))
        };
        let horizon = u64::try_from(horizon_days).map_err(|_| overflow())?;
        last.checked_add_days(Days::new(horizon)).ok_or_else(overflow)?;
        let capacity = self
            .history_dates
            .len()
            .checked_add(horizon_days)
            .ok_or_else(overflow)?;

        let mut points = Vec::with_capacity(capacity);
        points.extend(self.history_dates.iter().map(|&d| self.point(d)));
        points.extend(
            last.iter_days()
                .skip(1)
                .take(horizon_days)
                .map(|date| self.point(date)),
        );

        Ok(ForecastSeries::new(points))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
