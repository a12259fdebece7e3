//! End-to-end forecast run for one product
//!
//! Stages run in a fixed order: holidays, series preparation, hold-out
//! evaluation, final forecast, chart rendering and restock advice. The first
//! failing stage stops the run; [`ForecastPipeline::run`] turns that failure
//! into an error-shaped [`ResultDocument`] instead of returning an error.

use crate::catalog::Product;
use crate::config::PipelineConfig;
use crate::data::{product_series, ProductSeries, SalesTable};
use crate::error::{ForecastError, Result};
use crate::holidays::{extract_holidays, HolidaySet};
use crate::metrics::{evaluate_forecast, Metrics};
use crate::models::{
    DecomposableModel, FittedModel, ForecastModel, ForecastPoint, ForecastSeries,
};
use crate::plot::{render_forecast_plots, ForecastPlots, PlotRenderer, SvgPlotRenderer};
use crate::recommendation::{recommend_stock_action, Recommendation};
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Observations the evaluation model needs ahead of the held-out tail
pub const MIN_TRAINING_DAYS: usize = 2;

/// Recommendation message on every failure document
pub const FAILURE_MESSAGE: &str = "Error occurred. Please check inputs.";

/// Parameters of one forecast request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRequest {
    /// Catalog name, matched case-insensitively
    pub product: String,
    /// Days to forecast past the last observation
    pub forecast_days: usize,
    pub current_stock: u64,
}

impl ForecastRequest {
    pub fn new(product: impl Into<String>, forecast_days: usize, current_stock: u64) -> Self {
        Self {
            product: product.into(),
            forecast_days,
            current_stock,
        }
    }
}

/// Length of the held-out tail used for evaluation
pub fn test_days(forecast_days: usize, max_test_days: usize) -> usize {
    forecast_days.min(max_test_days)
}

/// Pipeline step that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validate,
    Prepare,
    Evaluate,
    Forecast,
    Render,
}

impl PipelineStage {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Validate => "validate",
            PipelineStage::Prepare => "prepare",
            PipelineStage::Evaluate => "evaluate",
            PipelineStage::Forecast => "forecast",
            PipelineStage::Render => "render",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// First failure of a run and the stage it came from
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageFailure {
    pub stage: PipelineStage,
    #[source]
    pub source: ForecastError,
}

trait AtStage<T> {
    fn at(self, stage: PipelineStage) -> std::result::Result<T, StageFailure>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: PipelineStage) -> std::result::Result<T, StageFailure> {
        self.map_err(|source| StageFailure { stage, source })
    }
}

/// Everything a successful run produces
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOutcome {
    pub product: Product,
    /// Full daily history the final model was fitted on
    pub history: ProductSeries,
    /// History dates plus the requested horizon
    pub full_forecast: ForecastSeries,
    /// Last `forecast_days` points of `full_forecast`
    pub forecast: ForecastSeries,
    /// Hold-out accuracy of the evaluation model
    pub metrics: Metrics,
    pub plots: ForecastPlots,
    pub recommendation: Recommendation,
}

/// JSON body of a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessDocument {
    pub forecast: ForecastSeries,
    pub metrics: Metrics,
    /// Base64 chart with history overlay
    pub plot_with_history: String,
    /// Base64 chart of future dates only
    pub plot_forecast_only: String,
    pub recommendation: Recommendation,
}

impl From<&ForecastOutcome> for SuccessDocument {
    fn from(outcome: &ForecastOutcome) -> Self {
        Self {
            forecast: outcome.forecast.clone(),
            metrics: outcome.metrics,
            plot_with_history: outcome.plots.with_history.to_base64(),
            plot_forecast_only: outcome.plots.forecast_only.to_base64(),
            recommendation: outcome.recommendation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecommendation {
    pub message: String,
}

/// JSON body of a failed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureDocument {
    /// Error message followed by its source chain
    pub error: String,
    /// Stable tag from [`ForecastError::kind`]
    pub kind: &'static str,
    pub stage: PipelineStage,
    pub forecast: Vec<ForecastPoint>,
    pub recommendation: FailureRecommendation,
}

impl From<&StageFailure> for FailureDocument {
    fn from(failure: &StageFailure) -> Self {
        Self {
            error: error_chain(&failure.source),
            kind: failure.source.kind(),
            stage: failure.stage,
            forecast: Vec::new(),
            recommendation: FailureRecommendation {
                message: FAILURE_MESSAGE.to_string(),
            },
        }
    }
}

/// Result of [`ForecastPipeline::run`], serialised as one flat JSON object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultDocument {
    Success(SuccessDocument),
    Failure(FailureDocument),
}

impl ResultDocument {
    pub fn is_success(&self) -> bool {
        matches!(self, ResultDocument::Success(_))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ForecastError::Pipeline(format!("Cannot serialise result: {}", e)))
    }
}

/// Join an error with its sources, skipping text already shown
fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Forecast pipeline over a model and a chart renderer
///
/// Holds only immutable configuration, so one pipeline can serve parallel
/// requests.
#[derive(Debug, Clone)]
pub struct ForecastPipeline<M, R> {
    model: M,
    renderer: R,
    config: PipelineConfig,
}

impl ForecastPipeline<DecomposableModel, SvgPlotRenderer> {
    /// Pipeline with the decomposable model and SVG charts
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let model = DecomposableModel::new(config.model.clone())?;
        let renderer = SvgPlotRenderer::new(config.plot.clone());
        Ok(Self {
            model,
            renderer,
            config,
        })
    }
}

impl<M: ForecastModel, R: PlotRenderer> ForecastPipeline<M, R> {
    /// Pipeline over custom components
    pub fn with_components(model: M, renderer: R, config: PipelineConfig) -> Self {
        Self {
            model,
            renderer,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage, converting a failure into an error document
    pub fn run(&self, table: &SalesTable, request: &ForecastRequest) -> ResultDocument {
        match self.try_run(table, request) {
            Ok(outcome) => ResultDocument::Success(SuccessDocument::from(&outcome)),
            Err(failure) => {
                warn!(
                    stage = %failure.stage,
                    kind = failure.source.kind(),
                    error = %failure.source,
                    "forecast run failed"
                );
                ResultDocument::Failure(FailureDocument::from(&failure))
            }
        }
    }

    /// Run every stage, stopping at the first failure
    pub fn try_run(
        &self,
        table: &SalesTable,
        request: &ForecastRequest,
    ) -> std::result::Result<ForecastOutcome, StageFailure> {
        info!(
            product = %request.product,
            forecast_days = request.forecast_days,
            current_stock = request.current_stock,
            model = self.model.name(),
            "starting forecast run"
        );

        self.validate(request).at(PipelineStage::Validate)?;

        let holidays = extract_holidays(table);
        info!(
            holidays = holidays.as_ref().map_or(0, HolidaySet::len),
            "extracted holidays"
        );

        let product = Product::lookup(&request.product).at(PipelineStage::Prepare)?;
        let history = self.prepare(table, product).at(PipelineStage::Prepare)?;

        let metrics = self
            .evaluate(&history, holidays.as_ref(), request.forecast_days)
            .at(PipelineStage::Evaluate)?;
        info!(mae = metrics.mae, rmse = metrics.rmse, mape = metrics.mape, "evaluated hold-out");

        let full_forecast = self
            .forecast(&history, holidays.as_ref(), request.forecast_days)
            .at(PipelineStage::Forecast)?;
        let forecast = full_forecast.tail(request.forecast_days);

        let plots = render_forecast_plots(&self.renderer, product, &history, &full_forecast)
            .at(PipelineStage::Render)?;

        let recommendation = recommend_stock_action(
            &forecast,
            request.current_stock,
            self.config.recommendation.excess_tolerance,
        );
        info!(status = recommendation.status(), units = recommendation.units(), "recommendation ready");

        Ok(ForecastOutcome {
            product,
            history,
            full_forecast,
            forecast,
            metrics,
            plots,
            recommendation,
        })
    }

    fn validate(&self, request: &ForecastRequest) -> Result<()> {
        let max = self.config.evaluation.max_forecast_days;
        if request.forecast_days == 0 || request.forecast_days > max {
            return Err(ForecastError::InvalidParameter(format!(
                "forecast_days must be between 1 and {}, got {}",
                max, request.forecast_days
            )));
        }
        Ok(())
    }

    fn prepare(&self, table: &SalesTable, product: Product) -> Result<ProductSeries> {
        let series = product_series(table, product)?;
        let required = self.config.evaluation.min_history_days;
        if series.len() < required {
            return Err(ForecastError::InsufficientHistory {
                required,
                actual: series.len(),
            });
        }
        Ok(series)
    }

    /// Fit on all but the last `test_days` points and score the held-out tail
    fn evaluate(
        &self,
        history: &ProductSeries,
        holidays: Option<&HolidaySet>,
        forecast_days: usize,
    ) -> Result<Metrics> {
        let held_out = test_days(forecast_days, self.config.evaluation.max_test_days);
        let required = held_out + MIN_TRAINING_DAYS;
        if history.len() < required {
            return Err(ForecastError::InsufficientHistory {
                required,
                actual: history.len(),
            });
        }

        let (train, test) = history.split_tail(held_out);
        debug!(train = train.len(), test = test.len(), "split history");

        let fitted = self.model.fit(&train, holidays)?;
        let predicted = fitted.predict(held_out)?;
        evaluate_forecast(&test, &predicted)
    }

    /// Refit on the whole history and forecast the requested horizon
    fn forecast(
        &self,
        history: &ProductSeries,
        holidays: Option<&HolidaySet>,
        forecast_days: usize,
    ) -> Result<ForecastSeries> {
        let fitted = self.model.fit(history, holidays)?;
        debug!(model = fitted.name(), "refitted on full history");
        fitted.predict(forecast_days)
    }
}
