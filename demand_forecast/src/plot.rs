//! Forecast chart rendering
//!
//! Charts are drawn as SVG so rendering needs no system fonts, and the bytes
//! are base64-encoded for embedding in a JSON result.

use crate::catalog::Product;
use crate::config::PlotConfig;
use crate::data::ProductSeries;
use crate::error::{ForecastError, Result};
use crate::models::ForecastSeries;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Encoding of rendered chart bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Svg,
}

impl ImageFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
        }
    }
}

/// Rendered chart image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPlot {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl RenderedPlot {
    /// Text-safe encoding for transport
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Decode a payload produced by [`RenderedPlot::to_base64`]
    pub fn from_base64(encoded: &str, format: ImageFormat) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| ForecastError::RenderError(format!("Invalid image payload: {}", e)))?;
        Ok(Self { bytes, format })
    }
}

/// Which of the two chart variants is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    WithHistory,
    ForecastOnly,
}

/// Everything needed to draw one chart
#[derive(Debug, Clone, Copy)]
pub struct ForecastChart<'a> {
    pub product: Product,
    pub kind: ChartKind,
    pub forecast: &'a ForecastSeries,
    /// Observed values drawn under the forecast
    pub history: Option<&'a ProductSeries>,
}

impl ForecastChart<'_> {
    /// Chart title, e.g. `Milk - Forecast with History`
    pub fn title(&self) -> String {
        let suffix = match self.kind {
            ChartKind::WithHistory => "with History",
            ChartKind::ForecastOnly => "Only",
        };
        format!("{} - Forecast {}", self.product.display_name(), suffix)
    }
}

/// Turns a forecast chart into image bytes
///
/// Implementations must be pure: the same chart always renders to the same
/// bytes.
pub trait PlotRenderer: Debug + Send + Sync {
    fn render(&self, chart: &ForecastChart<'_>) -> Result<RenderedPlot>;
}

/// Both chart variants for one forecast run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastPlots {
    pub with_history: RenderedPlot,
    pub forecast_only: RenderedPlot,
}

/// Render the history overlay and the future-only chart
///
/// The future-only chart keeps forecast dates strictly after the last
/// observed date.
pub fn render_forecast_plots<R: PlotRenderer + ?Sized>(
    renderer: &R,
    product: Product,
    history: &ProductSeries,
    forecast: &ForecastSeries,
) -> Result<ForecastPlots> {
    let with_history = renderer.render(&ForecastChart {
        product,
        kind: ChartKind::WithHistory,
        forecast,
        history: Some(history),
    })?;

    let future = match history.last_date() {
        Some(last) => forecast.after(last),
        None => forecast.clone(),
    };
    let forecast_only = renderer.render(&ForecastChart {
        product,
        kind: ChartKind::ForecastOnly,
        forecast: &future,
        history: None,
    })?;

    Ok(ForecastPlots {
        with_history,
        forecast_only,
    })
}

/// SVG renderer backed by plotters
#[derive(Debug, Clone, Default)]
pub struct SvgPlotRenderer {
    config: PlotConfig,
}

impl SvgPlotRenderer {
    pub fn new(config: PlotConfig) -> Self {
        Self { config }
    }
}

fn to_datetime(date: NaiveDate) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(chrono::NaiveTime::MIN), Utc)
}

fn render_error<E: fmt::Display>(step: &'static str) -> impl FnOnce(E) -> ForecastError {
    move |e| ForecastError::RenderError(format!("Failed to {}: {}", step, e))
}

/// Time and value bounds of everything drawn, padded by 10%
fn chart_bounds(chart: &ForecastChart<'_>) -> Result<(DateTime<Utc>, DateTime<Utc>, f64, f64)> {
    let forecast_dates = chart.forecast.points().iter().map(|p| p.ds);
    let history_dates = chart.history.into_iter().flat_map(|h| h.dates());
    let dates: Vec<NaiveDate> = forecast_dates.chain(history_dates).collect();

    let (start, end) = match (dates.iter().min(), dates.iter().max()) {
        (Some(start), Some(end)) => (to_datetime(*start), to_datetime(*end)),
        _ => {
            return Err(ForecastError::RenderError(
                "No points to plot".to_string(),
            ))
        }
    };
    let end = if end > start { end } else { start + Duration::days(1) };

    let values = chart
        .forecast
        .points()
        .iter()
        .flat_map(|p| [p.yhat_lower, p.yhat_upper, p.yhat])
        .chain(chart.history.into_iter().flat_map(|h| h.values()))
        .filter(|v| v.is_finite());
    let (min_value, max_value) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min_value.is_finite() {
        return Err(ForecastError::RenderError(
            "No finite values to plot".to_string(),
        ));
    }

    let padding = ((max_value - min_value) * 0.1).max(1.0);
    Ok((start, end, min_value - padding, max_value + padding))
}

impl PlotRenderer for SvgPlotRenderer {
    fn render(&self, chart: &ForecastChart<'_>) -> Result<RenderedPlot> {
        let (start, end, min_value, max_value) = chart_bounds(chart)?;
        let title = chart.title();
        let mut svg = String::new();

        {
            let root = SVGBackend::with_string(&mut svg, (self.config.width, self.config.height))
                .into_drawing_area();
            root.fill(&WHITE).map_err(render_error("fill background"))?;

            let mut context = ChartBuilder::on(&root)
                .caption(&title, ("sans-serif", 24).into_font())
                .margin(20)
                .x_label_area_size(50)
                .y_label_area_size(80)
                .build_cartesian_2d(start..end, min_value..max_value)
                .map_err(render_error("build chart"))?;

            context
                .configure_mesh()
                .x_desc("Date")
                .y_desc("Sales")
                .x_label_formatter(&|x| x.format("%Y-%m-%d").to_string())
                .draw()
                .map_err(render_error("configure mesh"))?;

            let points = chart.forecast.points();
            let band: Vec<(DateTime<Utc>, f64)> = points
                .iter()
                .map(|p| (to_datetime(p.ds), p.yhat_upper))
                .chain(points.iter().rev().map(|p| (to_datetime(p.ds), p.yhat_lower)))
                .collect();
            context
                .draw_series(std::iter::once(Polygon::new(band, BLUE.mix(0.2).filled())))
                .map_err(render_error("draw interval band"))?;

            if let Some(history) = chart.history {
                context
                    .draw_series(LineSeries::new(
                        history.points().iter().map(|p| (to_datetime(p.ds), p.y)),
                        &BLACK,
                    ))
                    .map_err(render_error("draw history"))?
                    .label("Historical Sales")
                    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], BLACK));
            }

            context
                .draw_series(LineSeries::new(
                    points.iter().map(|p| (to_datetime(p.ds), p.yhat)),
                    &BLUE,
                ))
                .map_err(render_error("draw forecast"))?
                .label("Forecasted Sales")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], BLUE));

            context
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .margin(10)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(render_error("draw legend"))?;

            root.present().map_err(render_error("present chart"))?;
        }

        Ok(RenderedPlot {
            bytes: svg.into_bytes(),
            format: ImageFormat::Svg,
        })
    }
}
