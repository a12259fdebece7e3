//! # Demand Forecast
//!
//! Per-product daily demand forecasting from weekly store sales.
//!
//! ## Features
//!
//! - CSV ingestion of `Store, Date, Weekly_Sales[, Holiday_Flag]` rows
//! - Fixed product catalog mapping products to stores
//! - Daily series preparation by forward-filling weekly sales
//! - Holiday extraction from flagged rows
//! - Decomposable trend / seasonality / holiday model with uncertainty bands
//! - Hold-out evaluation (MAE, RMSE, MAPE, accuracy)
//! - SVG forecast charts, base64 encoded for JSON transport
//! - Reorder / excess / balanced stock recommendation
//!
//! ## Quick Start
//!
//! ```no_run
//! use demand_forecast::data::SalesTable;
//! use demand_forecast::pipeline::{ForecastPipeline, ForecastRequest};
//! use demand_forecast::config::PipelineConfig;
//!
//! # fn main() -> demand_forecast::Result<()> {
//! // Load weekly sales
//! let table = SalesTable::from_csv_path("sales.csv")?;
//!
//! // Forecast two weeks of milk demand against 1200 units in stock
//! let pipeline = ForecastPipeline::new(PipelineConfig::default())?;
//! let document = pipeline.run(&table, &ForecastRequest::new("milk", 14, 1200));
//!
//! println!("{}", document.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod holidays;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod plot;
pub mod recommendation;

// Re-export commonly used types
pub use crate::catalog::{product_names, Product};
pub use crate::config::PipelineConfig;
pub use crate::data::{prepare_product_data, ProductSeries, SalesTable};
pub use crate::error::{ForecastError, Result};
pub use crate::holidays::{extract_holidays, HolidaySet};
pub use crate::metrics::{evaluate_forecast, Metrics};
pub use crate::models::{FittedModel, ForecastModel, ForecastPoint, ForecastSeries};
pub use crate::pipeline::{ForecastPipeline, ForecastRequest, ResultDocument};
pub use crate::plot::{PlotRenderer, RenderedPlot, SvgPlotRenderer};
pub use crate::recommendation::{recommend_stock_action, Recommendation};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
