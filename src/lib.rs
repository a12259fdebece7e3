//! # Stockwise
//!
//! Command-line front end for [`demand_forecast`]: forecast one product from
//! a sales CSV, print the restock advice and accuracy metrics, and write both
//! forecast charts to disk.
//!
//! ```text
//! stockwise forecast --input sales.csv --product milk --days 30 --stock 1200
//! stockwise products
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use demand_forecast::pipeline::{
    FailureDocument, ForecastOutcome, ResultDocument, SuccessDocument,
};
use demand_forecast::plot::{ForecastPlots, RenderedPlot};
use demand_forecast::{
    product_names, ForecastPipeline, ForecastRequest, PipelineConfig, SalesTable,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub use demand_forecast;

#[derive(Parser, Debug)]
#[clap(name = "stockwise")]
#[clap(about = "Forecast retail demand and get restock advice")]
#[clap(version)]
pub struct Cli {
    /// TOML configuration file; falls back to $STOCKWISE_CONFIG
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Forecast demand for one product
    Forecast(ForecastArgs),
    /// List the products that can be forecast
    Products,
}

#[derive(Args, Debug, Clone)]
pub struct ForecastArgs {
    /// Sales CSV with Store, Date, Weekly_Sales and optional Holiday_Flag
    #[clap(short, long)]
    pub input: PathBuf,

    /// Product name, case-insensitive
    #[clap(short, long)]
    pub product: String,

    /// Days to forecast
    #[clap(short, long, default_value_t = 30)]
    pub days: usize,

    /// Units currently in stock
    #[clap(short, long, default_value_t = 0)]
    pub stock: u64,

    /// Directory for the chart images
    #[clap(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Also write the result document as JSON
    #[clap(long)]
    pub json: Option<PathBuf>,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Forecast(args) => run_forecast(&args, cli.config.as_deref()),
        Commands::Products => {
            for name in product_names() {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

fn run_forecast(args: &ForecastArgs, config_path: Option<&Path>) -> Result<()> {
    let config = PipelineConfig::resolve(config_path).context("Failed to load configuration")?;
    let table = SalesTable::from_csv_path(&args.input)
        .with_context(|| format!("Failed to read sales data from {}", args.input.display()))?;
    let pipeline = ForecastPipeline::new(config)?;
    let request = ForecastRequest::new(args.product.as_str(), args.days, args.stock);

    let outcome = pipeline.try_run(&table, &request);
    let document = match &outcome {
        Ok(outcome) => ResultDocument::Success(SuccessDocument::from(outcome)),
        Err(failure) => ResultDocument::Failure(FailureDocument::from(failure)),
    };
    if let Some(path) = &args.json {
        write_document(&document, path)?;
    }

    let outcome = outcome?;
    let written = write_plots(&outcome.plots, &args.output_dir)?;
    print_summary(&outcome, &written);
    Ok(())
}

fn print_summary(outcome: &ForecastOutcome, written: &[PathBuf]) {
    println!("Inventory Advice: {}", outcome.recommendation);
    println!("{}", outcome.metrics);
    for path in written {
        println!("Saved {}", path.display());
    }
}

/// Write the result document as pretty JSON
pub fn write_document(document: &ResultDocument, path: &Path) -> Result<()> {
    let json = document.to_json_pretty()?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote result document");
    Ok(())
}

/// Save both charts into `dir`, returning the written paths
pub fn write_plots(plots: &ForecastPlots, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let named: [(&str, &RenderedPlot); 2] = [
        ("forecast_with_history", &plots.with_history),
        ("forecast_only", &plots.forecast_only),
    ];

    let mut written = Vec::with_capacity(named.len());
    for (stem, plot) in named {
        let path = dir.join(format!("{}.{}", stem, plot.format.extension()));
        fs::write(&path, &plot.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
