use chrono::{Days, NaiveDate};
use demand_forecast::config::{ModelConfig, SeasonalityMode};
use demand_forecast::data::RawSalesRow;
use demand_forecast::models::DecomposableModel;
use demand_forecast::plot::SvgPlotRenderer;
use demand_forecast::{
    FittedModel, ForecastModel, ForecastPipeline, ForecastPoint, ForecastRequest, ForecastSeries,
    HolidaySet, PipelineConfig, ProductSeries, Recommendation, Result, SalesTable,
};

/// Repeats the last observation, with no uncertainty
#[derive(Debug, Clone)]
struct LastValue;

#[derive(Debug)]
struct FittedLastValue {
    dates: Vec<NaiveDate>,
    last: f64,
}

impl ForecastModel for LastValue {
    type Fitted = FittedLastValue;

    fn fit(&self, history: &ProductSeries, _holidays: Option<&HolidaySet>) -> Result<Self::Fitted> {
        Ok(FittedLastValue {
            dates: history.dates(),
            last: history.values().last().copied().unwrap_or(0.0),
        })
    }

    fn name(&self) -> &str {
        "Last Value"
    }
}

impl FittedModel for FittedLastValue {
    fn predict(&self, horizon_days: usize) -> Result<ForecastSeries> {
        let last_date = *self.dates.last().unwrap();
        let future = (1..=horizon_days as u64).map(|d| last_date + Days::new(d));
        Ok(ForecastSeries::new(
            self.dates
                .iter()
                .copied()
                .chain(future)
                .map(|ds| ForecastPoint {
                    ds,
                    yhat: self.last,
                    yhat_lower: self.last,
                    yhat_upper: self.last,
                })
                .collect(),
        ))
    }

    fn name(&self) -> &str {
        "Last Value"
    }
}

fn flat_table(days: u64, value: f64) -> SalesTable {
    let start = NaiveDate::from_ymd_opt(2012, 1, 2).unwrap();
    SalesTable::new(
        (0..days)
            .map(|i| RawSalesRow {
                store: 4,
                date: start + Days::new(i),
                weekly_sales: value,
                holiday_flag: None,
            })
            .collect(),
        false,
    )
}

#[test]
fn test_pipeline_accepts_any_model() {
    let config = PipelineConfig::default();
    let pipeline =
        ForecastPipeline::with_components(LastValue, SvgPlotRenderer::new(config.plot.clone()), config);

    let outcome = pipeline
        .try_run(&flat_table(40, 50.0), &ForecastRequest::new("snacks", 10, 400))
        .unwrap();

    assert_eq!(outcome.metrics.mae, 0.0);
    assert_eq!(outcome.metrics.accuracy, 100.0);
    // 10 days at 50 units against 400 in stock.
    assert_eq!(outcome.recommendation, Recommendation::Reorder { units: 100 });
}

#[test]
fn test_flat_history_forecasts_flat() {
    let history = ProductSeries::from_daily_values(
        NaiveDate::from_ymd_opt(2012, 1, 2).unwrap(),
        &[200.0; 60],
    );
    let fitted = DecomposableModel::new(ModelConfig::default())
        .unwrap()
        .fit(&history, None)
        .unwrap();

    for point in fitted.predict(14).unwrap().tail(14).points() {
        assert!((point.yhat - 200.0).abs() < 2.0, "yhat {}", point.yhat);
    }
}

#[test]
fn test_interval_widens_with_horizon() {
    let values: Vec<f64> = (0..120)
        .map(|i| 500.0 + if i < 60 { 2.0 * i as f64 } else { 120.0 - (i - 60) as f64 })
        .collect();
    let history =
        ProductSeries::from_daily_values(NaiveDate::from_ymd_opt(2012, 1, 2).unwrap(), &values);
    let config = ModelConfig {
        seasonality_mode: SeasonalityMode::Additive,
        ..ModelConfig::default()
    };
    let fitted = DecomposableModel::new(config).unwrap().fit(&history, None).unwrap();

    let forecast = fitted.predict(60).unwrap();
    let width = |p: &ForecastPoint| p.yhat_upper - p.yhat_lower;
    let near = width(&forecast.points()[120]);
    let far = width(&forecast.points()[179]);
    assert!(far >= near);
}

#[test]
fn test_model_names() {
    let model = DecomposableModel::new(ModelConfig::default()).unwrap();
    assert!(model.name().starts_with("Decomposable"));
    assert_eq!(LastValue.name(), "Last Value");
}
