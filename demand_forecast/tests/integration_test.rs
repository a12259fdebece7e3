use chrono::{Days, NaiveDate};
use demand_forecast::models::DecomposableModel;
use demand_forecast::pipeline::{
    FailureDocument, ForecastOutcome, PipelineStage, SuccessDocument, FAILURE_MESSAGE,
};
use demand_forecast::plot::{ImageFormat, RenderedPlot};
use demand_forecast::{
    ForecastPipeline, ForecastRequest, PipelineConfig, Recommendation, ResultDocument, SalesTable,
    SvgPlotRenderer,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

// Daily rows for one store with a mild weekly cycle
fn create_daily_csv(store: u32, days: u64) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let start = NaiveDate::from_ymd_opt(2011, 3, 7).unwrap();

    writeln!(file, "Store,Date,Weekly_Sales,Holiday_Flag").unwrap();
    for i in 0..days {
        let date = start + Days::new(i);
        let weekday = [0.0, 40.0, 80.0, 40.0, 0.0, -60.0, -100.0][(i % 7) as usize];
        let sales = 1500.0 + 10.0 * i as f64 + weekday;
        let flag = u8::from(i == 10);
        writeln!(file, "{},{},{},{}", store, date.format("%d-%m-%Y"), sales, flag).unwrap();
    }

    file
}

fn load(file: &NamedTempFile) -> SalesTable {
    SalesTable::from_csv_path(file.path()).unwrap()
}

fn default_pipeline() -> ForecastPipeline<DecomposableModel, SvgPlotRenderer> {
    ForecastPipeline::new(PipelineConfig::default()).unwrap()
}

fn success(doc: ResultDocument) -> SuccessDocument {
    match doc {
        ResultDocument::Success(success) => success,
        ResultDocument::Failure(failure) => panic!("expected success, got {:?}", failure),
    }
}

fn failure(doc: ResultDocument) -> FailureDocument {
    match doc {
        ResultDocument::Failure(failure) => failure,
        ResultDocument::Success(_) => panic!("expected failure"),
    }
}

#[test]
fn test_full_forecast_workflow() {
    let csv = create_daily_csv(1, 90);
    let table = load(&csv);
    assert_eq!(table.len(), 90);
    assert!(table.has_holiday_flag());

    let outcome: ForecastOutcome = default_pipeline()
        .try_run(&table, &ForecastRequest::new("Milk", 14, 20_000))
        .unwrap();

    assert_eq!(outcome.history.len(), 90);
    assert_eq!(outcome.forecast.len(), 14);
    assert_eq!(outcome.full_forecast.len(), 104);
    assert!(outcome.metrics.mae >= 0.0);
    assert!(outcome.metrics.rmse >= outcome.metrics.mae);

    let first_future = outcome.history.last_date().unwrap() + Days::new(1);
    assert_eq!(outcome.forecast.points()[0].ds, first_future);

    for point in outcome.forecast.points() {
        assert!(point.yhat_lower <= point.yhat && point.yhat <= point.yhat_upper);
    }

    // Demand for two weeks is roughly 14 * 2400, well above the stock.
    assert!(matches!(outcome.recommendation, Recommendation::Reorder { .. }));
}

#[test]
fn test_success_document_json_shape() {
    let csv = create_daily_csv(2, 60);
    let doc = default_pipeline().run(&load(&csv), &ForecastRequest::new("bread", 7, 0));
    assert!(doc.is_success());

    let json: serde_json::Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();
    let forecast = json["forecast"].as_array().unwrap();
    assert_eq!(forecast.len(), 7);
    for key in ["ds", "yhat", "yhat_lower", "yhat_upper"] {
        assert!(forecast[0].get(key).is_some(), "missing {}", key);
    }
    for key in ["MAE", "RMSE", "MAPE", "ACCURACY"] {
        assert!(json["metrics"][key].is_number(), "missing metric {}", key);
    }
    assert_eq!(json["recommendation"]["status"], "reorder");
    assert!(json["plot_with_history"].is_string());
    assert!(json["plot_forecast_only"].is_string());
}

#[test]
fn test_plots_decode_to_svg() {
    let csv = create_daily_csv(3, 45);
    let doc = success(default_pipeline().run(&load(&csv), &ForecastRequest::new("fruits", 10, 100)));

    for encoded in [&doc.plot_with_history, &doc.plot_forecast_only] {
        let plot = RenderedPlot::from_base64(encoded, ImageFormat::Svg).unwrap();
        assert_eq!(&plot.to_base64(), encoded);
        let text = String::from_utf8(plot.bytes).unwrap();
        assert!(text.contains("Fruits - Forecast"));
    }
}

#[test]
fn test_29_points_is_insufficient_history() {
    let csv = create_daily_csv(1, 29);
    let doc = failure(default_pipeline().run(&load(&csv), &ForecastRequest::new("milk", 7, 10)));

    assert_eq!(doc.kind, "insufficient_history");
    assert_eq!(doc.stage, PipelineStage::Prepare);
    assert!(doc.error.contains("Minimum 30 days required, found 29"));
    assert!(doc.forecast.is_empty());
    assert_eq!(doc.recommendation.message, FAILURE_MESSAGE);
}

#[test]
fn test_30_points_proceeds() {
    let csv = create_daily_csv(1, 30);
    let doc = success(default_pipeline().run(&load(&csv), &ForecastRequest::new("milk", 7, 10)));
    assert_eq!(doc.forecast.len(), 7);
}

#[test]
fn test_repeated_runs_are_identical() {
    let csv = create_daily_csv(4, 75);
    let table = load(&csv);
    let request = ForecastRequest::new("snacks", 21, 40_000);
    let pipeline = default_pipeline();

    let first = success(pipeline.run(&table, &request));
    let second = success(pipeline.run(&table, &request));

    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.recommendation, second.recommendation);
    assert_eq!(first, second);
}

#[test]
fn test_unknown_product_lists_valid_names() {
    let csv = create_daily_csv(1, 40);
    let doc = failure(default_pipeline().run(&load(&csv), &ForecastRequest::new("soap", 7, 10)));

    assert_eq!(doc.kind, "unknown_product");
    for name in ["milk", "bread", "fruits", "snacks", "detergent"] {
        assert!(doc.error.contains(name), "error should list {}", name);
    }
}

#[test]
fn test_horizon_longer_than_test_cap() {
    let csv = create_daily_csv(5, 120);
    let outcome = default_pipeline()
        .try_run(&load(&csv), &ForecastRequest::new("DETERGENT", 60, 0))
        .unwrap();

    // Evaluation holds out 30 days, the returned forecast still covers 60.
    assert_eq!(outcome.forecast.len(), 60);
}

#[test]
fn test_config_file_drives_pipeline() {
    let mut config_file = NamedTempFile::new().unwrap();
    writeln!(config_file, "[evaluation]\nmin_history_days = 50").unwrap();
    let config = PipelineConfig::resolve(Some(config_file.path())).unwrap();

    let csv = create_daily_csv(1, 45);
    let doc = failure(
        ForecastPipeline::new(config)
            .unwrap()
            .run(&load(&csv), &ForecastRequest::new("milk", 7, 10)),
    );
    assert!(doc.error.contains("Minimum 50 days required, found 45"));
}
