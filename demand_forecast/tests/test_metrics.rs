use approx::assert_relative_eq;
use chrono::NaiveDate;
use demand_forecast::metrics::accuracy_metrics;
use demand_forecast::{evaluate_forecast, ForecastPoint, ForecastSeries, ProductSeries};
use demand_forecast::{recommend_stock_action, Recommendation};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2012, 10, 1).unwrap()
}

fn forecast(values: &[f64]) -> ForecastSeries {
    ForecastSeries::new(
        start()
            .iter_days()
            .zip(values)
            .map(|(ds, &yhat)| ForecastPoint {
                ds,
                yhat,
                yhat_lower: yhat * 0.9,
                yhat_upper: yhat * 1.1,
            })
            .collect(),
    )
}

#[test]
fn test_regression_metrics() {
    let actual = ProductSeries::from_daily_values(start(), &[10.0, 20.0, 30.0]);
    let metrics = evaluate_forecast(&actual, &forecast(&[12.0, 18.0, 33.0])).unwrap();

    assert_eq!(metrics.mae, 2.33);
    assert_eq!(metrics.rmse, 2.38);
    assert_eq!(metrics.mape, 13.33);
    assert_eq!(metrics.accuracy, 86.67);
}

#[test]
fn test_perfect_forecast() {
    let values = [5.0, 6.0, 7.0, 8.0];
    let metrics = accuracy_metrics(&values, &values).unwrap();

    assert_eq!(metrics.mae, 0.0);
    assert_eq!(metrics.rmse, 0.0);
    assert_eq!(metrics.mape, 0.0);
    assert_eq!(metrics.accuracy, 100.0);
}

#[test]
fn test_mismatched_lengths() {
    assert!(accuracy_metrics(&[1.0, 2.0], &[1.0]).is_err());
    assert!(accuracy_metrics(&[], &[]).is_err());
}

#[test]
fn test_metrics_are_rounded_to_cents() {
    let metrics = accuracy_metrics(&[3.0], &[2.0]).unwrap();
    assert_relative_eq!(metrics.mape, 33.33);
    assert_relative_eq!(metrics.accuracy, 66.67);
}

#[test]
fn test_recommendation_thresholds() {
    let tail = forecast(&[250.0, 250.0, 250.0, 250.0]);

    assert_eq!(recommend_stock_action(&tail, 1000, 30), Recommendation::Balanced);
    assert_eq!(
        recommend_stock_action(&tail, 900, 30),
        Recommendation::Reorder { units: 100 }
    );
    assert_eq!(
        recommend_stock_action(&tail, 1035, 30),
        Recommendation::Excess { units: 35 }
    );
    assert_eq!(recommend_stock_action(&tail, 1020, 30), Recommendation::Balanced);
}
