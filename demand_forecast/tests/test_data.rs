use chrono::NaiveDate;
use demand_forecast::data::{RawSalesRow, SeriesPoint};
use demand_forecast::{extract_holidays, prepare_product_data, ForecastError, Product, SalesTable};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Weekly rows for stores 1 and 2, three weeks each
fn weekly_table() -> SalesTable {
    let rows = [
        (1, date(2010, 2, 5), 100.0),
        (1, date(2010, 2, 12), 120.0),
        (1, date(2010, 2, 19), 90.0),
        (2, date(2010, 2, 5), 5.0),
        (2, date(2010, 2, 12), 6.0),
        (2, date(2010, 2, 19), 7.0),
    ]
    .into_iter()
    .map(|(store, date, weekly_sales)| RawSalesRow {
        store,
        date,
        weekly_sales,
        holiday_flag: None,
    })
    .collect();
    SalesTable::new(rows, false)
}

#[test]
fn test_csv_with_holiday_column() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Store,Date,Weekly_Sales,Holiday_Flag,Temperature").unwrap();
    writeln!(file, "1,05-02-2010,1643690.90,0,42.31").unwrap();
    writeln!(file, "1,12-02-2010,1641957.44,1,38.51").unwrap();
    writeln!(file, "2,12-02-2010,2137809.50,1,38.49").unwrap();

    let table = SalesTable::from_csv_path(file.path()).unwrap();
    assert_eq!(table.len(), 3);
    assert!(table.has_holiday_flag());
    assert_eq!(table.rows()[1].date, date(2010, 2, 12));
    assert_eq!(table.rows()[1].holiday_flag, Some(true));

    let holidays = extract_holidays(&table).unwrap();
    assert_eq!(holidays.len(), 1);
}

#[test]
fn test_csv_without_holiday_column() {
    let csv = "Store,Date,Weekly_Sales\n3,2010-02-05,461622.22\n";
    let table = SalesTable::from_reader(csv.as_bytes()).unwrap();

    assert!(!table.has_holiday_flag());
    assert_eq!(table.rows()[0].holiday_flag, None);
    assert!(extract_holidays(&table).is_none());
}

#[rstest]
#[case("Store,Weekly_Sales\n1,10.0\n", "Date")]
#[case("Date,Weekly_Sales\n05-02-2010,10.0\n", "Store")]
#[case("Store,Date\n1,05-02-2010\n", "Weekly_Sales")]
fn test_csv_missing_column(#[case] csv: &str, #[case] column: &str) {
    let err = SalesTable::from_reader(csv.as_bytes()).unwrap_err();
    assert!(matches!(err, ForecastError::DataError(_)));
    assert!(err.to_string().contains(column));
}

#[test]
fn test_csv_bad_values() {
    let bad_date = "Store,Date,Weekly_Sales\n1,31-31-2010,10.0\n";
    let err = SalesTable::from_reader(bad_date.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("line 2"));

    let bad_sales = "Store,Date,Weekly_Sales\n1,05-02-2010,lots\n";
    let err = SalesTable::from_reader(bad_sales.as_bytes()).unwrap_err();
    assert_eq!(err.kind(), "csv");

    let missing = SalesTable::from_csv_path("/nonexistent/sales.csv").unwrap_err();
    assert_eq!(missing.kind(), "io");
}

#[rstest]
#[case("milk")]
#[case("Milk")]
#[case("MILK")]
#[case("  milk ")]
fn test_product_lookup_is_case_insensitive(#[case] name: &str) {
    assert_eq!(Product::lookup(name).unwrap(), Product::Milk);
    let series = prepare_product_data(&weekly_table(), name).unwrap();
    assert_eq!(series.len(), 15);
}

#[test]
fn test_unknown_product_is_rejected() {
    let err = prepare_product_data(&weekly_table(), "soap").unwrap_err();
    match err {
        ForecastError::UnknownProduct { name, valid } => {
            assert_eq!(name, "soap");
            assert_eq!(valid, vec!["milk", "bread", "fruits", "snacks", "detergent"]);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_series_is_gap_free_and_increasing() {
    let series = prepare_product_data(&weekly_table(), "milk").unwrap();

    assert_eq!(series.first_date(), Some(date(2010, 2, 5)));
    assert_eq!(series.last_date(), Some(date(2010, 2, 19)));
    assert!(series
        .points()
        .windows(2)
        .all(|w| w[1].ds == w[0].ds.succ_opt().unwrap()));

    // Each day carries its week's total.
    assert_eq!(series.points()[0], SeriesPoint { ds: date(2010, 2, 5), y: 100.0 });
    assert_eq!(series.points()[6].y, 100.0);
    assert_eq!(series.points()[7].y, 120.0);
    assert_eq!(series.points()[14].y, 90.0);
}

#[test]
fn test_rows_out_of_order_are_sorted() {
    let mut rows = weekly_table().rows().to_vec();
    rows.reverse();
    let shuffled = SalesTable::new(rows, false);

    assert_eq!(
        prepare_product_data(&shuffled, "bread").unwrap(),
        prepare_product_data(&weekly_table(), "bread").unwrap()
    );
}
