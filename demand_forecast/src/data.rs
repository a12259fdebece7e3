//! Sales data handling for forecasting
//!
//! Raw rows arrive as weekly store sales. [`prepare_product_data`] turns them
//! into a gap-free daily [`ProductSeries`] for one product.

use crate::catalog::{Product, StoreId};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const STORE_COLUMN: &str = "Store";
const DATE_COLUMN: &str = "Date";
const SALES_COLUMN: &str = "Weekly_Sales";
const HOLIDAY_COLUMN: &str = "Holiday_Flag";

/// Date layouts accepted in the `Date` column, day-first layouts first
const DATE_FORMATS: [&str; 3] = ["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];

/// One weekly sales observation for one store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSalesRow {
    /// Store the sales were recorded at
    pub store: StoreId,
    /// Week date
    pub date: NaiveDate,
    /// Total sales for the week
    pub weekly_sales: f64,
    /// Holiday marker, `None` when the source has no holiday column
    pub holiday_flag: Option<bool>,
}

/// CSV record as it appears on disk
#[derive(Debug, Deserialize)]
struct CsvSalesRecord {
    #[serde(rename = "Store")]
    store: StoreId,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Weekly_Sales")]
    weekly_sales: f64,
    #[serde(rename = "Holiday_Flag", default)]
    holiday_flag: Option<String>,
}

/// Immutable set of raw sales rows
#[derive(Debug, Clone, Default)]
pub struct SalesTable {
    rows: Vec<RawSalesRow>,
    has_holiday_flag: bool,
}

impl SalesTable {
    /// Create a table from rows already in memory
    pub fn new(rows: Vec<RawSalesRow>, has_holiday_flag: bool) -> Self {
        Self {
            rows,
            has_holiday_flag,
        }
    }

    /// Load sales rows from a CSV file
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load sales rows from any CSV source
    ///
    /// Requires `Store`, `Date` and `Weekly_Sales` columns. `Holiday_Flag` is
    /// optional and other columns are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        for required in [STORE_COLUMN, DATE_COLUMN, SALES_COLUMN] {
            if !headers.iter().any(|h| h == required) {
                return Err(ForecastError::DataError(format!(
                    "Missing required column '{}'",
                    required
                )));
            }
        }
        let has_holiday_flag = headers.iter().any(|h| h == HOLIDAY_COLUMN);

        let mut rows = Vec::new();
        for (index, record) in csv_reader.deserialize::<CsvSalesRecord>().enumerate() {
            let record = record?;
            // Header is line 1.
            let line = index + 2;
            let date = parse_sales_date(&record.date).ok_or_else(|| {
                ForecastError::DataError(format!(
                    "Unparseable date '{}' on line {}",
                    record.date, line
                ))
            })?;
            let holiday_flag = if has_holiday_flag {
                Some(parse_flag(record.holiday_flag.as_deref(), line)?)
            } else {
                None
            };

            rows.push(RawSalesRow {
                store: record.store,
                date,
                weekly_sales: record.weekly_sales,
                holiday_flag,
            });
        }

        debug!(rows = rows.len(), has_holiday_flag, "loaded sales table");
        Ok(Self::new(rows, has_holiday_flag))
    }

    /// All rows in source order
    pub fn rows(&self) -> &[RawSalesRow] {
        &self.rows
    }

    /// Whether the source carried a holiday flag column
    pub fn has_holiday_flag(&self) -> bool {
        self.has_holiday_flag
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse a date in any of the accepted layouts
pub fn parse_sales_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text.trim(), format).ok())
}

fn parse_flag(value: Option<&str>, line: usize) -> Result<bool> {
    match value.map(str::trim).unwrap_or("") {
        "" | "0" | "0.0" | "false" | "False" => Ok(false),
        "1" | "1.0" | "true" | "True" => Ok(true),
        other => Err(ForecastError::DataError(format!(
            "Invalid holiday flag '{}' on line {}",
            other, line
        ))),
    }
}

/// One day of aggregated demand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Calendar day
    pub ds: NaiveDate,
    /// Aggregated value for the day
    pub y: f64,
}

/// Daily demand history for one product, ordered by date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductSeries {
    points: Vec<SeriesPoint>,
}

impl ProductSeries {
    /// Create a series, checking that dates strictly increase
    pub fn new(points: Vec<SeriesPoint>) -> Result<Self> {
        if let Some(pair) = points.windows(2).find(|w| w[0].ds >= w[1].ds) {
            return Err(ForecastError::DataError(format!(
                "Series dates must be strictly increasing ({} followed by {})",
                pair[0].ds, pair[1].ds
            )));
        }

        Ok(Self { points })
    }

    /// Create a daily series starting at `start`
    pub fn from_daily_values(start: NaiveDate, values: &[f64]) -> Self {
        let points = start
            .iter_days()
            .zip(values)
            .map(|(ds, &y)| SeriesPoint { ds, y })
            .collect();
        Self { points }
    }

    /// All points
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Dates of all points
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.ds).collect()
    }

    /// Values of all points
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    /// First date in the series
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.ds)
    }

    /// Last date in the series
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.ds)
    }

    /// Split off the last `tail` points
    ///
    /// Returns `(head, tail)`. A `tail` longer than the series leaves the
    /// head empty.
    pub fn split_tail(&self, tail: usize) -> (ProductSeries, ProductSeries) {
        let at = self.points.len().saturating_sub(tail);
        let (head, rest) = self.points.split_at(at);
        (
            ProductSeries {
                points: head.to_vec(),
            },
            ProductSeries {
                points: rest.to_vec(),
            },
        )
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Build the daily demand series for a product name
///
/// The name is matched case-insensitively against the catalog.
pub fn prepare_product_data(table: &SalesTable, product_name: &str) -> Result<ProductSeries> {
    let product = Product::lookup(product_name)?;
    product_series(table, product)
}

/// Build the daily demand series for a catalog product
///
/// Each store's weekly rows are forward-filled onto every calendar day up to
/// its next row, so each day carries that week's total. Days are then summed
/// across the product's stores; days inside the overall range with no store
/// data count as zero.
pub fn product_series(table: &SalesTable, product: Product) -> Result<ProductSeries> {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for &store in product.store_ids() {
        let weekly: Vec<(NaiveDate, f64)> = table
            .rows()
            .iter()
            .filter(|row| row.store == store)
            .map(|row| (row.date, row.weekly_sales))
            .collect();

        for (date, value) in forward_fill_daily(weekly) {
            *daily.entry(date).or_insert(0.0) += value;
        }
    }

    let points = match (daily.keys().next(), daily.keys().next_back()) {
        (Some(&first), Some(&last)) => first
            .iter_days()
            .take_while(|day| *day <= last)
            .map(|ds| SeriesPoint {
                ds,
                y: daily.get(&ds).copied().unwrap_or(0.0),
            })
            .collect(),
        _ => Vec::new(),
    };

    debug!(product = %product, days = points.len(), "prepared product series");
    ProductSeries::new(points)
}

/// Resample irregular observations to daily frequency by forward fill
///
/// Rows are sorted by date; when a date repeats the later row wins.
fn forward_fill_daily(mut observations: Vec<(NaiveDate, f64)>) -> Vec<(NaiveDate, f64)> {
    observations.sort_by_key(|(date, _)| *date);

    let mut deduped: Vec<(NaiveDate, f64)> = Vec::with_capacity(observations.len());
    for (date, value) in observations {
        match deduped.last_mut() {
            Some(last) if last.0 == date => last.1 = value,
            _ => deduped.push((date, value)),
        }
    }

    let mut daily = Vec::new();
    for pair in deduped.windows(2) {
        let (start, value) = pair[0];
        let next = pair[1].0;
        daily.extend(
            start
                .iter_days()
                .take_while(|day| *day < next)
                .map(|day| (day, value)),
        );
    }
    if let Some(&last) = deduped.last() {
        daily.push(last);
    }

    daily
}
