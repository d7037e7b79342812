//! Transaction dataset handling
//!
//! Wraps a polars DataFrame holding raw sales order records and exposes
//! lenient, type-coercing column access. Unparseable cells become `None`
//! and are dropped (and counted) by the consumers, never a hard error.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Order date column, recognized case-sensitively
pub const ORDER_DATE_COLUMN: &str = "ORDER_DATE";
/// Order quantity column
pub const QTY_COLUMN: &str = "QTY";
/// Unit price column
pub const UNIT_PRICE_COLUMN: &str = "UNIT_PRICE";
/// Unit type column (categorical, e.g. "pcs", "stell", "paket")
pub const UNIT_TYPE_COLUMN: &str = "UNIT_TYPE";
/// Transaction total value column
pub const TOTAL_VALUE_COLUMN: &str = "TOTAL_VALUE";

/// Accepted string date formats, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Counts of rows discarded during a cleaning step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropStats {
    /// Rows in the raw dataset
    pub total_rows: usize,
    /// Rows dropped because a required value was missing or unusable
    pub dropped_rows: usize,
}

impl DropStats {
    /// Rows that survived cleaning
    pub fn kept_rows(&self) -> usize {
        self.total_rows - self.dropped_rows
    }
}

/// Tabular sales order data backing both the revenue estimator and the
/// demand forecaster
#[derive(Debug, Clone)]
pub struct TransactionData {
    df: DataFrame,
}

impl TransactionData {
    /// Load transaction data from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Ok(Self { df })
    }

    /// Wrap an existing DataFrame
    pub fn from_dataframe(df: DataFrame) -> Self {
        Self { df }
    }

    /// Build a dataset with order dates and quantities, the minimum input
    /// for demand forecasting
    pub fn from_orders(dates: Vec<&str>, quantities: Vec<f64>) -> Result<Self> {
        let df = DataFrame::new(vec![
            Series::new(ORDER_DATE_COLUMN, dates),
            Series::new(QTY_COLUMN, quantities),
        ])?;

        Ok(Self { df })
    }

    /// Build a dataset with the full sales columns used by revenue
    /// estimation
    pub fn from_sales(
        quantities: Vec<Option<f64>>,
        unit_prices: Vec<Option<f64>>,
        unit_types: Vec<&str>,
        total_values: Vec<Option<f64>>,
    ) -> Result<Self> {
        let df = DataFrame::new(vec![
            Series::new(QTY_COLUMN, quantities),
            Series::new(UNIT_PRICE_COLUMN, unit_prices),
            Series::new(UNIT_TYPE_COLUMN, unit_types),
            Series::new(TOTAL_VALUE_COLUMN, total_values),
        ])?;

        Ok(Self { df })
    }

    /// Get the underlying DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Check whether the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Verify that every required column is present, reporting all missing
    /// names at once
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let names = self.df.get_column_names();
        let missing: Vec<String> = required
            .iter()
            .copied()
            .filter(|name| !names.contains(name))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ForecastError::MissingColumns { missing })
        }
    }

    /// Get a column as numeric values, coercing leniently: numeric dtypes
    /// convert directly, strings are parsed, anything else becomes `None`
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let col = self.column(name)?;

        let values = match col.dtype() {
            DataType::Float64 => col.f64().unwrap().into_iter().collect(),
            DataType::Float32 => col
                .f32()
                .unwrap()
                .into_iter()
                .map(|v| v.map(|v| v as f64))
                .collect(),
            DataType::Int64 => col
                .i64()
                .unwrap()
                .into_iter()
                .map(|v| v.map(|v| v as f64))
                .collect(),
            DataType::Int32 => col
                .i32()
                .unwrap()
                .into_iter()
                .map(|v| v.map(|v| v as f64))
                .collect(),
            DataType::UInt64 => col
                .u64()
                .unwrap()
                .into_iter()
                .map(|v| v.map(|v| v as f64))
                .collect(),
            DataType::UInt32 => col
                .u32()
                .unwrap()
                .into_iter()
                .map(|v| v.map(|v| v as f64))
                .collect(),
            DataType::Utf8 => col
                .utf8()
                .unwrap()
                .into_iter()
                .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
                .collect(),
            other => {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' has unsupported dtype {:?} for numeric coercion",
                    name, other
                )))
            }
        };

        Ok(values)
    }

    /// Get a categorical column as strings
    pub fn string_column(&self, name: &str) -> Result<Vec<Option<String>>> {
        let col = self.column(name)?;

        match col.dtype() {
            DataType::Utf8 => Ok(col
                .utf8()
                .unwrap()
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect()),
            other => Err(ForecastError::DataError(format!(
                "Column '{}' has dtype {:?}, expected strings",
                name, other
            ))),
        }
    }

    /// Get a column as calendar dates. String cells are parsed against the
    /// accepted formats; unparseable cells become `None`
    pub fn date_column(&self, name: &str) -> Result<Vec<Option<NaiveDate>>> {
        let col = self.column(name)?;

        match col.dtype() {
            DataType::Date => Ok(col
                .date()
                .unwrap()
                .into_iter()
                .map(|v| v.and_then(epoch_days_to_date))
                .collect()),
            DataType::Datetime(unit, _) => {
                let divisor = match unit {
                    TimeUnit::Nanoseconds => 86_400_000_000_000i64,
                    TimeUnit::Microseconds => 86_400_000_000i64,
                    TimeUnit::Milliseconds => 86_400_000i64,
                };
                Ok(col
                    .datetime()
                    .unwrap()
                    .into_iter()
                    .map(|v| v.and_then(|ts| epoch_days_to_date((ts.div_euclid(divisor)) as i32)))
                    .collect())
            }
            DataType::Utf8 => Ok(col
                .utf8()
                .unwrap()
                .into_iter()
                .map(|v| v.and_then(parse_date))
                .collect()),
            other => Err(ForecastError::DataError(format!(
                "Column '{}' has dtype {:?}, expected dates",
                name, other
            ))),
        }
    }

    fn column(&self, name: &str) -> Result<&Series> {
        self.df.column(name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", name, e))
        })
    }
}

fn epoch_days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(chrono::Duration::days(days as i64))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // Datetime strings carry the date in their leading characters
    let trimmed = raw.trim();
    let date_part = trimmed
        .split_once(' ')
        .or_else(|| trimmed.split_once('T'))
        .map_or(trimmed, |(d, _)| d);

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}
