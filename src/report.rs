//! Assembled forecast tables and exports
//!
//! Purely derived, read-only views over a completed forecasting run: the
//! combined actual / in-sample predicted / future forecast table, the
//! compact future-only table, and CSV / JSON exports.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// One held-out quarter with its actual and predicted quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationPoint {
    /// Quarter start date
    pub date: NaiveDate,
    /// Observed aggregate quantity
    pub actual: f64,
    /// Model prediction, back-transformed from log1p space
    pub predicted: f64,
}

/// Held-out validation summary for one forecasting run
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Root mean squared error over the test partition, in log1p space
    pub rmse_log: f64,
    /// Actual-vs-predicted overlay over the test partition
    pub points: Vec<ValidationPoint>,
}

/// One row of the combined history-and-future table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportRow {
    /// Quarter start date
    pub date: NaiveDate,
    /// Observed quantity, present for historical quarters
    pub actual: Option<f64>,
    /// In-sample model prediction, present for historical lagged quarters
    pub predicted: Option<f64>,
    /// Out-of-sample forecast, present for future quarters
    pub forecast: Option<f64>,
}

impl ReportRow {
    /// The continuous model series for charting: the in-sample prediction
    /// where one exists, otherwise the future forecast
    pub fn model_output(&self) -> Option<f64> {
        self.predicted.or(self.forecast)
    }
}

/// Future-only forecast row with the quantity rounded to whole units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FutureRow {
    /// Quarter start date
    pub date: NaiveDate,
    /// Forecasted quantity, rounded
    pub forecast: i64,
}

/// Combined forecast table spanning history and future, sorted by date
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    rows: Vec<ReportRow>,
}

impl ForecastReport {
    /// Merge the actual, in-sample predicted and future forecasted series
    /// by date
    pub fn assemble(
        actual: &[(NaiveDate, f64)],
        predicted: &[(NaiveDate, f64)],
        forecast: &[(NaiveDate, f64)],
    ) -> Self {
        let mut merged: BTreeMap<NaiveDate, ReportRow> = BTreeMap::new();

        for &(date, value) in actual {
            merged.entry(date).or_insert_with(|| blank_row(date)).actual = Some(value);
        }
        for &(date, value) in predicted {
            merged
                .entry(date)
                .or_insert_with(|| blank_row(date))
                .predicted = Some(value);
        }
        for &(date, value) in forecast {
            merged
                .entry(date)
                .or_insert_with(|| blank_row(date))
                .forecast = Some(value);
        }

        Self {
            rows: merged.into_values().collect(),
        }
    }

    /// All rows, sorted chronologically
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// The future-only table, quantities rounded to whole units
    pub fn future_rows(&self) -> Vec<FutureRow> {
        self.rows
            .iter()
            .filter_map(|row| {
                row.forecast.map(|value| FutureRow {
                    date: row.date,
                    forecast: value.round() as i64,
                })
            })
            .collect()
    }

    /// Downloadable CSV of the combined table
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "date",
            "actual_qty",
            "predicted_qty",
            "forecasted_qty",
            "model_output",
        ])?;

        for row in &self.rows {
            writer.write_record([
                row.date.to_string(),
                format_cell(row.actual),
                format_cell(row.predicted),
                format_cell(row.forecast),
                format_cell(row.model_output().map(f64::round)),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ForecastError::CsvError(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ForecastError::CsvError(e.to_string()))
    }

    /// JSON rendering of the combined table
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn blank_row(date: NaiveDate) -> ReportRow {
    ReportRow {
        date,
        actual: None,
        predicted: None,
        forecast: None,
    }
}

fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
