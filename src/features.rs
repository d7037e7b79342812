//! Feature engineering for the revenue model
//!
//! Cleans raw transaction rows, encodes unit types as one-hot indicators
//! with a dropped baseline category, imputes missing prices with the
//! training median and log-transforms the numeric columns. The log
//! transform linearizes the multiplicative relationship between quantity,
//! price and total value.

use crate::data::{
    DropStats, TransactionData, QTY_COLUMN, TOTAL_VALUE_COLUMN, UNIT_PRICE_COLUMN,
    UNIT_TYPE_COLUMN,
};
use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2};
use statrs::statistics::{Data, OrderStatistics};
use std::collections::BTreeSet;

/// Design matrix and target vector produced by feature fitting
#[derive(Debug, Clone)]
pub struct TrainingMatrix {
    /// One row per surviving transaction
    pub x: Array2<f64>,
    /// log(total value) per row
    pub y: Array1<f64>,
}

/// Fitted feature encoding for the revenue model
///
/// Immutable after fitting; holds the unit-type vocabulary and the training
/// medians reused as defaults at inference time.
#[derive(Debug, Clone)]
pub struct RevenueFeatures {
    /// Observed unit types in sorted order; index 0 is the baseline
    /// category represented by all-zero indicators
    unit_types: Vec<String>,
    median_log_qty: f64,
    median_log_price: f64,
}

impl RevenueFeatures {
    /// Fit the encoding on historical transactions and build the training
    /// matrix.
    ///
    /// Rows participate only when quantity and total value coerce to
    /// strictly positive numbers; everything else is dropped and counted.
    /// Missing or non-positive unit prices are imputed with the median of
    /// the surviving prices.
    pub fn fit(data: &TransactionData) -> Result<(Self, TrainingMatrix, DropStats)> {
        data.require_columns(&[
            QTY_COLUMN,
            UNIT_PRICE_COLUMN,
            UNIT_TYPE_COLUMN,
            TOTAL_VALUE_COLUMN,
        ])?;

        let quantities = data.numeric_column(QTY_COLUMN)?;
        let prices = data.numeric_column(UNIT_PRICE_COLUMN)?;
        let unit_types = data.string_column(UNIT_TYPE_COLUMN)?;
        let totals = data.numeric_column(TOTAL_VALUE_COLUMN)?;

        let mut rows: Vec<CleanRow> = Vec::with_capacity(data.len());
        for i in 0..data.len() {
            if let (Some(qty), Some(total)) = (quantities[i], totals[i]) {
                if qty > 0.0 && total > 0.0 {
                    rows.push(CleanRow {
                        qty,
                        price: prices[i].filter(|p| *p > 0.0),
                        unit_type: unit_types[i].clone(),
                        total,
                    });
                }
            }
        }

        let stats = DropStats {
            total_rows: data.len(),
            dropped_rows: data.len() - rows.len(),
        };
        tracing::debug!(
            total = stats.total_rows,
            dropped = stats.dropped_rows,
            "cleaned revenue training rows"
        );

        if rows.is_empty() {
            return Err(ForecastError::InsufficientData(
                "no usable transaction rows: quantity and total value must be present and strictly positive"
                    .to_string(),
            ));
        }

        let known_prices: Vec<f64> = rows.iter().filter_map(|r| r.price).collect();
        if known_prices.is_empty() {
            return Err(ForecastError::InsufficientData(
                "every surviving row is missing a positive unit price; the median price cannot be imputed"
                    .to_string(),
            ));
        }
        let price_median = Data::new(known_prices).median();
        let qty_median = Data::new(rows.iter().map(|r| r.qty).collect::<Vec<f64>>()).median();

        let vocabulary: BTreeSet<String> = rows.iter().filter_map(|r| r.unit_type.clone()).collect();

        let features = Self {
            unit_types: vocabulary.into_iter().collect(),
            median_log_qty: qty_median.ln(),
            median_log_price: price_median.ln(),
        };

        let mut x = Array2::zeros((rows.len(), features.width()));
        let mut y = Array1::zeros(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let encoded = features.encode_opt(
                Some(row.qty),
                Some(row.price.unwrap_or(price_median)),
                row.unit_type.as_deref(),
            );
            for (j, value) in encoded.iter().enumerate() {
                x[[i, j]] = *value;
            }
            y[i] = row.total.ln();
        }

        Ok((features, TrainingMatrix { x, y }, stats))
    }

    /// Width of an encoded feature row: log quantity, log price, and one
    /// indicator per non-baseline unit type
    pub fn width(&self) -> usize {
        2 + self.unit_types.len().saturating_sub(1)
    }

    /// Unit types observed during training, sorted; the first is the
    /// baseline
    pub fn unit_types(&self) -> &[String] {
        &self.unit_types
    }

    /// Training medians in log space, (quantity, price)
    pub fn log_medians(&self) -> (f64, f64) {
        (self.median_log_qty, self.median_log_price)
    }

    /// Encode one inference request.
    ///
    /// Absent or non-positive quantity and price fall back to the training
    /// medians in log space. Unit types outside the vocabulary, and the
    /// baseline itself, encode as all-zero indicators.
    pub fn encode(&self, qty: Option<f64>, price: Option<f64>, unit_type: &str) -> Vec<f64> {
        self.encode_opt(qty, price, Some(unit_type))
    }

    fn encode_opt(&self, qty: Option<f64>, price: Option<f64>, unit_type: Option<&str>) -> Vec<f64> {
        let log_qty = qty
            .filter(|v| *v > 0.0)
            .map(f64::ln)
            .unwrap_or(self.median_log_qty);
        let log_price = price
            .filter(|v| *v > 0.0)
            .map(f64::ln)
            .unwrap_or(self.median_log_price);

        let mut row = vec![0.0; self.width()];
        row[0] = log_qty;
        row[1] = log_price;

        if let Some(unit) = unit_type {
            if let Some(position) = self.unit_types.iter().position(|u| u == unit) {
                if position > 0 {
                    row[1 + position] = 1.0;
                }
            }
        }

        row
    }
}

#[derive(Debug, Clone)]
struct CleanRow {
    qty: f64,
    price: Option<f64>,
    unit_type: Option<String>,
    total: f64,
}
