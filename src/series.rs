//! Quarterly series construction
//!
//! Buckets raw order rows into calendar quarters, applies the outlier
//! policy and builds lagged feature rows for the autoregressive demand
//! model. Chronological ordering is an invariant of every step here.

use crate::data::{DropStats, TransactionData, ORDER_DATE_COLUMN, QTY_COLUMN};
use crate::error::Result;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Default lag depth: one year of quarters
pub const DEFAULT_LAG: usize = 4;
/// Default z-score magnitude beyond which a quarter is excluded from
/// training
pub const DEFAULT_OUTLIER_Z_THRESHOLD: f64 = 4.0;
/// Series at or below this length skip outlier filtering entirely; too
/// little data to estimate the variance reliably
pub const MIN_POINTS_FOR_FILTERING: usize = 5;

/// First day of the calendar quarter containing `date`
pub fn quarter_start(date: NaiveDate) -> NaiveDate {
    let month = (date.month0() / 3) * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap()
}

/// Start of the quarter immediately after `date`'s quarter
pub fn next_quarter_start(date: NaiveDate) -> NaiveDate {
    let start = quarter_start(date);
    let (year, month) = if start.month() >= 10 {
        (start.year() + 1, 1)
    } else {
        (start.year(), start.month() + 3)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

/// One aggregated quarter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuarterPoint {
    /// Quarter start date
    pub date: NaiveDate,
    /// Summed order quantity over the quarter
    pub quantity: f64,
}

/// Chronologically ordered sequence of aggregated quarters
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterlySeries {
    points: Vec<QuarterPoint>,
}

impl QuarterlySeries {
    /// Aggregate raw order rows into quarterly quantity sums.
    ///
    /// Rows with unparseable dates or non-numeric quantities are dropped
    /// and counted, not fatal. Missing required columns are.
    pub fn aggregate(data: &TransactionData) -> Result<(Self, DropStats)> {
        data.require_columns(&[ORDER_DATE_COLUMN, QTY_COLUMN])?;

        let dates = data.date_column(ORDER_DATE_COLUMN)?;
        let quantities = data.numeric_column(QTY_COLUMN)?;

        let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut kept = 0usize;
        for (date, quantity) in dates.iter().zip(quantities.iter()) {
            if let (Some(date), Some(quantity)) = (date, quantity) {
                *buckets.entry(quarter_start(*date)).or_insert(0.0) += quantity;
                kept += 1;
            }
        }

        let stats = DropStats {
            total_rows: data.len(),
            dropped_rows: data.len() - kept,
        };
        tracing::debug!(
            total = stats.total_rows,
            dropped = stats.dropped_rows,
            quarters = buckets.len(),
            "aggregated orders into quarters"
        );

        let points = buckets
            .into_iter()
            .map(|(date, quantity)| QuarterPoint { date, quantity })
            .collect();

        Ok((Self { points }, stats))
    }

    /// Build a series directly from (date, quantity) pairs; dates are
    /// normalized to quarter starts and sorted
    pub fn from_points(pairs: Vec<(NaiveDate, f64)>) -> Self {
        let mut points: Vec<QuarterPoint> = pairs
            .into_iter()
            .map(|(date, quantity)| QuarterPoint {
                date: quarter_start(date),
                quantity,
            })
            .collect();
        points.sort_by_key(|p| p.date);

        Self { points }
    }

    /// The aggregated quarters, oldest first
    pub fn points(&self) -> &[QuarterPoint] {
        &self.points
    }

    /// Number of quarters in the series
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check whether the series has no quarters
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Start date of the most recent quarter
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Quarterly quantities in chronological order
    pub fn quantities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.quantity).collect()
    }

    /// Exclude quarters whose standardized quantity deviates by
    /// `z_threshold` or more, returning the filtered series and the count
    /// of removed quarters.
    ///
    /// Series with `min_points` or fewer quarters are returned unchanged.
    /// The z-score uses the population standard deviation.
    pub fn filter_outliers(&self, z_threshold: f64, min_points: usize) -> (Self, usize) {
        if self.points.len() <= min_points {
            return (self.clone(), 0);
        }

        let quantities = self.quantities();
        let mean = quantities.iter().mean();
        let std_dev = quantities.iter().population_std_dev();
        if std_dev == 0.0 || !std_dev.is_finite() {
            return (self.clone(), 0);
        }

        let kept: Vec<QuarterPoint> = self
            .points
            .iter()
            .copied()
            .filter(|p| ((p.quantity - mean) / std_dev).abs() < z_threshold)
            .collect();
        let removed = self.points.len() - kept.len();
        if removed > 0 {
            tracing::info!(
                removed,
                threshold = z_threshold,
                "excluded outlier quarters from training"
            );
        }

        (Self { points: kept }, removed)
    }

    /// Build lagged feature rows: row t carries the quantities of the
    /// `lag` preceding quarters as features, most recent first, with the
    /// quarter's own quantity as the label. The first `lag` quarters have
    /// insufficient history and produce no rows.
    pub fn lagged_rows(&self, lag: usize) -> Vec<LaggedRow> {
        let mut rows = Vec::with_capacity(self.points.len().saturating_sub(lag));
        for i in lag..self.points.len() {
            let features: Vec<f64> = (1..=lag).map(|k| self.points[i - k].quantity).collect();
            rows.push(LaggedRow {
                date: self.points[i].date,
                features,
                quantity: self.points[i].quantity,
            });
        }

        rows
    }
}

/// One model-ready row derived from the quarterly series
#[derive(Debug, Clone, PartialEq)]
pub struct LaggedRow {
    /// Quarter the label belongs to
    pub date: NaiveDate,
    /// Quantities of the preceding quarters, lag 1 first
    pub features: Vec<f64>,
    /// The quarter's own aggregate quantity
    pub quantity: f64,
}
