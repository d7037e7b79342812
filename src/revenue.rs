//! Revenue estimation service
//!
//! A point-of-sale convenience estimate: ordinary least squares over the
//! log-transformed transaction history, trained once at process start and
//! then shared read-only. Deliberately unvalidated (no held-out split),
//! unlike the demand forecaster.

use crate::data::{DropStats, TransactionData};
use crate::error::Result;
use crate::features::RevenueFeatures;
use crate::models::linear::{LinearRegression, TrainedLinearRegression};
use crate::models::Regression;

/// Trained revenue estimator; immutable after construction and safe to
/// share across concurrent readers
#[derive(Debug, Clone)]
pub struct RevenueEstimator {
    features: RevenueFeatures,
    model: TrainedLinearRegression,
    drop_stats: DropStats,
}

impl RevenueEstimator {
    /// Train the estimator over the full transaction history.
    ///
    /// Fails when no usable rows survive cleaning; callers must treat that
    /// as a startup error for every estimator-dependent feature, since
    /// there is no fallback.
    pub fn fit(data: &TransactionData) -> Result<Self> {
        let (features, matrix, drop_stats) = RevenueFeatures::fit(data)?;
        let model = LinearRegression::fit(&matrix.x, &matrix.y)?;

        tracing::info!(
            rows = drop_stats.kept_rows(),
            unit_types = features.unit_types().len(),
            "revenue estimator trained"
        );

        Ok(Self {
            features,
            model,
            drop_stats,
        })
    }

    /// Expected monetary value for one order line.
    ///
    /// Absent or non-positive quantity and price fall back to the training
    /// medians; unit types never seen in training encode as the baseline
    /// category silently. Always positive: the log transform is reversed
    /// through the exponential.
    pub fn estimate(&self, quantity: Option<f64>, unit_price: Option<f64>, unit_type: &str) -> f64 {
        let row = self.features.encode(quantity, unit_price, unit_type);
        self.model.predict_row(&row).exp()
    }

    /// Unit types observed during training, sorted; the first is the
    /// baseline
    pub fn unit_types(&self) -> &[String] {
        self.features.unit_types()
    }

    /// Row counts from the cleaning pass
    pub fn drop_stats(&self) -> DropStats {
        self.drop_stats
    }
}
