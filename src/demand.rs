//! Quarterly demand forecasting pipeline
//!
//! One run takes raw order data through aggregation, outlier filtering,
//! lag construction, a chronological train/test split, gradient boosted
//! fitting on log1p labels, held-out validation and iterative recursive
//! forecasting. The model is scoped to the run and discarded with it:
//! every forecast re-trains from scratch, trading latency for freedom
//! from stale-model bugs.

use crate::data::{DropStats, TransactionData};
use crate::error::{ForecastError, Result};
use crate::metrics;
use crate::models::gradient_boosting::{GradientBoosting, GradientBoostingParams};
use crate::models::Regression;
use crate::report::{ForecastReport, ValidationPoint, ValidationReport};
use crate::series::{
    next_quarter_start, LaggedRow, QuarterlySeries, DEFAULT_LAG, DEFAULT_OUTLIER_Z_THRESHOLD,
    MIN_POINTS_FOR_FILTERING,
};
use chrono::NaiveDate;
use ndarray::{Array1, Array2};

/// Default forecast horizon: four quarters, one year ahead
pub const DEFAULT_HORIZON: usize = 4;

/// Tunable parameters of the demand pipeline
#[derive(Debug, Clone)]
pub struct ForecastParams {
    /// Lag depth in quarters
    pub lag: usize,
    /// Fraction of lagged rows held out for validation
    pub test_fraction: f64,
    /// Z-score magnitude beyond which a quarter is excluded from training
    pub outlier_z_threshold: f64,
    /// Series at or below this length skip outlier filtering
    pub min_points_for_filtering: usize,
    /// Gradient boosting hyperparameters
    pub model: GradientBoostingParams,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            lag: DEFAULT_LAG,
            test_fraction: 0.2,
            outlier_z_threshold: DEFAULT_OUTLIER_Z_THRESHOLD,
            min_points_for_filtering: MIN_POINTS_FOR_FILTERING,
            model: GradientBoostingParams::default(),
        }
    }
}

impl ForecastParams {
    fn validate(&self) -> Result<()> {
        if self.lag == 0 {
            return Err(ForecastError::InvalidParameter(
                "lag depth must be at least 1".to_string(),
            ));
        }
        if self.test_fraction <= 0.0 || self.test_fraction >= 1.0 {
            return Err(ForecastError::InvalidParameter(
                "test_fraction must be strictly between 0 and 1".to_string(),
            ));
        }
        if self.outlier_z_threshold <= 0.0 {
            return Err(ForecastError::InvalidParameter(
                "outlier_z_threshold must be positive".to_string(),
            ));
        }
        self.model.validate()
    }
}

/// Everything a completed forecasting run produces
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    /// The aggregated quarterly series, outliers included, for trend
    /// display
    pub history: QuarterlySeries,
    /// Quarters excluded from training by the outlier filter
    pub outliers_removed: usize,
    /// Row counts from the cleaning pass
    pub drop_stats: DropStats,
    /// Held-out validation summary
    pub validation: ValidationReport,
    /// Combined actual / predicted / forecast table
    pub report: ForecastReport,
}

/// Demand forecaster; stateless between runs
#[derive(Debug, Clone, Default)]
pub struct DemandForecaster {
    params: ForecastParams,
}

impl DemandForecaster {
    /// Forecaster with default parameters
    pub fn new() -> Self {
        Self {
            params: ForecastParams::default(),
        }
    }

    /// Forecaster with explicit, validated parameters
    pub fn with_params(params: ForecastParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Run the full pipeline and forecast `horizon` future quarters
    pub fn run(&self, data: &TransactionData, horizon: usize) -> Result<ForecastOutcome> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be at least one quarter".to_string(),
            ));
        }

        let (history, drop_stats) = QuarterlySeries::aggregate(data)?;
        let (filtered, outliers_removed) = history.filter_outliers(
            self.params.outlier_z_threshold,
            self.params.min_points_for_filtering,
        );

        let rows = filtered.lagged_rows(self.params.lag);
        if rows.is_empty() {
            return Err(ForecastError::InsufficientData(format!(
                "need at least {} quarters of history after cleaning: lag depth {} plus one label quarter",
                self.params.lag + 1,
                self.params.lag
            )));
        }

        // Chronological split; the test partition is the most recent slice
        let test_size = ((rows.len() as f64 * self.params.test_fraction).ceil() as usize).max(1);
        let train_size = rows.len() - test_size;
        if train_size == 0 {
            return Err(ForecastError::InsufficientData(format!(
                "need at least two lagged quarters to hold out a test partition, got {}",
                rows.len()
            )));
        }

        let labels: Vec<f64> = rows.iter().map(|r| r.quantity.ln_1p()).collect();
        let x_train = design_matrix(&rows[..train_size]);
        let y_train = Array1::from_vec(labels[..train_size].to_vec());

        let model = GradientBoosting::new(self.params.model.clone())?.fit(&x_train, &y_train)?;

        // Held-out error, computed and reported in log1p space
        let test_predictions: Vec<f64> = rows[train_size..]
            .iter()
            .map(|row| model.predict_row(&row.features))
            .collect();
        let rmse_log = metrics::rmse(&test_predictions, &labels[train_size..])?;
        tracing::info!(
            rmse_log,
            train = train_size,
            test = test_size,
            "demand model validated"
        );

        let validation_points: Vec<ValidationPoint> = rows[train_size..]
            .iter()
            .zip(test_predictions.iter())
            .map(|(row, prediction)| ValidationPoint {
                date: row.date,
                actual: row.quantity,
                predicted: prediction.exp_m1(),
            })
            .collect();

        // Continuous in-sample series over every lagged row, for charting
        let predicted: Vec<(NaiveDate, f64)> = rows
            .iter()
            .map(|row| (row.date, model.predict_row(&row.features).exp_m1()))
            .collect();

        let forecast = self.roll_forward(&model, &filtered, horizon);

        let actual: Vec<(NaiveDate, f64)> =
            rows.iter().map(|row| (row.date, row.quantity)).collect();
        let report = ForecastReport::assemble(&actual, &predicted, &forecast);

        Ok(ForecastOutcome {
            history,
            outliers_removed,
            drop_stats,
            validation: ValidationReport {
                rmse_log,
                points: validation_points,
            },
            report,
        })
    }

    /// Iterative recursive forecasting: each step predicts from the most
    /// recent `lag` known-or-predicted quantities, clamps negatives to
    /// zero and slides the window one quarter forward. No re-training
    /// between steps, so uncertainty compounds with the horizon.
    fn roll_forward(
        &self,
        model: &dyn Regression,
        filtered: &QuarterlySeries,
        horizon: usize,
    ) -> Vec<(NaiveDate, f64)> {
        let points = filtered.points();
        let mut window: Vec<f64> = (0..self.params.lag)
            .map(|k| points[points.len() - 1 - k].quantity)
            .collect();

        let mut date = filtered
            .last_date()
            .expect("filtered series is non-empty when lagged rows exist");
        let mut forecast = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            date = next_quarter_start(date);
            let predicted = model.predict_row(&window).exp_m1().max(0.0);
            forecast.push((date, predicted));

            window.pop();
            window.insert(0, predicted);
        }

        forecast
    }
}

fn design_matrix(rows: &[LaggedRow]) -> Array2<f64> {
    let lag = rows.first().map_or(0, |r| r.features.len());
    let mut x = Array2::zeros((rows.len(), lag));
    for (i, row) in rows.iter().enumerate() {
        for (j, value) in row.features.iter().enumerate() {
            x[[i, j]] = *value;
        }
    }

    x
}
