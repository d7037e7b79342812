//! Regression models backing the revenue and demand pipelines

use std::fmt::Debug;

pub mod gradient_boosting;
pub mod linear;

pub use gradient_boosting::{GradientBoosting, GradientBoostingParams, TrainedGradientBoosting};
pub use linear::{LinearRegression, TrainedLinearRegression};

/// A fitted regression model that scores one feature row at a time
pub trait Regression: Debug {
    /// Predicted target for a single feature row
    fn predict_row(&self, features: &[f64]) -> f64;
}
