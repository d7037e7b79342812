//! # Sales Forecast
//!
//! A Rust library for revenue estimation and quarterly demand forecasting
//! over sales order data.
//!
//! ## Features
//!
//! - Lenient tabular ingestion (CSV or existing DataFrames) with counted
//!   row dropping
//! - A point-of-sale revenue estimator: ordinary least squares over log
//!   quantity, log price and one-hot unit types, trained once at startup
//! - A quarterly demand forecaster: calendar-quarter aggregation, z-score
//!   outlier filtering, lag features, gradient boosted trees on log1p
//!   labels and iterative recursive forecasting
//! - Held-out validation and combined actual/predicted/forecast reporting
//!   with CSV and JSON exports
//!
//! ## Quick Start
//!
//! ```no_run
//! use sales_forecast::data::TransactionData;
//! use sales_forecast::demand::DemandForecaster;
//! use sales_forecast::revenue::RevenueEstimator;
//!
//! fn main() -> sales_forecast::error::Result<()> {
//!     let history = TransactionData::from_csv("orders.csv")?;
//!
//!     // Built once per process; construction failure must abort the
//!     // estimator-dependent feature.
//!     let estimator = RevenueEstimator::fit(&history)?;
//!     let revenue = estimator.estimate(Some(100.0), Some(10_000.0), "pcs");
//!     println!("expected revenue: {:.0}", revenue);
//!
//!     // Re-trained on every run; the result is a plain value.
//!     let outcome = DemandForecaster::new().run(&history, 4)?;
//!     println!("held-out RMSE (log1p): {:.4}", outcome.validation.rmse_log);
//!     println!("{}", outcome.report.to_csv()?);
//!
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod demand;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod report;
pub mod revenue;
pub mod series;

// Re-export commonly used types
pub use crate::data::{DropStats, TransactionData};
pub use crate::demand::{DemandForecaster, ForecastOutcome, ForecastParams, DEFAULT_HORIZON};
pub use crate::error::{ForecastError, Result};
pub use crate::report::{ForecastReport, ValidationReport};
pub use crate::revenue::RevenueEstimator;
pub use crate::series::QuarterlySeries;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
