//! Error metrics for forecast validation

use crate::error::{ForecastError, Result};

/// Mean absolute error between predicted and actual values
pub fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_lengths(predicted, actual)?;

    let sum: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).abs())
        .sum();

    Ok(sum / predicted.len() as f64)
}

/// Mean squared error between predicted and actual values
pub fn mean_squared_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_lengths(predicted, actual)?;

    let sum: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).powi(2))
        .sum();

    Ok(sum / predicted.len() as f64)
}

/// Root mean squared error between predicted and actual values
pub fn rmse(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    Ok(mean_squared_error(predicted, actual)?.sqrt())
}

fn check_lengths(predicted: &[f64], actual: &[f64]) -> Result<()> {
    if predicted.len() != actual.len() || predicted.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "predicted and actual values must have the same non-zero length".to_string(),
        ));
    }

    Ok(())
}
