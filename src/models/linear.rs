//! Ordinary least squares regression
//!
//! Fitted through the normal equations with an intercept term; the
//! symmetric system is solved by Gaussian elimination with partial
//! pivoting. Small fixed feature counts make this exact approach cheap.

use crate::error::{ForecastError, Result};
use crate::models::Regression;
use ndarray::{Array1, Array2};

/// Ordinary least squares model
#[derive(Debug, Clone, Default)]
pub struct LinearRegression;

/// Trained ordinary least squares model
#[derive(Debug, Clone)]
pub struct TrainedLinearRegression {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearRegression {
    /// Fit coefficients over the full dataset; no train/test split is
    /// performed here
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedLinearRegression> {
        let n = x.nrows();
        if n == 0 {
            return Err(ForecastError::DataError(
                "cannot fit a regression on an empty dataset".to_string(),
            ));
        }
        if n != y.len() {
            return Err(ForecastError::DataError(format!(
                "feature rows ({}) don't match targets ({})",
                n,
                y.len()
            )));
        }

        // Normal equations over the design matrix augmented with an
        // implicit leading intercept column of ones.
        let cols = x.ncols() + 1;
        let mut xtx = Array2::<f64>::zeros((cols, cols));
        let mut xty = Array1::<f64>::zeros(cols);
        for k in 0..n {
            let value = |j: usize| if j == 0 { 1.0 } else { x[[k, j - 1]] };
            for i in 0..cols {
                xty[i] += value(i) * y[k];
                for j in 0..cols {
                    xtx[[i, j]] += value(i) * value(j);
                }
            }
        }

        let weights = solve(xtx, xty)?;

        Ok(TrainedLinearRegression {
            intercept: weights[0],
            coefficients: weights.iter().skip(1).copied().collect(),
        })
    }
}

impl TrainedLinearRegression {
    /// Fitted intercept
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Fitted coefficients, one per feature column
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl Regression for TrainedLinearRegression {
    fn predict_row(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.iter())
                .map(|(c, f)| c * f)
                .sum::<f64>()
    }
}

/// Gaussian elimination with partial pivoting
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();

    for i in 0..n {
        // Pivot on the largest remaining entry in the column
        let mut pivot_row = i;
        let mut pivot_value = a[[i, i]].abs();
        for k in (i + 1)..n {
            if a[[k, i]].abs() > pivot_value {
                pivot_value = a[[k, i]].abs();
                pivot_row = k;
            }
        }

        if pivot_row != i {
            for j in 0..n {
                let tmp = a[[i, j]];
                a[[i, j]] = a[[pivot_row, j]];
                a[[pivot_row, j]] = tmp;
            }
            b.swap(i, pivot_row);
        }

        let pivot = a[[i, i]];
        if pivot.abs() < 1e-12 {
            return Err(ForecastError::MathError(
                "singular system: features are collinear or constant".to_string(),
            ));
        }

        for k in (i + 1)..n {
            let factor = a[[k, i]] / pivot;
            for j in i..n {
                a[[k, j]] -= factor * a[[i, j]];
            }
            b[k] -= factor * b[i];
        }
    }

    // Back substitution
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[[i, j]] * x[j];
        }
        x[i] = sum / a[[i, i]];
    }

    Ok(x)
}
