//! Ridge-regularised least squares
//!
//! Solves `(X'X + diag(lambda)) beta = X'y` with a Cholesky factorisation.
//! Each column carries its own penalty, which is how the models express a
//! Gaussian prior per coefficient: a tight prior is a large penalty.

use crate::{MathError, Result};
use nalgebra::{DMatrix, DVector};

/// Least squares solver with a per-column L2 penalty
#[derive(Debug, Clone)]
pub struct RidgeRegression {
    penalties: Vec<f64>,
}

impl RidgeRegression {
    /// Create a solver for a design with one column per penalty
    pub fn new(penalties: Vec<f64>) -> Result<Self> {
        if penalties.is_empty() {
            return Err(MathError::InvalidInput(
                "At least one column penalty is required".to_string(),
            ));
        }

        if let Some(bad) = penalties.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(MathError::InvalidInput(format!(
                "Column penalties must be finite and non-negative, got {}",
                bad
            )));
        }

        Ok(Self { penalties })
    }

    /// Penalty for a Gaussian prior with the given scale
    ///
    /// `noise_scale` is the assumed observation noise on the scaled target.
    pub fn penalty_for_prior(noise_scale: f64, prior_scale: f64) -> Result<f64> {
        if prior_scale <= 0.0 || !prior_scale.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Prior scale must be positive, got {}",
                prior_scale
            )));
        }

        Ok((noise_scale / prior_scale).powi(2))
    }

    /// Fit coefficients for the given rows and target values
    pub fn fit(&self, rows: &[Vec<f64>], target: &[f64]) -> Result<Vec<f64>> {
        let n = rows.len();
        let p = self.penalties.len();

        if n == 0 {
            return Err(MathError::InsufficientData(
                "Cannot fit a regression without observations".to_string(),
            ));
        }

        if target.len() != n {
            return Err(MathError::InvalidInput(format!(
                "Target length ({}) doesn't match row count ({})",
                target.len(),
                n
            )));
        }

        if let Some(row) = rows.iter().find(|r| r.len() != p) {
            return Err(MathError::InvalidInput(format!(
                "Design row has {} columns, expected {}",
                row.len(),
                p
            )));
        }

        if rows.iter().flatten().chain(target).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Design and target must contain only finite values".to_string(),
            ));
        }

        let x = DMatrix::from_fn(n, p, |i, j| rows[i][j]);
        let y = DVector::from_column_slice(target);

        let mut gram = x.tr_mul(&x);
        for (j, penalty) in self.penalties.iter().enumerate() {
            gram[(j, j)] += penalty;
        }
        let rhs = x.tr_mul(&y);

        let cholesky = gram.cholesky().ok_or_else(|| {
            MathError::CalculationError(
                "Normal equations are not positive definite".to_string(),
            )
        })?;
        let coefficients = cholesky.solve(&rhs);

        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(MathError::CalculationError(
                "Regression produced non-finite coefficients".to_string(),
            ));
        }

        Ok(coefficients.iter().copied().collect())
    }
}

/// Dot product of a design row with fitted coefficients
pub fn dot(row: &[f64], coefficients: &[f64]) -> f64 {
    row.iter().zip(coefficients).map(|(x, b)| x * b).sum()
}
