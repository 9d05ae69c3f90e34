//! Annualized input estimation from return history.
//!
//! The engine itself consumes a mean-return vector and covariance matrix;
//! this module holds the pure transformations that produce them from
//! in-memory price or return series. Fetching the prices stays with the
//! external data layer, as does alignment and missing-value removal.
//!
//! Returns are logarithmic; annualization multiplies the per-period mean
//! and covariance by the observation frequency.

use nalgebra::{DMatrix, DVector};

use crate::error::{MarkowitzError, Result};

/// Annualization factor for daily observations.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Per-period log returns from a price matrix (rows = observations in time
/// order, columns = assets): row `t` is `ln(p[t+1] / p[t])`.
///
/// # Errors
///
/// `InvalidInput` when fewer than two price rows are supplied or any price
/// is not strictly positive.
pub fn log_returns(prices: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let (rows, cols) = prices.shape();
    if rows < 2 {
        return Err(MarkowitzError::InvalidInput(
            "need at least two price observations to form returns".into(),
        ));
    }
    if prices.iter().any(|&p| p <= 0.0) {
        return Err(MarkowitzError::InvalidInput(
            "prices must be strictly positive for log returns".into(),
        ));
    }

    let mut returns = DMatrix::zeros(rows - 1, cols);
    for j in 0..cols {
        for t in 0..rows - 1 {
            returns[(t, j)] = (prices[(t + 1, j)] / prices[(t, j)]).ln();
        }
    }
    Ok(returns)
}

/// Annualized mean-return vector and covariance matrix from per-period
/// returns (rows = observations, columns = assets).
///
/// The covariance uses the sample (`n - 1`) denominator; both moments are
/// scaled by `periods_per_year` (use [`TRADING_DAYS_PER_YEAR`] for daily
/// data).
///
/// # Errors
///
/// `InvalidInput` when fewer than two return observations are supplied.
pub fn annualized_inputs(
    returns: &DMatrix<f64>,
    periods_per_year: f64,
) -> Result<(DVector<f64>, DMatrix<f64>)> {
    let (rows, cols) = returns.shape();
    if rows < 2 {
        return Err(MarkowitzError::InvalidInput(
            "need at least two return observations to estimate covariance".into(),
        ));
    }

    let mut means = DVector::zeros(cols);
    for j in 0..cols {
        means[j] = returns.column(j).sum() / rows as f64;
    }

    let mut cov = DMatrix::zeros(cols, cols);
    for i in 0..cols {
        for j in i..cols {
            let mut acc = 0.0;
            for t in 0..rows {
                acc += (returns[(t, i)] - means[i]) * (returns[(t, j)] - means[j]);
            }
            let c = acc / (rows - 1) as f64;
            cov[(i, j)] = c;
            cov[(j, i)] = c;
        }
    }

    Ok((means * periods_per_year, cov * periods_per_year))
}
