//! Portfolio statistics evaluator.
//!
//! Maps a weight vector plus (mean-return vector, covariance matrix) to
//! (expected return, volatility). Stateless; recomputed on demand.

use nalgebra::{DMatrix, DVector};

use crate::error::{MarkowitzError, Result};

/// Annualized return and volatility of a weighted portfolio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioStats {
    /// Expected portfolio return: `w · mu`.
    pub expected_return: f64,
    /// Portfolio volatility: `sqrt(w' Sigma w)`.
    pub volatility: f64,
}

impl PortfolioStats {
    /// Sharpe ratio against a risk-free rate.
    ///
    /// Returns `None` when volatility is zero: a riskless portfolio has no
    /// well-defined Sharpe ratio, and callers must not report one.
    pub fn sharpe(&self, risk_free_rate: f64) -> Option<f64> {
        if self.volatility == 0.0 {
            None
        } else {
            Some((self.expected_return - risk_free_rate) / self.volatility)
        }
    }
}

/// Compute portfolio return and volatility for a weight vector.
///
/// `return = w · mu`, `variance = w' Sigma w`, `volatility = sqrt(variance)`.
/// The variance is clamped at zero before the square root so that
/// floating-point underflow on a near-degenerate covariance matrix cannot
/// produce a NaN volatility.
///
/// # Errors
///
/// Returns [`MarkowitzError::ShapeMismatch`] when the weight vector, mean
/// returns, and covariance matrix do not share one asset dimension.
///
/// # Example
///
/// ```
/// use nalgebra::{dmatrix, dvector};
/// use markowitz::stats::portfolio_stats;
///
/// let mu = dvector![0.10, 0.04];
/// let sigma = dmatrix![0.04, 0.0; 0.0, 0.01];
/// let w = dvector![0.5, 0.5];
///
/// let stats = portfolio_stats(&w, &mu, &sigma).unwrap();
/// assert!((stats.expected_return - 0.07).abs() < 1e-12);
/// ```
pub fn portfolio_stats(
    weights: &DVector<f64>,
    mean_returns: &DVector<f64>,
    cov_matrix: &DMatrix<f64>,
) -> Result<PortfolioStats> {
    check_shapes(weights.len(), mean_returns, cov_matrix)?;

    let expected_return = weights.dot(mean_returns);
    let variance = quadratic_form(weights, cov_matrix);
    let volatility = variance.max(0.0).sqrt();

    Ok(PortfolioStats {
        expected_return,
        volatility,
    })
}

/// Evaluate `w' Sigma w` without allocating the intermediate product.
pub(crate) fn quadratic_form(weights: &DVector<f64>, cov_matrix: &DMatrix<f64>) -> f64 {
    let n = weights.len();
    let mut acc = 0.0;
    for j in 0..n {
        let wj = weights[j];
        if wj == 0.0 {
            continue;
        }
        let col = cov_matrix.column(j);
        let mut inner = 0.0;
        for i in 0..n {
            inner += weights[i] * col[i];
        }
        acc += wj * inner;
    }
    acc
}

/// Verify that all three inputs agree on one asset dimension.
pub(crate) fn check_shapes(
    n_weights: usize,
    mean_returns: &DVector<f64>,
    cov_matrix: &DMatrix<f64>,
) -> Result<()> {
    let n = mean_returns.len();
    if cov_matrix.nrows() != n || cov_matrix.ncols() != n {
        return Err(MarkowitzError::ShapeMismatch {
            expected: format!("{n}x{n} covariance"),
            got: format!("{}x{}", cov_matrix.nrows(), cov_matrix.ncols()),
        });
    }
    if n_weights != n {
        return Err(MarkowitzError::ShapeMismatch {
            expected: format!("{n} weights"),
            got: format!("{n_weights}"),
        });
    }
    Ok(())
}
