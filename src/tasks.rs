//! Optimization tasks: Max-Sharpe, Min-Volatility, Naive-Max-Sharpe.
//!
//! Each task wires one objective from [`crate::objective`] to the
//! constrained solver with the full-investment constraint, `[0, 1]` bounds,
//! and an equal-weight start. Non-convergence surfaces as
//! [`MarkowitzError::OptimizationFailure`]; retry policy belongs to the
//! caller, never to this layer.

use nalgebra::{DMatrix, DVector};

use crate::constraints::{Constraint, FullInvestment};
use crate::error::{MarkowitzError, Result};
use crate::objective::{NegativeNaiveSharpe, NegativeSharpe, Objective, PortfolioVolatility};
use crate::solver::{minimize, Settings, Solution};
use crate::stats::check_shapes;

/// Weights maximizing the Sharpe ratio `(w·mu - rf) / sqrt(w' Sigma w)`.
///
/// # Example
///
/// ```
/// use nalgebra::{dmatrix, dvector};
/// use markowitz::tasks::max_sharpe;
///
/// let mu = dvector![0.10, 0.04];
/// let sigma = dmatrix![0.04, 0.0; 0.0, 0.01];
///
/// let solution = max_sharpe(&mu, &sigma, 0.02).unwrap();
/// assert!((solution.weights.sum() - 1.0).abs() < 1e-6);
/// ```
pub fn max_sharpe(
    mean_returns: &DVector<f64>,
    cov_matrix: &DMatrix<f64>,
    risk_free_rate: f64,
) -> Result<Solution> {
    max_sharpe_with(mean_returns, cov_matrix, risk_free_rate, &Settings::default())
}

/// [`max_sharpe`] with custom solver settings.
pub fn max_sharpe_with(
    mean_returns: &DVector<f64>,
    cov_matrix: &DMatrix<f64>,
    risk_free_rate: f64,
    settings: &Settings,
) -> Result<Solution> {
    validate(mean_returns, cov_matrix)?;
    let objective = NegativeSharpe {
        mean_returns,
        cov_matrix,
        risk_free_rate,
    };
    run(&objective, mean_returns.len(), settings)
}

/// Weights minimizing portfolio volatility under full investment.
pub fn min_volatility(
    mean_returns: &DVector<f64>,
    cov_matrix: &DMatrix<f64>,
) -> Result<Solution> {
    min_volatility_with(mean_returns, cov_matrix, &Settings::default())
}

/// [`min_volatility`] with custom solver settings.
pub fn min_volatility_with(
    mean_returns: &DVector<f64>,
    cov_matrix: &DMatrix<f64>,
    settings: &Settings,
) -> Result<Solution> {
    validate(mean_returns, cov_matrix)?;
    let objective = PortfolioVolatility { cov_matrix };
    run(&objective, mean_returns.len(), settings)
}

/// Weights maximizing the naive Sharpe ratio, whose risk proxy is the
/// weighted average of individual asset volatilities (the square roots of
/// the covariance diagonal). A covariance-ignorant baseline, not a risk
/// model.
pub fn naive_max_sharpe(
    mean_returns: &DVector<f64>,
    cov_matrix: &DMatrix<f64>,
    risk_free_rate: f64,
) -> Result<Solution> {
    naive_max_sharpe_with(mean_returns, cov_matrix, risk_free_rate, &Settings::default())
}

/// [`naive_max_sharpe`] with custom solver settings.
pub fn naive_max_sharpe_with(
    mean_returns: &DVector<f64>,
    cov_matrix: &DMatrix<f64>,
    risk_free_rate: f64,
    settings: &Settings,
) -> Result<Solution> {
    validate(mean_returns, cov_matrix)?;
    let asset_vols = asset_volatilities(cov_matrix);
    let objective = NegativeNaiveSharpe {
        mean_returns,
        asset_vols: &asset_vols,
        risk_free_rate,
    };
    run(&objective, mean_returns.len(), settings)
}

/// Per-asset volatilities from the covariance diagonal.
pub fn asset_volatilities(cov_matrix: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(
        cov_matrix.nrows(),
        cov_matrix.diagonal().iter().map(|v| v.max(0.0).sqrt()),
    )
}

/// The equal-weight start vector `[1/n; n]`, feasible for the
/// full-investment constraint and the `[0, 1]` bounds by construction.
pub(crate) fn equal_weights(n: usize) -> DVector<f64> {
    DVector::from_element(n, 1.0 / n as f64)
}

fn validate(mean_returns: &DVector<f64>, cov_matrix: &DMatrix<f64>) -> Result<()> {
    if mean_returns.is_empty() {
        return Err(MarkowitzError::InvalidInput(
            "asset universe is empty".into(),
        ));
    }
    check_shapes(mean_returns.len(), mean_returns, cov_matrix)
}

fn run(objective: &dyn Objective, n: usize, settings: &Settings) -> Result<Solution> {
    let budget = FullInvestment;
    let constraints: Vec<&dyn Constraint> = vec![&budget];
    let solution = minimize(objective, &constraints, equal_weights(n), settings);
    if solution.is_optimal() {
        Ok(solution)
    } else {
        Err(MarkowitzError::OptimizationFailure {
            iterations: solution.iterations,
            last_objective: solution.objective,
        })
    }
}
