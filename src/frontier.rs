//! Efficient frontier sweep.
//!
//! Re-solves the Min-Volatility problem under a moving target-return
//! equality constraint across an evenly spaced grid. Each sub-problem is
//! independent (fresh equal-weight start, shared immutable inputs), so the
//! sweep parallelizes with no synchronization beyond collecting results in
//! target order; the `parallel` feature routes it through rayon.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::constraints::{Constraint, FullInvestment, TargetReturn};
use crate::error::{MarkowitzError, Result};
use crate::objective::PortfolioVolatility;
use crate::solver::{minimize, Settings};
use crate::stats::portfolio_stats;
use crate::tasks::{equal_weights, min_volatility_with};

/// Default number of frontier points.
pub const DEFAULT_FRONTIER_POINTS: usize = 100;

/// Slack allowed before two neighboring volatilities count as a
/// monotonicity violation.
const MONOTONICITY_TOL: f64 = 1e-6;

/// One point of the frontier: a target return and the minimum volatility
/// achieving it, or `None` when that target could not be satisfied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontierPoint {
    pub target_return: f64,
    pub volatility: Option<f64>,
}

impl FrontierPoint {
    /// Whether a minimum-volatility solve succeeded for this target.
    pub fn is_feasible(&self) -> bool {
        self.volatility.is_some()
    }
}

/// The locus of minimum-volatility portfolios across a target-return grid,
/// ordered by increasing target return. Infeasible targets keep their slot
/// so the sequence length always equals the requested point count.
#[derive(Debug, Clone)]
pub struct EfficientFrontier {
    pub points: Vec<FrontierPoint>,
    monotonic: bool,
}

impl EfficientFrontier {
    /// `false` when volatility decreased somewhere as target return
    /// increased. That is solver noise worth inspecting, already logged
    /// as a warning during the sweep.
    pub fn is_monotonic(&self) -> bool {
        self.monotonic
    }
}

/// Sweep the efficient frontier with default solver settings.
///
/// The target-return range runs from the Min-Volatility portfolio's return
/// up to the highest single-asset mean return, `num_points` evenly spaced
/// targets inclusive of both ends.
///
/// # Errors
///
/// Propagates input-validation errors and the Min-Volatility solve failure
/// (the sweep range is undefined without it). Per-target failures inside
/// the sweep are not errors; they yield infeasible points.
///
/// # Example
///
/// ```
/// use nalgebra::{dmatrix, dvector};
/// use markowitz::frontier::efficient_frontier;
///
/// let mu = dvector![0.10, 0.04];
/// let sigma = dmatrix![0.04, 0.0; 0.0, 0.01];
///
/// let frontier = efficient_frontier(&mu, &sigma, 20).unwrap();
/// assert_eq!(frontier.points.len(), 20);
/// ```
pub fn efficient_frontier(
    mean_returns: &DVector<f64>,
    cov_matrix: &DMatrix<f64>,
    num_points: usize,
) -> Result<EfficientFrontier> {
    efficient_frontier_with(mean_returns, cov_matrix, num_points, &Settings::default())
}

/// [`efficient_frontier`] with custom solver settings.
pub fn efficient_frontier_with(
    mean_returns: &DVector<f64>,
    cov_matrix: &DMatrix<f64>,
    num_points: usize,
    settings: &Settings,
) -> Result<EfficientFrontier> {
    if num_points == 0 {
        return Err(MarkowitzError::InvalidInput(
            "frontier needs at least one point".into(),
        ));
    }

    let min_vol = min_volatility_with(mean_returns, cov_matrix, settings)?;
    let lower = portfolio_stats(&min_vol.weights, mean_returns, cov_matrix)?.expected_return;
    let upper = mean_returns.max();

    let targets = linspace(lower, upper, num_points);
    let volatilities = sweep(mean_returns, cov_matrix, &targets, settings);

    let points: Vec<FrontierPoint> = targets
        .into_iter()
        .zip(volatilities)
        .map(|(target_return, volatility)| FrontierPoint {
            target_return,
            volatility,
        })
        .collect();

    let monotonic = check_monotonic(&points);

    Ok(EfficientFrontier { points, monotonic })
}

#[cfg(feature = "parallel")]
fn sweep(
    mean_returns: &DVector<f64>,
    cov_matrix: &DMatrix<f64>,
    targets: &[f64],
    settings: &Settings,
) -> Vec<Option<f64>> {
    use rayon::prelude::*;

    // par_iter + collect preserves target order regardless of completion order.
    targets
        .par_iter()
        .map(|&target| solve_point(mean_returns, cov_matrix, target, settings))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn sweep(
    mean_returns: &DVector<f64>,
    cov_matrix: &DMatrix<f64>,
    targets: &[f64],
    settings: &Settings,
) -> Vec<Option<f64>> {
    targets
        .iter()
        .map(|&target| solve_point(mean_returns, cov_matrix, target, settings))
        .collect()
}

/// Minimum volatility at one target return, or `None` when the solve did
/// not converge for that target.
fn solve_point(
    mean_returns: &DVector<f64>,
    cov_matrix: &DMatrix<f64>,
    target: f64,
    settings: &Settings,
) -> Option<f64> {
    let budget = FullInvestment;
    let pinned_return = TargetReturn {
        mean_returns,
        target,
    };
    let constraints: Vec<&dyn Constraint> = vec![&budget, &pinned_return];
    let objective = PortfolioVolatility { cov_matrix };

    let solution = minimize(
        &objective,
        &constraints,
        equal_weights(mean_returns.len()),
        settings,
    );

    if solution.is_optimal() {
        Some(solution.objective)
    } else {
        debug!(
            target_return = target,
            status = ?solution.status,
            "frontier point infeasible"
        );
        None
    }
}

/// `n` evenly spaced values across `[lo, hi]`, both ends included.
fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![lo];
    }
    let step = (hi - lo) / (n - 1) as f64;
    let mut grid: Vec<f64> = (0..n).map(|i| lo + step * i as f64).collect();
    // Keep the endpoint exact; accumulated rounding must not push the last
    // target past the attainable maximum.
    grid[n - 1] = hi;
    grid
}

/// Warn on any volatility decrease between successive feasible targets.
fn check_monotonic(points: &[FrontierPoint]) -> bool {
    let mut monotonic = true;
    let mut prev: Option<f64> = None;
    for point in points {
        let Some(vol) = point.volatility else { continue };
        if let Some(prev_vol) = prev {
            if vol < prev_vol - MONOTONICITY_TOL {
                warn!(
                    target_return = point.target_return,
                    volatility = vol,
                    previous = prev_vol,
                    "frontier volatility decreased while target return increased"
                );
                monotonic = false;
            }
        }
        prev = Some(vol);
    }
    monotonic
}
