//! # markowitz
//!
//! Constrained mean-variance portfolio optimization.
//!
//! Given annualized expected returns and a covariance matrix for a basket
//! of assets, markowitz finds the weight vector maximizing the Sharpe
//! ratio, the weight vector minimizing volatility under full investment,
//! a covariance-ignorant Naive-Sharpe baseline, and the efficient
//! frontier obtained by re-solving the minimum-volatility problem across
//! a target-return grid.
//!
//! ## Quick Start
//!
//! ```
//! use markowitz::prelude::*;
//! use nalgebra::{dmatrix, dvector};
//!
//! let mu = dvector![0.10, 0.04];
//! let sigma = dmatrix![0.04, 0.0; 0.0, 0.01];
//!
//! let best = max_sharpe(&mu, &sigma, 0.02)?;
//! let stats = portfolio_stats(&best.weights, &mu, &sigma)?;
//!
//! println!(
//!     "return {:.2}%, volatility {:.2}%",
//!     stats.expected_return * 100.0,
//!     stats.volatility * 100.0
//! );
//! # Ok::<(), markowitz::MarkowitzError>(())
//! ```
//!
//! ## Weight invariants
//!
//! Every successful solve returns long-only, fully invested weights:
//! entries in `[0, 1]` summing to one within solver tolerance. Short
//! selling, leverage, and transaction costs are out of scope; inputs are
//! taken as point estimates with no robustness treatment.
//!
//! ## Architecture
//!
//! - **Statistics evaluator** maps weights to (return, volatility)
//! - **Objective value types** capture their parameters as plain fields
//! - **Constrained solver** owns the projected-gradient/active-set
//!   procedure shared by every task and every frontier point
//! - **Tasks** wire objectives to the solver (Max-Sharpe, Min-Volatility,
//!   Naive-Max-Sharpe)
//! - **Frontier sweeper** drives the solver across a target-return grid,
//!   in parallel under the `parallel` feature
//!
//! Solver failure is always explicit: tasks return
//! [`MarkowitzError::OptimizationFailure`], while an individual frontier
//! target that cannot be satisfied keeps its slot in the output as an
//! infeasible point.

pub mod constraints;
pub mod error;
pub mod estimate;
pub mod frontier;
pub mod objective;
pub mod solver;
pub mod stats;
pub mod tasks;

/// Prelude module for convenient imports.
///
/// ```
/// use markowitz::prelude::*;
/// ```
pub mod prelude {
    pub use crate::constraints::{Constraint, FullInvestment, TargetReturn};
    pub use crate::error::{MarkowitzError, Result};
    pub use crate::estimate::{annualized_inputs, log_returns, TRADING_DAYS_PER_YEAR};
    pub use crate::frontier::{
        efficient_frontier, efficient_frontier_with, EfficientFrontier, FrontierPoint,
        DEFAULT_FRONTIER_POINTS,
    };
    pub use crate::objective::{
        NegativeNaiveSharpe, NegativeSharpe, Objective, PortfolioVolatility,
    };
    pub use crate::solver::{minimize, Settings, Solution, SolveStatus};
    pub use crate::stats::{portfolio_stats, PortfolioStats};
    pub use crate::tasks::{
        asset_volatilities, max_sharpe, max_sharpe_with, min_volatility, min_volatility_with,
        naive_max_sharpe, naive_max_sharpe_with,
    };
}

// Re-export main types at crate root
pub use error::{MarkowitzError, Result};
pub use solver::{Settings, Solution, SolveStatus};
