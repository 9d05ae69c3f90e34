//! Objective functions for the optimization tasks.
//!
//! Each objective is a plain value type constructed once per call with its
//! captured parameters as fields, so it can be evaluated thousands of times
//! per solve without hidden shared state and tested in isolation. All
//! objectives are expressed as functions to *minimize*; the Sharpe
//! objectives are negated accordingly.

use nalgebra::{DMatrix, DVector};

use crate::stats::quadratic_form;

/// Finite stand-in for an "infinitely good" objective value.
///
/// When portfolio volatility collapses to zero while the return differs
/// from the risk-free rate, the Sharpe objective has no finite value. A
/// non-finite sentinel would poison the solver's arithmetic, so the
/// objective returns this clamp instead. It acts purely as a directional
/// signal inside the solver and must never be reported as a Sharpe ratio;
/// [`crate::stats::PortfolioStats::sharpe`] returns `None` in that regime.
pub const DEGENERATE_RISK_CLAMP: f64 = 1e12;

/// A scalar function of the weight vector, minimized by the solver.
pub trait Objective {
    /// Evaluate the objective at `weights`.
    fn value(&self, weights: &DVector<f64>) -> f64;
}

/// Negated Sharpe ratio: `-(w·mu - rf) / sqrt(w' Sigma w)`.
///
/// Minimizing this maximizes the Sharpe ratio.
#[derive(Debug, Clone)]
pub struct NegativeSharpe<'a> {
    pub mean_returns: &'a DVector<f64>,
    pub cov_matrix: &'a DMatrix<f64>,
    pub risk_free_rate: f64,
}

impl Objective for NegativeSharpe<'_> {
    fn value(&self, weights: &DVector<f64>) -> f64 {
        let ret = weights.dot(self.mean_returns);
        let vol = quadratic_form(weights, self.cov_matrix).max(0.0).sqrt();
        negated_sharpe(ret, vol, self.risk_free_rate)
    }
}

/// Negated naive Sharpe ratio: volatility replaced by `w · asset_vols`.
///
/// The linear risk proxy ignores correlation entirely. This is a baseline
/// for comparison against [`NegativeSharpe`], not a risk model.
#[derive(Debug, Clone)]
pub struct NegativeNaiveSharpe<'a> {
    pub mean_returns: &'a DVector<f64>,
    pub asset_vols: &'a DVector<f64>,
    pub risk_free_rate: f64,
}

impl Objective for NegativeNaiveSharpe<'_> {
    fn value(&self, weights: &DVector<f64>) -> f64 {
        let ret = weights.dot(self.mean_returns);
        let vol = weights.dot(self.asset_vols);
        negated_sharpe(ret, vol, self.risk_free_rate)
    }
}

/// Portfolio volatility: `sqrt(w' Sigma w)`.
#[derive(Debug, Clone)]
pub struct PortfolioVolatility<'a> {
    pub cov_matrix: &'a DMatrix<f64>,
}

impl Objective for PortfolioVolatility<'_> {
    fn value(&self, weights: &DVector<f64>) -> f64 {
        quadratic_form(weights, self.cov_matrix).max(0.0).sqrt()
    }
}

/// Shared zero-volatility policy for both Sharpe objectives.
///
/// At zero volatility the ratio is undefined: the portfolio either sits
/// exactly at the risk-free rate (objective 0) or is "infinitely good"
/// (clamped to a large finite negative value rather than `-inf`).
fn negated_sharpe(ret: f64, vol: f64, risk_free_rate: f64) -> f64 {
    if vol == 0.0 {
        if ret == risk_free_rate {
            0.0
        } else {
            -DEGENERATE_RISK_CLAMP
        }
    } else {
        -(ret - risk_free_rate) / vol
    }
}
