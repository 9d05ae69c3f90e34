//! Equality constraints for the constrained optimizer.
//!
//! A constraint contributes one scalar equation `c(w) = 0`. The solver
//! consumes constraints through their value and gradient, linearizing
//! nonlinear ones at the current iterate each iteration; both constraints
//! shipped by this crate are linear, so the linearization is exact.

use nalgebra::DVector;

/// A scalar equality constraint `c(w) = 0`.
pub trait Constraint {
    /// Constraint residual at `weights` (zero when satisfied).
    fn value(&self, weights: &DVector<f64>) -> f64;

    /// Gradient of the residual at `weights`.
    fn gradient(&self, weights: &DVector<f64>) -> DVector<f64>;
}

/// Full-investment constraint: `sum(w) - 1 = 0`.
#[derive(Debug, Clone, Copy)]
pub struct FullInvestment;

impl Constraint for FullInvestment {
    fn value(&self, weights: &DVector<f64>) -> f64 {
        weights.sum() - 1.0
    }

    fn gradient(&self, weights: &DVector<f64>) -> DVector<f64> {
        DVector::from_element(weights.len(), 1.0)
    }
}

/// Target-return constraint: `mu · w - target = 0`.
///
/// Added by the frontier sweep on top of [`FullInvestment`] to pin each
/// sub-problem to one point of the target-return grid.
#[derive(Debug, Clone)]
pub struct TargetReturn<'a> {
    pub mean_returns: &'a DVector<f64>,
    pub target: f64,
}

impl Constraint for TargetReturn<'_> {
    fn value(&self, weights: &DVector<f64>) -> f64 {
        weights.dot(self.mean_returns) - self.target
    }

    fn gradient(&self, _weights: &DVector<f64>) -> DVector<f64> {
        self.mean_returns.clone()
    }
}
