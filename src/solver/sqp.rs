//! Constrained nonlinear minimization.
//!
//! Sequential projected-gradient procedure with active-set handling of the
//! box bounds. Each iteration:
//!
//! 1. builds a numerical gradient of the objective and the Jacobian of the
//!    equality constraints at the current iterate,
//! 2. projects the gradient onto the tangent space of the (linearized)
//!    equality constraints restricted to the coordinates not pinned at a
//!    bound, releasing pinned coordinates whose Lagrange multiplier says
//!    the bound is not optimal,
//! 3. backtracks along the projection arc: every trial point is clamped to
//!    the bounds and re-projected onto the equality constraints before the
//!    objective is evaluated.
//!
//! Termination: projected-gradient norm below tolerance, objective change
//! below tolerance on consecutive accepted steps, step-size collapse at a
//! feasible point, or the iteration cap. Failure is always explicit in the
//! returned [`SolveStatus`].

use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

use crate::constraints::Constraint;
use crate::objective::Objective;

/// Sufficient-decrease coefficient for the backtracking line search.
const ARMIJO_C: f64 = 1e-4;

/// A coordinate this close to a bound is treated as pinned there.
const ACTIVE_TOL: f64 = 1e-9;

/// Solver settings.
///
/// All tolerances and caps are tunable here rather than hard-coded inside
/// the algorithm body.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Maximum outer iterations per solve.
    pub max_iter: usize,
    /// Equality-constraint satisfaction tolerance.
    pub constraint_tol: f64,
    /// Objective-change tolerance (relative to `1 + |f|`).
    pub objective_tol: f64,
    /// Projected-gradient norm below which the iterate is stationary.
    pub gradient_tol: f64,
    /// Relative step for central-difference gradients.
    pub fd_step: f64,
    /// Per-coordinate box bounds `(lower, upper)` applied to every weight.
    pub bounds: (f64, f64),
    /// Cap on alternating-projection cycles in feasibility restoration.
    pub max_projection_cycles: usize,
    /// Cap on backtracking halvings per line search.
    pub max_line_search_steps: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_iter: 200,
            constraint_tol: 1e-8,
            objective_tol: 1e-9,
            gradient_tol: 1e-6,
            fd_step: 1e-7,
            bounds: (0.0, 1.0),
            max_projection_cycles: 400,
            max_line_search_steps: 40,
        }
    }
}

/// Solution status from the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// A stationary feasible point was found within tolerance.
    Optimal,
    /// No point satisfying the constraints and bounds could be reached.
    Infeasible,
    /// The iteration cap was reached before convergence.
    MaxIterations,
    /// A linear-algebra step failed (degenerate constraint geometry).
    NumericalError,
}

/// Result of one constrained solve.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Final iterate (feasible whenever `status` is `Optimal`).
    pub weights: DVector<f64>,
    /// Objective value at the final iterate.
    pub objective: f64,
    /// Outer iterations consumed.
    pub iterations: usize,
    /// Solution status.
    pub status: SolveStatus,
}

impl Solution {
    /// Whether the solve converged.
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

/// Minimize `objective` subject to the equality `constraints` and the box
/// bounds in `settings`, starting from `initial`.
///
/// The start point is projected onto the feasible set before the first
/// iteration, so any reasonable `initial` (e.g. equal weights) works.
pub fn minimize(
    objective: &dyn Objective,
    constraints: &[&dyn Constraint],
    initial: DVector<f64>,
    settings: &Settings,
) -> Solution {
    let mut w = initial;
    if !restore_feasibility(&mut w, constraints, settings) {
        let objective = objective.value(&w);
        return Solution {
            weights: w,
            objective,
            iterations: 0,
            status: SolveStatus::Infeasible,
        };
    }

    let mut f_curr = objective.value(&w);
    let mut status = SolveStatus::MaxIterations;
    let mut iterations = settings.max_iter;
    let mut small_change_streak = 0usize;

    for iter in 0..settings.max_iter {
        let g = numerical_gradient(objective, &w, settings);
        let jac = constraint_jacobian(constraints, &w);

        let d = match descent_direction(&g, &jac, &w, settings) {
            Some(d) => d,
            None => {
                status = SolveStatus::NumericalError;
                iterations = iter;
                break;
            }
        };

        if d.amax() < settings.gradient_tol {
            trace!(iter, "projected gradient below tolerance");
            status = SolveStatus::Optimal;
            iterations = iter;
            break;
        }

        match line_search(objective, constraints, &w, f_curr, &d, settings) {
            Some((trial, f_trial)) => {
                let change = (f_curr - f_trial).abs();
                w = trial;
                f_curr = f_trial;
                if change <= settings.objective_tol * (1.0 + f_curr.abs()) {
                    small_change_streak += 1;
                    if small_change_streak >= 2 {
                        status = SolveStatus::Optimal;
                        iterations = iter + 1;
                        break;
                    }
                } else {
                    small_change_streak = 0;
                }
            }
            None => {
                // Step-size collapse at a feasible iterate: no direction
                // along the projection arc improves the objective, which is
                // the step-change termination criterion.
                trace!(iter, "line search exhausted, treating as stationary");
                status = SolveStatus::Optimal;
                iterations = iter;
                break;
            }
        }
    }

    debug!(
        ?status,
        iterations,
        objective = f_curr,
        "constrained solve finished"
    );

    Solution {
        weights: w,
        objective: f_curr,
        iterations,
        status,
    }
}

/// Backtracking Armijo search along the projection arc.
///
/// Every trial point is clamped and re-projected before evaluation, so the
/// accepted point is always feasible. A trial that improves the objective
/// without meeting the Armijo bound is kept as a fallback; projection can
/// shorten the effective step enough that the bound is unattainable even
/// though genuine descent exists.
fn line_search(
    objective: &dyn Objective,
    constraints: &[&dyn Constraint],
    w: &DVector<f64>,
    f_curr: f64,
    d: &DVector<f64>,
    settings: &Settings,
) -> Option<(DVector<f64>, f64)> {
    let d_norm = d.norm();
    let d_norm_sq = d_norm * d_norm;
    let mut alpha = if d_norm > 1.0 { 1.0 / d_norm } else { 1.0 };
    let mut fallback: Option<(DVector<f64>, f64)> = None;

    for _ in 0..settings.max_line_search_steps {
        let mut trial = w + d * alpha;
        if !restore_feasibility(&mut trial, constraints, settings) {
            alpha *= 0.5;
            continue;
        }
        let f_trial = objective.value(&trial);
        if f_trial <= f_curr - ARMIJO_C * alpha * d_norm_sq {
            return Some((trial, f_trial));
        }
        if f_trial < f_curr && fallback.as_ref().map_or(true, |(_, fb)| f_trial < *fb) {
            fallback = Some((trial, f_trial));
        }
        alpha *= 0.5;
    }

    fallback
}

/// Projected steepest-descent direction with active-set bound handling.
///
/// Coordinates pinned at a bound are excluded from the tangent-space
/// projection; a pinned coordinate is released when the sign of its reduced
/// gradient shows the bound constraint is holding the objective back.
/// Returns `None` when the multiplier system cannot be solved.
fn descent_direction(
    g: &DVector<f64>,
    jac: &DMatrix<f64>,
    w: &DVector<f64>,
    settings: &Settings,
) -> Option<DVector<f64>> {
    let n = w.len();
    let (lo, hi) = settings.bounds;

    let at_lower: Vec<bool> = (0..n).map(|i| w[i] <= lo + ACTIVE_TOL).collect();
    let at_upper: Vec<bool> = (0..n).map(|i| w[i] >= hi - ACTIVE_TOL).collect();
    let mut pinned: Vec<bool> = (0..n).map(|i| at_lower[i] || at_upper[i]).collect();

    // Release loop: strictly shrinks the pinned set, so it runs at most n times.
    loop {
        let free: Vec<usize> = (0..n).filter(|&i| !pinned[i]).collect();

        let reduced = reduced_gradient(g, jac, &free)?;

        let mut release: Option<(usize, f64)> = None;
        for i in 0..n {
            if !pinned[i] {
                continue;
            }
            // At the lower bound the KKT multiplier is the reduced gradient
            // itself: negative means the objective falls by moving the
            // coordinate up into the interior. Mirrored at the upper bound.
            let violation = if at_lower[i] {
                -reduced[i]
            } else {
                reduced[i]
            };
            if violation > settings.gradient_tol
                && release.as_ref().map_or(true, |&(_, v)| violation > v)
            {
                release = Some((i, violation));
            }
        }

        match release {
            Some((i, _)) => pinned[i] = false,
            None => {
                let mut d = DVector::zeros(n);
                for &i in &free {
                    d[i] = -reduced[i];
                }
                return Some(d);
            }
        }
    }
}

/// Reduced gradient `g - J' lambda` with least-squares multipliers taken
/// over the free coordinates (or over all coordinates when none are free,
/// which still yields multipliers for the bound-release test).
fn reduced_gradient(
    g: &DVector<f64>,
    jac: &DMatrix<f64>,
    free: &[usize],
) -> Option<DVector<f64>> {
    let m = jac.nrows();
    if m == 0 {
        return Some(g.clone());
    }

    let (jac_s, g_s) = if free.is_empty() {
        (jac.clone(), g.clone())
    } else {
        (
            jac.select_columns(free.iter()),
            DVector::from_iterator(free.len(), free.iter().map(|&i| g[i])),
        )
    };

    let jjt = &jac_s * jac_s.transpose();
    let rhs = &jac_s * g_s;
    let lambda = solve_spd(&jjt, &rhs)?;
    Some(g - jac.transpose() * lambda)
}

/// Pull an iterate back onto the feasible set.
///
/// Alternates Newton projection onto the (linearized) equality constraints
/// with clamping to the box. Both sets are convex, so the cycle converges
/// whenever their intersection is nonempty; a cap guards the degenerate
/// case. Returns `false` when the point could not be restored.
fn restore_feasibility(
    w: &mut DVector<f64>,
    constraints: &[&dyn Constraint],
    settings: &Settings,
) -> bool {
    let (lo, hi) = settings.bounds;
    clamp_in_place(w, lo, hi);
    if constraints.is_empty() {
        return true;
    }

    for _ in 0..settings.max_projection_cycles {
        let c = residuals(constraints, w);
        if c.amax() <= settings.constraint_tol {
            return true;
        }
        let jac = constraint_jacobian(constraints, w);
        let jjt = &jac * jac.transpose();
        let y = match solve_spd(&jjt, &c) {
            Some(y) => y,
            None => return false,
        };
        *w -= jac.transpose() * y;
        clamp_in_place(w, lo, hi);
    }

    residuals(constraints, w).amax() <= settings.constraint_tol
}

/// Central-difference gradient of the objective.
fn numerical_gradient(
    objective: &dyn Objective,
    w: &DVector<f64>,
    settings: &Settings,
) -> DVector<f64> {
    let n = w.len();
    let mut g = DVector::zeros(n);
    let mut x = w.clone();
    for i in 0..n {
        let wi = w[i];
        let h = settings.fd_step * (1.0 + wi.abs());
        x[i] = wi + h;
        let f_plus = objective.value(&x);
        x[i] = wi - h;
        let f_minus = objective.value(&x);
        x[i] = wi;
        g[i] = (f_plus - f_minus) / (2.0 * h);
    }
    g
}

/// Stack constraint residuals into one vector.
fn residuals(constraints: &[&dyn Constraint], w: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(constraints.len(), constraints.iter().map(|c| c.value(w)))
}

/// Stack constraint gradients into an `m x n` Jacobian.
fn constraint_jacobian(constraints: &[&dyn Constraint], w: &DVector<f64>) -> DMatrix<f64> {
    let n = w.len();
    let mut jac = DMatrix::zeros(constraints.len(), n);
    for (k, c) in constraints.iter().enumerate() {
        let grad = c.gradient(w);
        jac.set_row(k, &grad.transpose());
    }
    jac
}

/// Solve a small symmetric positive-semidefinite system, falling back to a
/// lightly ridged factorization when the plain Cholesky fails.
fn solve_spd(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if let Some(chol) = a.clone().cholesky() {
        return Some(chol.solve(b));
    }
    let m = a.nrows();
    let ridge = 1e-12 * (1.0 + a.trace() / m as f64);
    let mut ridged = a.clone();
    for i in 0..m {
        ridged[(i, i)] += ridge;
    }
    ridged.cholesky().map(|chol| chol.solve(b))
}

fn clamp_in_place(w: &mut DVector<f64>, lo: f64, hi: f64) {
    for x in w.iter_mut() {
        *x = x.clamp(lo, hi);
    }
}
