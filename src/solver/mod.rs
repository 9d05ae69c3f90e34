//! Constrained optimizer for markowitz.
//!
//! This module provides:
//! - The projected-gradient/active-set minimization procedure
//! - Its settings, solution, and status types

pub mod sqp;

pub use self::sqp::{minimize, Settings, Solution, SolveStatus};
