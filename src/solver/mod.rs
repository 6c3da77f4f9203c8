//! Solver adapter: a narrow trait over LP backends plus status handling.
//!
//! The core only needs continuous variables with simple bounds and linear
//! rows. Backends report a [`SolverOutcome`]; [`solve`] turns anything other
//! than [`SolveStatus::Optimal`] into a [`SolveError`] without retrying.

pub mod backend;

use std::fmt;
use std::time::Duration;

use tracing::info;

use crate::error::{ConfigurationError, SolveError};
use crate::lp::LinearProgram;

pub use backend::GoodLpSolver;

/// Terminal status reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Error,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Optimal => "OPTIMAL",
            Self::Infeasible => "INFEASIBLE",
            Self::Unbounded => "UNBOUNDED",
            Self::Error => "ERROR",
        })
    }
}

/// What a backend hands back after one solve call.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    pub status: SolveStatus,
    /// Primal values indexed like the program's variables; empty unless optimal.
    pub values: Vec<f64>,
    /// Objective including its constant part.
    pub objective_value: f64,
    pub message: String,
}

impl SolverOutcome {
    /// An outcome without a solution.
    pub fn failed(status: SolveStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: f64::NAN,
            message: message.into(),
        }
    }
}

/// Options passed through to the backend untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolveOptions {
    /// Stream backend statistics at `info` level instead of `debug`.
    pub tee: bool,
    pub time_limit: Option<Duration>,
}

/// An LP backend.
pub trait Solver: Send + Sync {
    /// Name used to select the backend in configuration.
    fn name(&self) -> &str;

    /// Solves `program`. Never panics on infeasible or unbounded input.
    fn solve(&self, program: &LinearProgram, options: &SolveOptions) -> SolverOutcome;
}

/// Backends compiled into this build.
pub fn available_solvers() -> Vec<&'static str> {
    GoodLpSolver::available()
}

/// Resolves a backend from its configured name.
///
/// # Errors
///
/// Returns [`ConfigurationError::UnknownSolver`] when `name` is not one of
/// [`available_solvers`].
pub fn solver_by_name(name: &str) -> Result<Box<dyn Solver>, ConfigurationError> {
    GoodLpSolver::new(name)
        .map(|s| Box::new(s) as Box<dyn Solver>)
        .ok_or_else(|| ConfigurationError::UnknownSolver {
            name: name.to_string(),
            available: available_solvers().join(", "),
        })
}

/// Runs `solver` and rejects every non-optimal outcome.
///
/// # Errors
///
/// Returns [`SolveError`] carrying the backend name, status and message.
pub fn solve(
    solver: &dyn Solver,
    program: &LinearProgram,
    options: &SolveOptions,
) -> Result<SolverOutcome, SolveError> {
    info!(solver = solver.name(), "solving");
    let outcome = solver.solve(program, options);
    if outcome.status != SolveStatus::Optimal {
        return Err(SolveError {
            solver: solver.name().to_string(),
            status: outcome.status,
            message: outcome.message,
        });
    }
    info!(objective = outcome.objective_value, "solved");
    Ok(outcome)
}
