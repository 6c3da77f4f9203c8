//! Error taxonomy shared by catalogue construction, solving and aggregation.

use std::io;

use thiserror::Error;

use crate::solver::SolveStatus;

/// Malformed or incomplete model input.
///
/// Always fatal to the current run. Every variant names the offending
/// component, column or parameter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("time series has no column `{column}`")]
    MissingColumn { column: String },

    #[error("no installed capacity configured for technology `{technology}`")]
    MissingCapacity { technology: String },

    #[error("`{label}` has {actual} samples, expected {expected}")]
    HorizonMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },

    #[error("flow of `{label}` is under-specified: it needs a fixed profile or a nominal capacity")]
    UnderSpecifiedFlow { label: String },

    #[error("duplicate label `{label}`")]
    DuplicateLabel { label: String },

    #[error("`{label}` references unknown bus `{bus}`")]
    UnknownBus { label: String, bus: String },

    #[error("`{label}`: {message}")]
    InvalidParameter { label: String, message: String },

    #[error("solver `{name}` is not available (compiled in: {available})")]
    UnknownSolver { name: String, available: String },
}

impl ConfigurationError {
    pub(crate) fn invalid(label: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            label: label.to_string(),
            message: message.into(),
        }
    }
}

/// The solver finished without an optimal solution.
///
/// Surfaced verbatim; the run is never retried or relaxed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("solver `{solver}` finished with status {status}: {message}")]
pub struct SolveError {
    pub solver: String,
    pub status: SolveStatus,
    pub message: String,
}

/// A result query referenced timesteps outside the solved horizon.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("window [{from}, {to}] lies outside the solved horizon [0, {horizon})")]
    OutsideHorizon {
        from: usize,
        to: usize,
        horizon: usize,
    },

    #[error("window start {from} is after its end {to}")]
    Inverted { from: usize, to: usize },

    #[error("timestamp `{timestamp}` is not on the time index")]
    UnknownTimestamp { timestamp: String },
}

/// Tabular input that could not be parsed.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}, column `{column}`: cannot parse `{value}` as a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("column `{column}` appears more than once in the header")]
    DuplicateColumn { column: String },

    #[error("input has no data columns")]
    Empty,
}

/// Crate-level error for a complete optimisation run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("i/o: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
