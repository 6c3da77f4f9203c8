//! Cost-minimal dispatch and storage sizing for a single-node energy system.
//!
//! A run builds a component [`model::Model`] from a time-series table,
//! compiles it to a [`lp::LinearProgram`], solves it through a
//! [`solver::Solver`] and aggregates the solved flows over a report window.

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
/// Backend-neutral linear programs and the LP file writer.
pub mod lp;
pub mod model;
pub mod optimise;
pub mod report;
pub mod results;
pub mod solver;
/// Seeded profile generators.
pub mod synthetic;
pub mod timeseries;

pub use error::{Error, Result};
