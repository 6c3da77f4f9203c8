//! CSV and JSON input/output.

/// Flow CSV and result JSON export.
pub mod export;
/// CSV time-series import.
pub mod import;
