//! Human-readable rendering of a [`ResultSummary`].

use std::fmt;

use crate::results::ResultSummary;
use crate::timeseries::{TIMESTAMP_FORMAT, TimeIndex};

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Result Report ---")?;
        writeln!(
            f,
            "Window:            steps {}..={} ({} h)",
            self.window.from(),
            self.window.to(),
            self.window.len()
        )?;
        writeln!(f, "{:<12} {:>16} {:>12}", "component", "sum [MWh]", "peak [MW]")?;
        for (label, flow) in &self.components {
            writeln!(f, "{label:<12} {:>16.1} {:>12.1}", flow.sum, flow.peak)?;
        }
        writeln!(f, "Storage capacity:  {:.1} MWh", self.storage_cap)?;
        write!(f, "Objective:         {:.2}", self.objective)
    }
}

/// Window bounds of `summary` as timestamps of `index`.
pub fn window_dates(summary: &ResultSummary, index: &TimeIndex) -> (String, String) {
    (
        index.timestamp(summary.window.from()).format(TIMESTAMP_FORMAT).to_string(),
        index.timestamp(summary.window.to()).format(TIMESTAMP_FORMAT).to_string(),
    )
}
