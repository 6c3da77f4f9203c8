//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ConfigurationError, RangeError};
use crate::model::catalogue::{
    BusLabels, Capacities, DemandParams, Economics, ExcessParams, FuelParams, ProfileShape,
    StorageParams, Technology, TransformerParams,
};
use crate::optimise::RunOptions;
use crate::results::Window;
use crate::solver::available_solvers;
use crate::synthetic::{SyntheticConfig, generate_table};
use crate::timeseries::{TimeIndex, TimeSeriesTable};

/// Top-level scenario configuration parsed from TOML.
///
/// Every field missing from a file takes its value from the `hsnr` preset.
/// Load from TOML with [`ScenarioConfig::from_toml_file`] or pick a preset
/// with [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Horizon, solver and debug switches.
    pub run: RunConfig,
    pub buses: BusLabels,
    pub demand: DemandParams,
    pub excess: ExcessParams,
    pub fuel: FuelParams,
    pub transformer: TransformerParams,
    pub storage: StorageParams,
    /// Generation technologies in report order.
    pub technologies: Vec<Technology>,
    /// Installed capacity per technology name.
    pub capacities: Capacities,
    /// Aggregation window.
    pub report: ReportConfig,
    /// Profile generation when no CSV is supplied.
    pub synthetic: SyntheticConfig,
}

/// Horizon, solver and debug switches.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// LP backend, e.g. `"microlp"`.
    pub solver_name: String,
    /// Write the LP file before solving.
    pub debug: bool,
    pub lp_file: PathBuf,
    /// Model horizon in hours (must be > 0).
    pub number_timesteps: usize,
    /// Log solver statistics at `info` level.
    pub tee_switch: bool,
    /// Timestamp of timestep 0.
    pub start: String,
    /// Passed to the backend untouched.
    pub time_limit_secs: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            solver_name: "microlp".to_string(),
            debug: false,
            lp_file: PathBuf::from("lp_files/model.lp"),
            number_timesteps: 8760,
            tee_switch: false,
            start: "2012-01-01 00:00:00".to_string(),
            time_limit_secs: None,
        }
    }
}

/// Inclusive aggregation window; a missing bound is the horizon edge.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"run.number_timesteps"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::hsnr()
    }
}

fn hsnr_technologies() -> Vec<Technology> {
    vec![
        Technology::new("lig", 20.0),
        Technology::new("nuc", 15.0),
        Technology::new("coal", 20.0),
        Technology::new("wind", 20.0).with_shape(ProfileShape::Wind),
        Technology::new("water", 20.0),
        Technology::new("biomass", 20.0),
        Technology::new("pv", 15.0)
            .with_shape(ProfileShape::Solar)
            .with_peak_divisor(0.76474),
    ]
}

fn capacities(entries: &[(&str, f64)]) -> Capacities {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

impl ScenarioConfig {
    /// Full-year national-scale system: seven technologies, gas plant and storage sizing.
    pub fn hsnr() -> Self {
        Self {
            run: RunConfig::default(),
            buses: BusLabels::default(),
            demand: DemandParams::default(),
            excess: ExcessParams::default(),
            fuel: FuelParams::default(),
            transformer: TransformerParams::default(),
            storage: StorageParams::default(),
            technologies: hsnr_technologies(),
            capacities: capacities(&[
                ("lig", 21_000.0),
                ("nuc", 12_068.0),
                ("coal", 25_000.0),
                ("wind", 31_000.0),
                ("water", 5_600.0),
                ("biomass", 6_200.0),
                ("pv", 33_000.0),
            ]),
            report: ReportConfig {
                date_from: Some("2012-01-01 00:00:00".to_string()),
                date_to: Some("2012-12-30 23:00:00".to_string()),
            },
            synthetic: SyntheticConfig::default(),
        }
    }

    /// Two-day toy system with cheap storage; solves in well under a second.
    pub fn demo() -> Self {
        Self {
            run: RunConfig {
                number_timesteps: 48,
                ..RunConfig::default()
            },
            fuel: FuelParams {
                annual_nominal_capacity: 2_000_000.0,
                summed_max: None,
                ..FuelParams::default()
            },
            transformer: TransformerParams {
                output_nominal_capacity: 500.0,
                ..TransformerParams::default()
            },
            storage: StorageParams {
                inflow_variable_cost: 0.5,
                outflow_variable_cost: 0.5,
                fixed_cost: 0.5,
                capex: 10.0,
                ..StorageParams::default()
            },
            technologies: vec![
                Technology::new("lig", 20.0),
                Technology::new("wind", 20.0).with_shape(ProfileShape::Wind),
                Technology::new("pv", 15.0)
                    .with_shape(ProfileShape::Solar)
                    .with_peak_divisor(0.76474),
            ],
            capacities: capacities(&[("lig", 40.0), ("wind", 60.0), ("pv", 250.0)]),
            report: ReportConfig::default(),
            synthetic: SyntheticConfig {
                demand_base: 100.0,
                demand_amplitude: 30.0,
                demand_noise_std: 3.0,
                ..SyntheticConfig::default()
            },
            ..Self::hsnr()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["hsnr", "demo"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "hsnr" => Ok(Self::hsnr()),
            "demo" => Ok(Self::demo()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Catalogue constants of this scenario.
    pub fn economics(&self) -> Economics {
        Economics {
            buses: self.buses.clone(),
            demand: self.demand.clone(),
            excess: self.excess.clone(),
            technologies: self.technologies.clone(),
            fuel: self.fuel.clone(),
            transformer: self.transformer.clone(),
            storage: self.storage.clone(),
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            solver_name: self.run.solver_name.clone(),
            debug: self.run.debug,
            lp_file: self.run.lp_file.clone(),
            number_timesteps: self.run.number_timesteps,
            tee_switch: self.run.tee_switch,
            time_limit: self.run.time_limit_secs.map(Duration::from_secs),
        }
    }

    /// Clock of the run, anchored at `run.start`.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::UnknownTimestamp`] if `run.start` does not parse.
    pub fn time_index(&self) -> Result<TimeIndex, RangeError> {
        let start: NaiveDateTime = TimeIndex::parse(&self.run.start)?;
        Ok(TimeIndex::new(start, self.run.number_timesteps))
    }

    /// Report window resolved against `index`.
    ///
    /// # Errors
    ///
    /// Returns a [`RangeError`] if a bound does not parse, is off the index,
    /// or the bounds are inverted.
    pub fn report_window(&self, index: &TimeIndex) -> Result<Window, RangeError> {
        let from = match &self.report.date_from {
            Some(text) => TimeIndex::parse(text)?,
            None => index.start(),
        };
        let to = match &self.report.date_to {
            Some(text) => TimeIndex::parse(text)?,
            None => index.timestamp(index.len().saturating_sub(1)),
        };
        Window::from_timestamps(index, from, to)
    }

    /// Synthetic time series covering the configured horizon.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the synthetic parameters are invalid.
    pub fn synthetic_table(&self) -> Result<TimeSeriesTable, ConfigurationError> {
        generate_table(
            &self.synthetic,
            &self.demand.column,
            &self.technologies,
            self.run.number_timesteps,
        )
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let r = &self.run;
        if r.number_timesteps == 0 {
            errors.push(ConfigError::new("run.number_timesteps", "must be > 0"));
        }
        let solvers = available_solvers();
        if !solvers.iter().any(|s| s.eq_ignore_ascii_case(&r.solver_name)) {
            errors.push(ConfigError::new(
                "run.solver_name",
                format!(
                    "\"{}\" is not available, compiled in: {}",
                    r.solver_name,
                    solvers.join(", ")
                ),
            ));
        }
        if TimeIndex::parse(&r.start).is_err() {
            errors.push(ConfigError::new(
                "run.start",
                format!("\"{}\" is not a YYYY-MM-DD HH:MM:SS timestamp", r.start),
            ));
        }

        let mut bounds = Vec::new();
        for (field, value) in [
            ("report.date_from", &self.report.date_from),
            ("report.date_to", &self.report.date_to),
        ] {
            if let Some(text) = value {
                match TimeIndex::parse(text) {
                    Ok(ts) => bounds.push(ts),
                    Err(_) => errors.push(ConfigError::new(
                        field,
                        format!("\"{text}\" is not a YYYY-MM-DD HH:MM:SS timestamp"),
                    )),
                }
            }
        }
        if let [from, to] = bounds[..] {
            if from > to {
                errors.push(ConfigError::new(
                    "report.date_from",
                    "must not be after report.date_to",
                ));
            }
        }

        if self.buses.electricity == self.buses.fuel {
            errors.push(ConfigError::new("buses.fuel", "must differ from buses.electricity"));
        }
        if self.demand.nominal_capacity < 0.0 {
            errors.push(ConfigError::new("demand.nominal_capacity", "must be >= 0"));
        }

        for (i, tech) in self.technologies.iter().enumerate() {
            let field = |name: &str| format!("technologies[{i}].{name}");
            if tech.name.is_empty() {
                errors.push(ConfigError::new(field("name"), "must not be empty"));
            }
            if self.technologies[..i].iter().any(|t| t.name == tech.name) {
                errors.push(ConfigError::new(
                    field("name"),
                    format!("duplicate technology \"{}\"", tech.name),
                ));
            }
            if tech.peak_divisor <= 0.0 {
                errors.push(ConfigError::new(field("peak_divisor"), "must be > 0"));
            }
            if tech.fixed_cost < 0.0 || tech.variable_cost < 0.0 {
                errors.push(ConfigError::new(field("fixed_cost"), "costs must be >= 0"));
            }
            if tech.enabled {
                match self.capacities.get(&tech.name) {
                    None => errors.push(ConfigError::new(
                        format!("capacities.{}", tech.name),
                        "missing for an enabled technology",
                    )),
                    Some(c) if *c < 0.0 => errors.push(ConfigError::new(
                        format!("capacities.{}", tech.name),
                        "must be >= 0",
                    )),
                    Some(_) => {}
                }
            }
        }

        let f = &self.fuel;
        if f.annual_nominal_capacity < 0.0 {
            errors.push(ConfigError::new("fuel.annual_nominal_capacity", "must be >= 0"));
        }
        if f.summed_max.is_some_and(|s| s < 0.0) {
            errors.push(ConfigError::new("fuel.summed_max", "must be >= 0"));
        }

        let t = &self.transformer;
        if t.conversion_factor <= 0.0 {
            errors.push(ConfigError::new("transformer.conversion_factor", "must be > 0"));
        }
        if t.output_nominal_capacity < 0.0 {
            errors.push(ConfigError::new("transformer.output_nominal_capacity", "must be >= 0"));
        }

        let st = &self.storage;
        for (field, value) in [
            ("storage.inflow_efficiency", st.inflow_efficiency),
            ("storage.outflow_efficiency", st.outflow_efficiency),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                errors.push(ConfigError::new(field, "must be in (0.0, 1.0]"));
            }
        }
        for (field, value) in [
            ("storage.input_capacity_ratio", st.input_capacity_ratio),
            ("storage.output_capacity_ratio", st.output_capacity_ratio),
        ] {
            if value <= 0.0 {
                errors.push(ConfigError::new(field, "must be > 0"));
            }
        }
        if !(0.0..1.0).contains(&st.capacity_loss) {
            errors.push(ConfigError::new("storage.capacity_loss", "must be in [0.0, 1.0)"));
        }
        if st.lifetime_years == 0 {
            errors.push(ConfigError::new("storage.lifetime_years", "must be > 0"));
        }
        if !(0.0..1.0).contains(&st.wacc) {
            errors.push(ConfigError::new("storage.wacc", "must be in [0.0, 1.0)"));
        }
        if st.capex < 0.0 || st.fixed_cost < 0.0 {
            errors.push(ConfigError::new("storage.capex", "costs must be >= 0"));
        }
        if st.inflow_variable_cost < 0.0 || st.outflow_variable_cost < 0.0 {
            errors.push(ConfigError::new(
                "storage.inflow_variable_cost",
                "variable costs must be >= 0",
            ));
        }

        let sy = &self.synthetic;
        if sy.steps_per_day == 0 {
            errors.push(ConfigError::new("synthetic.steps_per_day", "must be > 0"));
        }
        if sy.sunrise_idx >= sy.sunset_idx {
            errors.push(ConfigError::new(
                "synthetic.sunrise_idx",
                "must be < synthetic.sunset_idx",
            ));
        }
        if sy.steps_per_day > 0 && sy.sunset_idx > sy.steps_per_day {
            errors.push(ConfigError::new(
                "synthetic.sunset_idx",
                "must be <= synthetic.steps_per_day",
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name).ok();
            let errors = cfg.map(|c| c.validate()).unwrap_or_default();
            assert!(errors.is_empty(), "{name} should be valid: {errors:?}");
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err_and(|e| e.message.contains("unknown preset")));
    }

    #[test]
    fn hsnr_matches_reference_values() {
        let cfg = ScenarioConfig::hsnr();
        assert_eq!(cfg.capacities.get("nuc"), Some(&12_068.0));
        assert_eq!(cfg.technologies.len(), 7);
        assert_eq!(cfg.transformer.conversion_factor, 0.58);
        assert_eq!(cfg.storage.outflow_efficiency, 0.8);
        assert_eq!(cfg.run.number_timesteps, 8760);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[run]
solver_name = "microlp"
number_timesteps = 24
debug = true
lp_file = "out/model.lp"

[storage]
inflow_variable_cost = 10e10
outflow_variable_cost = 10e10
maximum = 5000.0

[[technologies]]
name = "wind"
fixed_cost = 20.0
shape = "wind"

[[technologies]]
name = "pv"
column = "pv_ground"
fixed_cost = 15.0
peak_divisor = 0.76474
shape = "solar"

[[technologies]]
name = "coal"
enabled = false

[capacities]
wind = 100.0
pv = 50.0

[report]
date_from = "2012-01-01 06:00:00"
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.run.number_timesteps), Some(24));
        assert_eq!(cfg.as_ref().map(|c| c.storage.maximum), Some(Some(5000.0)));
        assert_eq!(cfg.as_ref().map(|c| c.technologies.len()), Some(3));
        assert_eq!(
            cfg.as_ref().map(|c| c.technologies[1].column()),
            Some("pv_ground")
        );
        assert_eq!(cfg.as_ref().map(|c| c.technologies[2].enabled), Some(false));
        // untouched sections keep preset values
        assert_eq!(cfg.as_ref().map(|c| c.transformer.variable_cost), Some(50.0));
        assert!(cfg.is_some_and(|c| c.validate().is_empty()));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[run]
number_timesteps = 24
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_zero_timesteps() {
        let mut cfg = ScenarioConfig::demo();
        cfg.run.number_timesteps = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "run.number_timesteps"));
    }

    #[test]
    fn validation_catches_unknown_solver() {
        let mut cfg = ScenarioConfig::demo();
        cfg.run.solver_name = "gurobi".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "run.solver_name"));
    }

    #[test]
    fn validation_catches_missing_capacity() {
        let mut cfg = ScenarioConfig::demo();
        cfg.capacities.remove("pv");
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "capacities.pv"));
    }

    #[test]
    fn validation_ignores_capacity_of_disabled_technology() {
        let mut cfg = ScenarioConfig::demo();
        cfg.capacities.remove("pv");
        cfg.technologies[2].enabled = false;
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validation_catches_bad_efficiency() {
        let mut cfg = ScenarioConfig::demo();
        cfg.storage.outflow_efficiency = 1.5;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "storage.outflow_efficiency"));
    }

    #[test]
    fn validation_catches_inverted_report_window() {
        let mut cfg = ScenarioConfig::demo();
        cfg.report.date_from = Some("2012-01-02 00:00:00".into());
        cfg.report.date_to = Some("2012-01-01 00:00:00".into());
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "report.date_from"));
    }

    #[test]
    fn validation_catches_duplicate_technology() {
        let mut cfg = ScenarioConfig::demo();
        cfg.technologies.push(Technology::new("pv", 1.0));
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "technologies[3].name"));
    }

    #[test]
    fn hsnr_report_window_covers_horizon() {
        let cfg = ScenarioConfig::hsnr();
        let window = cfg
            .time_index()
            .and_then(|index| cfg.report_window(&index));
        assert_eq!(window.map(|w| (w.from(), w.to())), Ok((0, 8759)));
    }

    #[test]
    fn open_report_window_defaults_to_horizon() {
        let cfg = ScenarioConfig::demo();
        let window = cfg
            .time_index()
            .and_then(|index| cfg.report_window(&index));
        assert_eq!(window.map(|w| w.len()), Ok(48));
    }

    #[test]
    fn synthetic_table_has_horizon_length() {
        let cfg = ScenarioConfig::demo();
        let table = cfg.synthetic_table();
        assert_eq!(table.as_ref().map(TimeSeriesTable::len), Ok(48));
        assert!(table.is_ok_and(|t| t.contains("demand_el") && t.contains("pv")));
    }
}
