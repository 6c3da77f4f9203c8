//! End-to-end run: catalogue, compile, solve, aggregate.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::ScenarioConfig;
use crate::error::{ConfigurationError, Result};
use crate::lp::writer::write_lp;
use crate::model::Model;
use crate::model::builder::{CompiledModel, compile};
use crate::model::catalogue::{Capacities, Economics, build_catalogue};
use crate::results::{ResultAggregator, ResultSummary, SolvedModel};
use crate::solver::{self, SolveOptions, Solver, solver_by_name};
use crate::timeseries::{TimeIndex, TimeSeriesTable};

/// Switches of one optimisation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub solver_name: String,
    /// Write the compiled LP to `lp_file` before solving.
    pub debug: bool,
    pub lp_file: PathBuf,
    pub number_timesteps: usize,
    pub tee_switch: bool,
    pub time_limit: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            solver_name: "microlp".to_string(),
            debug: false,
            lp_file: PathBuf::from("lp_files/model.lp"),
            number_timesteps: 8760,
            tee_switch: false,
            time_limit: None,
        }
    }
}

/// A solved model together with the program it was solved from.
#[derive(Debug, Clone)]
pub struct Optimisation {
    pub model: Model,
    pub compiled: CompiledModel,
    pub solved: SolvedModel,
}

/// Compiles and solves `model` with `solver`.
///
/// # Errors
///
/// * [`ConfigurationError::HorizonMismatch`] if the model horizon differs from
///   `options.number_timesteps`
/// * [`crate::error::Error::Io`] if the debug LP file cannot be written
/// * [`crate::error::SolveError`] for any non-optimal termination
pub fn optimise(model: Model, options: &RunOptions, solver: &dyn Solver) -> Result<Optimisation> {
    if model.timesteps() != options.number_timesteps {
        return Err(ConfigurationError::HorizonMismatch {
            label: "model".to_string(),
            expected: options.number_timesteps,
            actual: model.timesteps(),
        }
        .into());
    }

    let compiled = compile(&model);
    if options.debug {
        write_lp(&compiled.program, &options.lp_file)?;
        info!(path = %options.lp_file.display(), "lp file written");
    }

    let solve_options = SolveOptions {
        tee: options.tee_switch,
        time_limit: options.time_limit,
    };
    let outcome = solver::solve(solver, &compiled.program, &solve_options)?;
    let solved = SolvedModel::from_solution(&model, &compiled, &outcome);
    Ok(Optimisation {
        model,
        compiled,
        solved,
    })
}

/// Builds the catalogue for `time_series` and sizes its storage at minimum cost.
///
/// # Errors
///
/// Any catalogue [`ConfigurationError`], an unknown `options.solver_name`,
/// or the errors of [`optimise`].
pub fn optimise_storage_size(
    time_series: &TimeSeriesTable,
    capacities: &Capacities,
    economics: &Economics,
    options: &RunOptions,
) -> Result<Optimisation> {
    let solver = solver_by_name(&options.solver_name)?;
    let model = build_catalogue(time_series, capacities, economics, options.number_timesteps)?;
    let optimisation = optimise(model, options, solver.as_ref())?;
    info!(
        storage_cap = optimisation.solved.storage_capacity(),
        objective = optimisation.solved.objective(),
        "storage sized"
    );
    Ok(optimisation)
}

/// Output of [`run_scenario`].
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub optimisation: Optimisation,
    pub index: TimeIndex,
    pub summary: ResultSummary,
}

/// Runs `config` against `time_series` and aggregates over its report window.
///
/// The table must cover exactly `run.number_timesteps` rows.
///
/// # Errors
///
/// Any error of [`optimise_storage_size`], or a [`crate::error::RangeError`]
/// when the report window does not fit the time index.
pub fn run_scenario(config: &ScenarioConfig, time_series: &TimeSeriesTable) -> Result<ScenarioRun> {
    let economics = config.economics();
    let options = config.run_options();
    let index = config.time_index()?;
    let window = config.report_window(&index)?;

    let optimisation =
        optimise_storage_size(time_series, &config.capacities, &economics, &options)?;

    let mut aggregator = ResultAggregator::new(&optimisation.solved, window)?;
    for (label, divisor) in economics.peak_divisors() {
        aggregator = aggregator.with_peak_divisor(label, divisor);
    }
    let summary = aggregator.summary(&economics.report_labels());
    if summary.storage_cap <= 0.0 && economics.storage.enabled {
        warn!("storage was not built, investment does not pay off in this scenario");
    }

    Ok(ScenarioRun {
        optimisation,
        index,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lp::LinearProgram;
    use crate::model::{Bus, Component, Flow, Sink, SinkKind, Source};
    use crate::solver::{SolveStatus, SolverOutcome};
    use crate::timeseries::TimeSeries;

    struct Zero;

    impl Solver for Zero {
        fn name(&self) -> &str {
            "zero"
        }

        fn solve(&self, program: &LinearProgram, _options: &SolveOptions) -> SolverOutcome {
            SolverOutcome {
                status: SolveStatus::Optimal,
                values: vec![0.0; program.num_variables()],
                objective_value: 0.0,
                message: String::new(),
            }
        }
    }

    fn model(len: usize) -> Model {
        let mut model = Model::new(len);
        model.add_bus(Bus::new("el")).expect("bus");
        model
            .add_component(Component::Source(Source {
                label: "gen".into(),
                output: Flow::new("el").with_nominal_capacity(10.0),
            }))
            .expect("source");
        model
            .add_component(Component::Sink(Sink {
                label: "load".into(),
                input: Flow::new("el")
                    .with_nominal_capacity(1.0)
                    .with_fixed_profile(TimeSeries::constant(0.0, len)),
                kind: SinkKind::Demand,
            }))
            .expect("sink");
        model
    }

    #[test]
    fn horizon_must_match_options() {
        let options = RunOptions {
            number_timesteps: 5,
            ..RunOptions::default()
        };
        let result = optimise(model(4), &options, &Zero);
        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigurationError::HorizonMismatch { expected: 5, actual: 4, .. }))
        ));
    }

    #[test]
    fn debug_writes_lp_file() {
        let dir = std::env::temp_dir().join(format!("esys-opt-optimise-{}", std::process::id()));
        let path = dir.join("nested").join("model.lp");
        let options = RunOptions {
            number_timesteps: 3,
            debug: true,
            lp_file: path.clone(),
            ..RunOptions::default()
        };
        let run = optimise(model(3), &options, &Zero);
        assert!(run.is_ok());
        let text = std::fs::read_to_string(&path).unwrap_or_default();
        assert!(text.contains("balance_el_0"));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn unknown_solver_is_configuration_error() {
        let options = RunOptions {
            solver_name: "cplex".into(),
            number_timesteps: 48,
            ..RunOptions::default()
        };
        let cfg = ScenarioConfig::demo();
        let table = cfg.synthetic_table().expect("synthetic");
        let result = optimise_storage_size(&table, &cfg.capacities, &cfg.economics(), &options);
        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigurationError::UnknownSolver { .. }))
        ));
    }
}
