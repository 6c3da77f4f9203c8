//! esys-opt entry point: CLI wiring, data loading and result export.

use std::process;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use esys_opt::cli::Cli;
use esys_opt::config::ScenarioConfig;
use esys_opt::error::ConfigurationError;
use esys_opt::io::export::{export_flows_csv, export_results_json};
use esys_opt::io::import::load_table;
use esys_opt::optimise::run_scenario;
use esys_opt::report::window_dates;
use esys_opt::timeseries::TimeSeriesTable;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<ScenarioConfig> {
    let mut config = if let Some(path) = &cli.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(name) = &cli.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::default()
    };

    if let Some(n) = cli.timesteps {
        config.run.number_timesteps = n;
    }
    if let Some(name) = &cli.solver {
        config.run.solver_name.clone_from(name);
    }
    if let Some(seed) = cli.seed {
        config.synthetic.seed = seed;
    }
    if let Some(from) = &cli.from {
        config.report.date_from = Some(from.clone());
    }
    if let Some(to) = &cli.to {
        config.report.date_to = Some(to.clone());
    }
    config.run.debug |= cli.debug;
    config.run.tee_switch |= cli.tee;
    Ok(config)
}

fn load_data(cli: &Cli, config: &ScenarioConfig) -> anyhow::Result<TimeSeriesTable> {
    let n = config.run.number_timesteps;
    let Some(path) = &cli.data else {
        info!(seed = config.synthetic.seed, timesteps = n, "generating synthetic profiles");
        return Ok(config.synthetic_table()?);
    };
    let table = load_table(path).with_context(|| format!("loading {}", path.display()))?;
    if table.len() > n && cli.truncate {
        warn!(rows = table.len(), timesteps = n, "data is longer than the horizon, truncating");
        return Ok(table.head(n));
    }
    if table.len() != n {
        let mismatch = ConfigurationError::HorizonMismatch {
            label: path.display().to_string(),
            expected: n,
            actual: table.len(),
        };
        if table.len() > n {
            return Err(anyhow::Error::new(mismatch)
                .context("pass --truncate to use the first rows only"));
        }
        return Err(mismatch.into());
    }
    Ok(table)
}

fn run(cli: &Cli, config: &ScenarioConfig) -> anyhow::Result<()> {
    let table = load_data(cli, config)?;
    let run = run_scenario(config, &table)?;

    let (from, to) = window_dates(&run.summary, &run.index);
    println!("Report window: {from} .. {to}");
    println!("{}", run.summary);

    if let Some(path) = &cli.flows_out {
        export_flows_csv(&run.optimisation.solved, Some(&run.index), path)
            .with_context(|| format!("writing {}", path.display()))?;
        eprintln!("Flows written to {}", path.display());
    }
    if let Some(path) = &cli.results_out {
        export_results_json(&run.summary, path)
            .with_context(|| format!("writing {}", path.display()))?;
        eprintln!("Results written to {}", path.display());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    if let Err(e) = run(&cli, &config) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
