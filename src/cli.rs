use std::path::PathBuf;

use clap::Parser;

/// Cost-minimal dispatch and storage sizing for a single-node energy system.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Scenario TOML file.
    #[clap(long, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Built-in scenario: `hsnr` or `demo`.
    #[clap(long)]
    pub preset: Option<String>,

    /// Time-series CSV with a demand column and one availability column per technology.
    ///
    /// Without it, seeded synthetic profiles are generated.
    #[clap(long, env = "ESYS_DATA")]
    pub data: Option<PathBuf>,

    /// Keep only the first `run.number_timesteps` rows of a longer `--data` table.
    ///
    /// Without it a table of a different length is rejected.
    #[clap(long, requires = "data")]
    pub truncate: bool,

    /// Override `run.number_timesteps`.
    #[clap(long)]
    pub timesteps: Option<usize>,

    /// Override `run.solver_name`.
    #[clap(long, env = "ESYS_SOLVER")]
    pub solver: Option<String>,

    /// Write the compiled LP to `run.lp_file`.
    #[clap(long)]
    pub debug: bool,

    /// Log solver statistics.
    #[clap(long)]
    pub tee: bool,

    /// Report window start, `YYYY-MM-DD HH:MM:SS`.
    #[clap(long)]
    pub from: Option<String>,

    /// Report window end (inclusive), `YYYY-MM-DD HH:MM:SS`.
    #[clap(long)]
    pub to: Option<String>,

    /// Seed of the synthetic profiles.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Per-timestep flows CSV.
    #[clap(long = "flows-out")]
    pub flows_out: Option<PathBuf>,

    /// Result mapping JSON.
    #[clap(long = "results-out")]
    pub results_out: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("esys-opt").chain(args.iter().copied()))
    }

    #[test]
    fn no_args() {
        let cli = parse(&[]).expect("empty args are valid");
        assert!(cli.scenario.is_none());
        assert!(cli.preset.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn preset_with_overrides() {
        let cli = parse(&[
            "--preset",
            "demo",
            "--timesteps",
            "24",
            "--seed",
            "7",
            "--from",
            "2012-01-01 03:00:00",
            "--results-out",
            "out.json",
        ])
        .expect("valid");
        assert_eq!(cli.preset.as_deref(), Some("demo"));
        assert_eq!(cli.timesteps, Some(24));
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.from.as_deref(), Some("2012-01-01 03:00:00"));
        assert_eq!(cli.results_out, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn truncate_needs_data() {
        assert!(parse(&["--truncate"]).is_err());
        let cli = parse(&["--data", "day.csv", "--truncate"]).expect("valid");
        assert!(cli.truncate);
    }

    #[test]
    fn scenario_conflicts_with_preset() {
        assert!(parse(&["--scenario", "a.toml", "--preset", "demo"]).is_err());
    }

    #[test]
    fn timesteps_must_be_number() {
        assert!(parse(&["--timesteps", "many"]).is_err());
    }

    #[test]
    fn unknown_flag_rejected() {
        assert!(parse(&["--bogus"]).is_err());
    }
}
