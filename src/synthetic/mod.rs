//! Seeded synthetic time series for runs without measured data.
//!
//! [`generate_table`] produces a demand column plus one availability column
//! per technology, shaped by the technology's [`ProfileShape`]. The same
//! configuration and seed always give the same table.

pub mod baseload;
pub mod demand;
pub mod solar;
pub mod types;
pub mod wind;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigurationError;
use crate::model::catalogue::{ProfileShape, Technology};
use crate::timeseries::{TimeSeries, TimeSeriesTable};

pub use baseload::BaseloadProfile;
pub use demand::DemandProfile;
pub use solar::SolarProfile;
pub use types::{ProfileGenerator, daylight_frac, gaussian_noise};
pub use wind::WindProfile;

/// Parameters of the synthetic generators.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticConfig {
    /// Master seed; column `i` uses `seed + i`.
    pub seed: u64,
    pub steps_per_day: usize,
    pub demand_base: f64,
    pub demand_amplitude: f64,
    pub demand_phase_rad: f64,
    pub demand_noise_std: f64,
    pub sunrise_idx: usize,
    pub sunset_idx: usize,
    pub solar_noise_std: f64,
    pub wind_mean: f64,
    pub wind_alpha: f64,
    pub wind_noise_std: f64,
    pub baseload_level: f64,
    pub baseload_noise_std: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps_per_day: 24,
            demand_base: 60_000.0,
            demand_amplitude: 12_000.0,
            demand_phase_rad: 1.2,
            demand_noise_std: 1_500.0,
            sunrise_idx: 6,
            sunset_idx: 20,
            solar_noise_std: 0.1,
            wind_mean: 0.25,
            wind_alpha: 0.9,
            wind_noise_std: 0.08,
            baseload_level: 0.8,
            baseload_noise_std: 0.02,
        }
    }
}

/// Builds a table with `demand_column` and one column per technology.
///
/// Disabled technologies get a column too, so toggling `enabled` does not
/// shift the seeds of the others. Technologies reading the same column
/// share the profile generated for the first of them.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidParameter`] if the daylight window
/// does not fit into a day.
pub fn generate_table(
    config: &SyntheticConfig,
    demand_column: &str,
    technologies: &[Technology],
    len: usize,
) -> Result<TimeSeriesTable, ConfigurationError> {
    let mut table = TimeSeriesTable::new();
    let mut demand = DemandProfile::new(
        config.demand_base,
        config.demand_amplitude,
        config.demand_phase_rad,
        config.demand_noise_std,
        config.steps_per_day,
        config.seed,
    );
    table.insert(demand_column, TimeSeries::from(demand.generate(len)))?;

    for (i, tech) in technologies.iter().enumerate() {
        if table.contains(tech.column()) {
            debug!(column = tech.column(), technology = %tech.name, "column shared, already generated");
            continue;
        }
        let seed = config.seed.wrapping_add(i as u64 + 1);
        let mut generator: Box<dyn ProfileGenerator> = match tech.shape {
            ProfileShape::Baseload => Box::new(BaseloadProfile::new(
                config.baseload_level,
                config.baseload_noise_std,
                seed,
            )),
            ProfileShape::Solar => Box::new(
                SolarProfile::new(
                    config.sunrise_idx,
                    config.sunset_idx,
                    config.solar_noise_std,
                    config.steps_per_day,
                    seed,
                )
                .ok_or_else(|| {
                    ConfigurationError::invalid(
                        "synthetic",
                        "sunrise_idx must be < sunset_idx <= steps_per_day",
                    )
                })?,
            ),
            ProfileShape::Wind => Box::new(WindProfile::new(
                config.wind_mean,
                config.wind_alpha,
                config.wind_noise_std,
                seed,
            )),
        };
        debug!(column = tech.column(), generator = generator.kind(), "synthetic column");
        table.insert(tech.column(), TimeSeries::from(generator.generate(len)))?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn techs() -> Vec<Technology> {
        vec![
            Technology::new("lig", 20.0),
            Technology::new("wind", 20.0).with_shape(ProfileShape::Wind),
            Technology::new("pv", 15.0).with_shape(ProfileShape::Solar),
        ]
    }

    #[test]
    fn table_has_all_columns_with_length() {
        let table = generate_table(&SyntheticConfig::default(), "demand_el", &techs(), 48)
            .expect("valid config");
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["demand_el", "lig", "pv", "wind"]);
        assert_eq!(table.len(), 48);
    }

    #[test]
    fn availabilities_in_unit_interval() {
        let table = generate_table(&SyntheticConfig::default(), "demand_el", &techs(), 200)
            .expect("valid config");
        for name in ["lig", "wind", "pv"] {
            let col = table.column(name).expect("present");
            assert!(col.iter().all(|v| (0.0..=1.0).contains(&v)), "{name}");
        }
    }

    #[test]
    fn deterministic_for_seed() {
        let cfg = SyntheticConfig::default();
        let a = generate_table(&cfg, "demand_el", &techs(), 72).expect("valid");
        let b = generate_table(&cfg, "demand_el", &techs(), 72).expect("valid");
        assert_eq!(a, b);
        let other = SyntheticConfig {
            seed: 7,
            ..SyntheticConfig::default()
        };
        let c = generate_table(&other, "demand_el", &techs(), 72).expect("valid");
        assert_ne!(a, c);
    }

    #[test]
    fn shared_column_generated_once() {
        let mut techs = techs();
        techs.push(Technology {
            column: Some("pv".into()),
            ..Technology::new("pv_roof", 10.0)
        });
        let table = generate_table(&SyntheticConfig::default(), "demand_el", &techs, 24)
            .expect("shared column is fine");
        assert_eq!(table.column_names().count(), 4);
    }

    #[test]
    fn bad_daylight_window_rejected() {
        let cfg = SyntheticConfig {
            sunrise_idx: 20,
            sunset_idx: 6,
            ..SyntheticConfig::default()
        };
        assert!(generate_table(&cfg, "demand_el", &techs(), 24).is_err());
    }
}
