//! Shared pieces of the synthetic profile generators.

use rand::{Rng, rngs::StdRng};

/// A seeded generator producing one sample per hourly timestep.
pub trait ProfileGenerator {
    /// Sample at `timestep`. Generators are stateful and expect increasing timesteps.
    fn sample(&mut self, timestep: usize) -> f64;

    /// Human-readable generator name.
    fn kind(&self) -> &'static str;

    /// Collects `len` consecutive samples starting at timestep 0.
    fn generate(&mut self, len: usize) -> Vec<f64> {
        (0..len).map(|t| self.sample(t)).collect()
    }
}

/// Gaussian noise via the Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation; non-positive values yield 0
///
/// # Returns
///
/// A sample from `N(0, std_dev²)`
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Fraction of peak daylight at `timestep`, following a half-cosine arc.
///
/// Zero outside `[sunrise_idx, sunset_idx)` of each day, peaking at solar noon.
///
/// # Arguments
///
/// * `timestep` - Absolute timestep
/// * `steps_per_day` - Timesteps per day
/// * `sunrise_idx` - First daylight step of the day (inclusive)
/// * `sunset_idx` - First dark step after daylight (exclusive)
pub fn daylight_frac(timestep: usize, steps_per_day: usize, sunrise_idx: usize, sunset_idx: usize) -> f64 {
    if steps_per_day == 0 || sunrise_idx >= sunset_idx {
        return 0.0;
    }
    let step = timestep % steps_per_day;
    if step < sunrise_idx || step >= sunset_idx {
        return 0.0;
    }
    let span = (sunset_idx - sunrise_idx) as f64;
    let x = (step - sunrise_idx) as f64 + 0.5;
    (std::f64::consts::PI * x / span).sin()
}
