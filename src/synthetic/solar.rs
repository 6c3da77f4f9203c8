use rand::{SeedableRng, rngs::StdRng};

use super::types::{ProfileGenerator, daylight_frac, gaussian_noise};

/// Relative solar availability in `[0, 1]`: a half-cosine daylight arc with
/// multiplicative noise.
#[derive(Debug, Clone)]
pub struct SolarProfile {
    steps_per_day: usize,
    /// First daylight step of the day (inclusive).
    pub sunrise_idx: usize,
    /// First dark step after daylight (exclusive).
    pub sunset_idx: usize,
    /// Relative noise, e.g. `0.05` for about ±5 %.
    pub noise_std: f64,
    rng: StdRng,
}

impl SolarProfile {
    /// Returns `None` unless `sunrise_idx < sunset_idx <= steps_per_day`.
    pub fn new(
        sunrise_idx: usize,
        sunset_idx: usize,
        noise_std: f64,
        steps_per_day: usize,
        seed: u64,
    ) -> Option<Self> {
        if sunrise_idx >= sunset_idx || sunset_idx > steps_per_day {
            return None;
        }
        Some(Self {
            steps_per_day,
            sunrise_idx,
            sunset_idx,
            noise_std: noise_std.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl ProfileGenerator for SolarProfile {
    fn sample(&mut self, timestep: usize) -> f64 {
        let frac = daylight_frac(timestep, self.steps_per_day, self.sunrise_idx, self.sunset_idx);
        if frac <= 0.0 {
            return 0.0;
        }
        let noise = 1.0 + gaussian_noise(&mut self.rng, self.noise_std);
        (frac * noise).clamp(0.0, 1.0)
    }

    fn kind(&self) -> &'static str {
        "solar"
    }
}
