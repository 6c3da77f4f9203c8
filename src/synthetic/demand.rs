use rand::{SeedableRng, rngs::StdRng};

use super::types::{ProfileGenerator, gaussian_noise};

/// Daily electricity demand as a sinusoid around a base level with Gaussian noise.
///
/// # Examples
///
/// ```
/// use esys_opt::synthetic::{DemandProfile, ProfileGenerator};
///
/// let mut demand = DemandProfile::new(60_000.0, 12_000.0, 1.2, 500.0, 24, 42);
/// let day = demand.generate(24);
/// assert!(day.iter().all(|v| *v >= 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct DemandProfile {
    /// Mean demand.
    pub base: f64,
    /// Amplitude of the daily swing.
    pub amplitude: f64,
    /// Phase offset in radians.
    pub phase_rad: f64,
    pub noise_std: f64,
    steps_per_day: usize,
    rng: StdRng,
}

impl DemandProfile {
    /// # Arguments
    ///
    /// * `base` - Mean demand
    /// * `amplitude` - Daily swing around the mean
    /// * `phase_rad` - Phase offset (0 = minimum at the start of the day)
    /// * `noise_std` - Standard deviation of additive noise
    /// * `steps_per_day` - Timesteps per day
    /// * `seed` - Random seed
    pub fn new(
        base: f64,
        amplitude: f64,
        phase_rad: f64,
        noise_std: f64,
        steps_per_day: usize,
        seed: u64,
    ) -> Self {
        Self {
            base,
            amplitude,
            phase_rad,
            noise_std,
            steps_per_day: steps_per_day.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ProfileGenerator for DemandProfile {
    /// Never negative.
    fn sample(&mut self, timestep: usize) -> f64 {
        let day_pos = (timestep % self.steps_per_day) as f64 / self.steps_per_day as f64;
        let angle = 2.0 * std::f64::consts::PI * day_pos + self.phase_rad;
        let value = self.base - self.amplitude * angle.cos() + gaussian_noise(&mut self.rng, self.noise_std);
        value.max(0.0)
    }

    fn kind(&self) -> &'static str {
        "demand"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noiseless_profile_is_periodic() {
        let mut d = DemandProfile::new(10.0, 4.0, 0.0, 0.0, 24, 1);
        let v = d.generate(48);
        for t in 0..24 {
            assert!((v[t] - v[t + 24]).abs() < 1e-9);
        }
        // minimum at midnight for zero phase
        assert!((v[0] - 6.0).abs() < 1e-9);
        assert!((v[12] - 14.0).abs() < 1e-9);
    }

    #[test]
    fn clamped_at_zero() {
        let mut d = DemandProfile::new(1.0, 5.0, 0.0, 0.0, 24, 1);
        assert_eq!(d.sample(0), 0.0);
    }

    #[test]
    fn same_seed_same_series() {
        let a = DemandProfile::new(10.0, 2.0, 1.0, 0.5, 24, 7).generate(100);
        let b = DemandProfile::new(10.0, 2.0, 1.0, 0.5, 24, 7).generate(100);
        assert_eq!(a, b);
    }
}
