use rand::{SeedableRng, rngs::StdRng};

use super::types::{ProfileGenerator, gaussian_noise};

/// Relative wind availability following an AR(1) process around a mean.
///
/// The state evolves as:
/// ```text
/// x(t) = mean + alpha * (x(t-1) - mean) + epsilon(t)
/// ```
/// and is clamped to `[0, 1]`.
#[derive(Debug, Clone)]
pub struct WindProfile {
    pub mean: f64,
    /// Persistence in `[0, 1]`.
    pub alpha: f64,
    /// Standard deviation of the innovation.
    pub noise_std: f64,
    state: f64,
    rng: StdRng,
}

impl WindProfile {
    pub fn new(mean: f64, alpha: f64, noise_std: f64, seed: u64) -> Self {
        let mean = mean.clamp(0.0, 1.0);
        Self {
            mean,
            alpha: alpha.clamp(0.0, 1.0),
            noise_std: noise_std.max(0.0),
            state: mean,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ProfileGenerator for WindProfile {
    fn sample(&mut self, _timestep: usize) -> f64 {
        let epsilon = gaussian_noise(&mut self.rng, self.noise_std);
        self.state = (self.mean + self.alpha * (self.state - self.mean) + epsilon).clamp(0.0, 1.0);
        self.state
    }

    fn kind(&self) -> &'static str {
        "wind"
    }
}
