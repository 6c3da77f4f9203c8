use rand::{SeedableRng, rngs::StdRng};

use super::types::{ProfileGenerator, gaussian_noise};

/// Near-constant availability of dispatch-independent plants (lignite, nuclear, hydro, ...).
#[derive(Debug, Clone)]
pub struct BaseloadProfile {
    /// Mean availability in `[0, 1]`.
    pub level: f64,
    pub noise_std: f64,
    rng: StdRng,
}

impl BaseloadProfile {
    pub fn new(level: f64, noise_std: f64, seed: u64) -> Self {
        Self {
            level: level.clamp(0.0, 1.0),
            noise_std: noise_std.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ProfileGenerator for BaseloadProfile {
    fn sample(&mut self, _timestep: usize) -> f64 {
        (self.level + gaussian_noise(&mut self.rng, self.noise_std)).clamp(0.0, 1.0)
    }

    fn kind(&self) -> &'static str {
        "baseload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_without_noise() {
        let mut b = BaseloadProfile::new(0.85, 0.0, 1);
        assert_eq!(b.generate(3), vec![0.85, 0.85, 0.85]);
    }

    #[test]
    fn level_is_clamped() {
        assert_eq!(BaseloadProfile::new(1.4, 0.0, 1).level, 1.0);
    }
}
