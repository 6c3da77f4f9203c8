//! Capacity investment decisions and their annualised cost.

use crate::error::ConfigurationError;

/// Capacity recovery factor turning a one-off payment into an annuity.
///
/// Returns `rate × (1+rate)^lifetime / ((1+rate)^lifetime − 1)`, falling back
/// to straight-line `1 / lifetime` when `rate` is zero.
///
/// # Arguments
///
/// * `lifetime_years` - Economic lifetime (must be > 0)
/// * `rate` - Discount rate per year (e.g. `0.05`)
pub fn capital_recovery_factor(lifetime_years: u32, rate: f64) -> f64 {
    if lifetime_years == 0 {
        return 0.0;
    }
    if rate == 0.0 {
        return 1.0 / f64::from(lifetime_years);
    }
    let factor = (1.0 + rate).powi(lifetime_years as i32);
    rate * factor / (factor - 1.0)
}

/// A decision variable for a component's capacity.
///
/// The optimiser chooses the capacity; the objective is charged
/// `ep_costs × chosen_capacity`.
///
/// # Examples
///
/// ```
/// use esys_opt::model::Investment;
///
/// let inv = Investment::from_annuity(1000.0, 20, 0.05).expect("valid parameters");
/// assert!((inv.ep_costs - 80.2426).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Investment {
    /// Equivalent periodic cost per unit of capacity.
    pub ep_costs: f64,
    /// Optional upper limit on the invested capacity.
    pub maximum: Option<f64>,
}

impl Investment {
    pub fn new(ep_costs: f64) -> Self {
        Self {
            ep_costs,
            maximum: None,
        }
    }

    /// Derives the equivalent periodic cost from capital cost, lifetime and discount rate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidParameter`] for a zero lifetime, a
    /// negative capital cost or a discount rate outside `[0, 1)`.
    pub fn from_annuity(capex: f64, lifetime_years: u32, rate: f64) -> Result<Self, ConfigurationError> {
        if lifetime_years == 0 {
            return Err(ConfigurationError::invalid("investment", "lifetime must be > 0"));
        }
        if !(capex.is_finite() && capex >= 0.0) {
            return Err(ConfigurationError::invalid("investment", "capex must be >= 0"));
        }
        if !(0.0..1.0).contains(&rate) {
            return Err(ConfigurationError::invalid(
                "investment",
                "discount rate must be in [0, 1)",
            ));
        }
        Ok(Self::new(capex * capital_recovery_factor(lifetime_years, rate)))
    }

    /// Caps the capacity the optimiser may choose.
    pub fn with_maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annuity_matches_closed_form() {
        // 1000 * 0.05 * 1.05^20 / (1.05^20 - 1)
        let f = 1.05_f64.powi(20);
        let expected = 1000.0 * 0.05 * f / (f - 1.0);
        let inv = Investment::from_annuity(1000.0, 20, 0.05).expect("valid");
        assert!((inv.ep_costs - expected).abs() < 1e-9);
        assert!(inv.maximum.is_none());
    }

    #[test]
    fn zero_rate_is_straight_line() {
        assert_eq!(capital_recovery_factor(10, 0.0), 0.1);
    }

    #[test]
    fn zero_lifetime_rejected() {
        assert!(Investment::from_annuity(1000.0, 0, 0.05).is_err());
    }

    #[test]
    fn negative_rate_rejected() {
        assert!(Investment::from_annuity(1000.0, 20, -0.01).is_err());
    }

    #[test]
    fn maximum_is_kept() {
        let inv = Investment::new(12.0).with_maximum(500.0);
        assert_eq!(inv.maximum, Some(500.0));
    }
}
