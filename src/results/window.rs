//! Inclusive timestep windows for result queries.

use std::ops::RangeInclusive;

use chrono::NaiveDateTime;

use crate::error::RangeError;
use crate::timeseries::TimeIndex;

/// An inclusive range `[from, to]` of timesteps inside a solved horizon.
///
/// # Examples
///
/// ```
/// use esys_opt::results::Window;
///
/// let w = Window::new(2, 5, 10).expect("inside the horizon");
/// assert_eq!(w.len(), 4);
/// assert!(Window::new(2, 10, 10).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    from: usize,
    to: usize,
}

impl Window {
    /// # Errors
    ///
    /// Returns [`RangeError::Inverted`] if `from > to` and
    /// [`RangeError::OutsideHorizon`] if `to >= horizon`.
    pub fn new(from: usize, to: usize, horizon: usize) -> Result<Self, RangeError> {
        if from > to {
            return Err(RangeError::Inverted { from, to });
        }
        if to >= horizon {
            return Err(RangeError::OutsideHorizon { from, to, horizon });
        }
        Ok(Self { from, to })
    }

    /// The whole horizon `[0, horizon - 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::OutsideHorizon`] for an empty horizon.
    pub fn full(horizon: usize) -> Result<Self, RangeError> {
        match horizon.checked_sub(1) {
            Some(last) => Self::new(0, last, horizon),
            None => Err(RangeError::OutsideHorizon {
                from: 0,
                to: 0,
                horizon,
            }),
        }
    }

    /// Window between two timestamps of `index`, both inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::UnknownTimestamp`] if either timestamp is not on
    /// the index, or [`RangeError::Inverted`] if `from` is after `to`.
    pub fn from_timestamps(
        index: &TimeIndex,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Self, RangeError> {
        let from = index.position(from)?;
        let to = index.position(to)?;
        Self::new(from, to, index.len())
    }

    pub fn from(&self) -> usize {
        self.from
    }

    pub fn to(&self) -> usize {
        self.to
    }

    pub fn len(&self) -> usize {
        self.to - self.from + 1
    }

    /// Always false; a window holds at least one timestep.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn range(&self) -> RangeInclusive<usize> {
        self.from..=self.to
    }

    /// Checks the window against a horizon it was not built for.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::OutsideHorizon`] if the window ends at or after `horizon`.
    pub fn check(&self, horizon: usize) -> Result<(), RangeError> {
        if self.to >= horizon {
            return Err(RangeError::OutsideHorizon {
                from: self.from,
                to: self.to,
                horizon,
            });
        }
        Ok(())
    }
}
