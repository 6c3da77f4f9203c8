//! Hourly time series, the aligned input table, and the clock mapping dates to timesteps.

use std::collections::BTreeMap;
use std::ops::Index;

use chrono::{NaiveDateTime, TimeDelta};

use crate::error::{ConfigurationError, RangeError};

/// Timestamp format used in scenario files and on the command line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An ordered sequence of samples, one per timestep.
///
/// # Examples
///
/// ```
/// use esys_opt::timeseries::TimeSeries;
///
/// let ts = TimeSeries::from(vec![1.0, 0.0, 1.0]);
/// assert_eq!(ts.len(), 3);
/// assert_eq!(ts[2], 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries(Vec<f64>);

impl TimeSeries {
    /// A series holding `value` at every one of `len` timesteps.
    pub fn constant(value: f64, len: usize) -> Self {
        Self(vec![value; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    /// The first `len` samples, or all of them if the series is shorter.
    pub fn head(&self, len: usize) -> Self {
        Self(self.0.iter().take(len).copied().collect())
    }
}

impl From<Vec<f64>> for TimeSeries {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl FromIterator<f64> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Index<usize> for TimeSeries {
    type Output = f64;

    fn index(&self, timestep: usize) -> &f64 {
        &self.0[timestep]
    }
}

/// Column-oriented table of equally long series keyed by column name.
///
/// Every column shares one clock; inserting a column of a different length
/// is rejected instead of being truncated or padded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeriesTable {
    len: Option<usize>,
    columns: BTreeMap<String, TimeSeries>,
}

impl TimeSeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column.
    ///
    /// # Errors
    ///
    /// * [`ConfigurationError::DuplicateLabel`] if a column of that name exists
    /// * [`ConfigurationError::HorizonMismatch`] if the series length differs
    ///   from the columns already present
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        series: TimeSeries,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(ConfigurationError::DuplicateLabel { label: name });
        }
        match self.len {
            Some(expected) if expected != series.len() => {
                return Err(ConfigurationError::HorizonMismatch {
                    label: name,
                    expected,
                    actual: series.len(),
                });
            }
            Some(_) => {}
            None => self.len = Some(series.len()),
        }
        self.columns.insert(name, series);
        Ok(())
    }

    /// Builder-style variant of [`TimeSeriesTable::insert`].
    ///
    /// # Errors
    ///
    /// See [`TimeSeriesTable::insert`].
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        series: TimeSeries,
    ) -> Result<Self, ConfigurationError> {
        self.insert(name, series)?;
        Ok(self)
    }

    /// Looks up a column by its exact name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingColumn`] if no such column exists.
    pub fn column(&self, name: &str) -> Result<&TimeSeries, ConfigurationError> {
        self.columns
            .get(name)
            .ok_or_else(|| ConfigurationError::MissingColumn {
                column: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Number of rows (timesteps); zero for an empty table.
    pub fn len(&self) -> usize {
        self.len.unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// A table holding the first `len` rows of every column.
    ///
    /// Used when a run covers only the start of a longer data set.
    pub fn head(&self, len: usize) -> Self {
        let columns: BTreeMap<String, TimeSeries> = self
            .columns
            .iter()
            .map(|(name, series)| (name.clone(), series.head(len)))
            .collect();
        Self {
            len: self.len.map(|l| l.min(len)),
            columns,
        }
    }
}

/// Hourly clock anchoring timestep `0` at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeIndex {
    start: NaiveDateTime,
    len: usize,
}

impl TimeIndex {
    pub fn new(start: NaiveDateTime, len: usize) -> Self {
        Self { start, len }
    }

    /// Parses a timestamp in [`TIMESTAMP_FORMAT`].
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::UnknownTimestamp`] if the text is not a valid timestamp.
    pub fn parse(text: &str) -> Result<NaiveDateTime, RangeError> {
        NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT).map_err(|_| {
            RangeError::UnknownTimestamp {
                timestamp: text.to_string(),
            }
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Timestamp of the beginning of `timestep`.
    pub fn timestamp(&self, timestep: usize) -> NaiveDateTime {
        self.start + TimeDelta::hours(timestep as i64)
    }

    /// Timestep starting exactly at `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::UnknownTimestamp`] if `timestamp` is not on an
    /// hour boundary of this index or falls outside it.
    pub fn position(&self, timestamp: NaiveDateTime) -> Result<usize, RangeError> {
        let unknown = || RangeError::UnknownTimestamp {
            timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
        };
        let delta = timestamp - self.start;
        if delta < TimeDelta::zero() || delta.num_seconds() % 3600 != 0 {
            return Err(unknown());
        }
        let hours = usize::try_from(delta.num_hours()).map_err(|_| unknown())?;
        if hours >= self.len {
            return Err(unknown());
        }
        Ok(hours)
    }
}
