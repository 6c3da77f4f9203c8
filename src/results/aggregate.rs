//! Windowed energy sums and peaks per component.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::RangeError;

use super::{SolvedModel, Window};

/// Energy sum and peak of one component over a window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowSummary {
    /// Σ flow over the window (MWh for hourly steps).
    pub sum: f64,
    /// Maximum flow over the window, divided by the component's peak divisor.
    pub peak: f64,
}

/// Computes [`FlowSummary`] values from a [`SolvedModel`] over one [`Window`].
///
/// Components that were never built aggregate to zero.
#[derive(Debug, Clone)]
pub struct ResultAggregator<'a> {
    solved: &'a SolvedModel,
    window: Window,
    divisors: BTreeMap<String, f64>,
}

impl<'a> ResultAggregator<'a> {
    /// # Errors
    ///
    /// Returns [`RangeError::OutsideHorizon`] if the window does not fit the
    /// solved horizon.
    pub fn new(solved: &'a SolvedModel, window: Window) -> Result<Self, RangeError> {
        window.check(solved.horizon())?;
        Ok(Self {
            solved,
            window,
            divisors: BTreeMap::new(),
        })
    }

    /// Divides the reported peak of `label` by `divisor`.
    ///
    /// Used to turn the apparent peak of a clipped profile back into rated capacity.
    pub fn with_peak_divisor(mut self, label: impl Into<String>, divisor: f64) -> Self {
        self.divisors.insert(label.into(), divisor);
        self
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Sum and peak of the primary flow of `label`.
    pub fn summarize(&self, label: &str) -> FlowSummary {
        let Some(series) = self.solved.primary_flow(label) else {
            debug!(component = label, "not in the solved model, reporting zero");
            return FlowSummary::default();
        };
        let window = &series[self.window.range()];
        let sum: f64 = window.iter().sum();
        let peak = window.iter().copied().fold(0.0, f64::max);
        let divisor = self.divisors.get(label).copied().unwrap_or(1.0);
        FlowSummary {
            sum,
            peak: peak / divisor,
        }
    }

    pub fn storage_capacity(&self) -> f64 {
        self.solved.storage_capacity()
    }

    pub fn objective(&self) -> f64 {
        self.solved.objective()
    }

    /// Summaries for `labels` in the given order plus storage capacity and objective.
    pub fn summary<S: AsRef<str>>(&self, labels: &[S]) -> ResultSummary {
        ResultSummary {
            window: self.window,
            components: labels
                .iter()
                .map(|l| (l.as_ref().to_string(), self.summarize(l.as_ref())))
                .collect(),
            storage_cap: self.storage_capacity(),
            objective: self.objective(),
        }
    }
}

/// Aggregated results of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub window: Window,
    pub components: Vec<(String, FlowSummary)>,
    pub storage_cap: f64,
    pub objective: f64,
}

impl ResultSummary {
    /// Flat mapping with `<label>_sum`, `<label>_inst`, `storage_cap` and `objective`.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        for (label, summary) in &self.components {
            map.insert(format!("{label}_sum"), summary.sum);
            map.insert(format!("{label}_inst"), summary.peak);
        }
        map.insert("storage_cap".to_string(), self.storage_cap);
        map.insert("objective".to_string(), self.objective);
        map
    }

    pub fn get(&self, label: &str) -> Option<FlowSummary> {
        self.components
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, s)| *s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::builder::compile;
    use crate::model::{Bus, Component, Flow, Model, Sink, SinkKind, Source};
    use crate::solver::{SolveStatus, SolverOutcome};
    use crate::timeseries::TimeSeries;

    /// A model with only pinned flows solves without a backend.
    fn pinned(values: Vec<f64>) -> SolvedModel {
        let horizon = values.len();
        let mut model = Model::new(horizon);
        model.add_bus(Bus::new("electricity")).expect("bus");
        model
            .add_component(Component::Source(Source {
                label: "pv".into(),
                output: Flow::new("electricity")
                    .with_nominal_capacity(1.0)
                    .with_fixed_profile(TimeSeries::from(values)),
            }))
            .expect("pv");
        model
            .add_component(Component::Sink(Sink {
                label: "excess_bel".into(),
                input: Flow::new("electricity"),
                kind: SinkKind::Excess,
            }))
            .expect("excess");
        let compiled = compile(&model);
        let outcome = SolverOutcome {
            status: SolveStatus::Optimal,
            values: vec![0.0; compiled.program.num_variables()],
            objective_value: 0.0,
            message: String::new(),
        };
        SolvedModel::from_solution(&model, &compiled, &outcome)
    }

    #[test]
    fn constant_flow_window_sum_and_peak() {
        let solved = pinned(vec![3.0; 10]);
        let window = Window::new(2, 5, 10).expect("window");
        let agg = ResultAggregator::new(&solved, window).expect("fits");
        assert_eq!(agg.summarize("pv"), FlowSummary { sum: 12.0, peak: 3.0 });
    }

    #[test]
    fn zero_flow_summarizes_to_zero() {
        let solved = pinned(vec![0.0; 6]);
        let agg = ResultAggregator::new(&solved, Window::full(6).expect("window")).expect("fits");
        assert_eq!(agg.summarize("pv"), FlowSummary::default());
        assert_eq!(agg.summarize("excess_bel"), FlowSummary::default());
    }

    #[test]
    fn unknown_label_is_zero() {
        let solved = pinned(vec![1.0; 4]);
        let agg = ResultAggregator::new(&solved, Window::full(4).expect("window")).expect("fits");
        assert_eq!(agg.summarize("nuc"), FlowSummary::default());
    }

    #[test]
    fn peak_divisor_scales_only_peak() {
        let solved = pinned(vec![0.5, 2.0, 1.0]);
        let agg = ResultAggregator::new(&solved, Window::full(3).expect("window"))
            .expect("fits")
            .with_peak_divisor("pv", 0.5);
        assert_eq!(agg.summarize("pv"), FlowSummary { sum: 3.5, peak: 4.0 });
    }

    #[test]
    fn window_longer_than_solved_horizon_rejected() {
        let solved = pinned(vec![1.0; 4]);
        let window = Window::new(0, 5, 10).expect("window for a longer horizon");
        assert!(matches!(
            ResultAggregator::new(&solved, window),
            Err(RangeError::OutsideHorizon { horizon: 4, .. })
        ));
    }

    #[test]
    fn map_has_contract_keys() {
        let solved = pinned(vec![1.0; 4]);
        let agg = ResultAggregator::new(&solved, Window::full(4).expect("window")).expect("fits");
        let map = agg.summary(&["pv", "wind"]).to_map();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["objective", "pv_inst", "pv_sum", "storage_cap", "wind_inst", "wind_sum"]
        );
        assert_eq!(map.get("pv_sum"), Some(&4.0));
    }
}
