//! Solved model values and their aggregation into reportable summaries.

pub mod aggregate;
pub mod window;

use std::collections::BTreeMap;

use crate::model::builder::{CompiledModel, FlowKey};
use crate::model::{Component, Direction, Model};
use crate::solver::SolverOutcome;

pub use aggregate::{FlowSummary, ResultAggregator, ResultSummary};
pub use window::Window;

/// Primal values of one solved model, keyed by model element.
///
/// Pinned flows are included with their fixed values, so every flow of the
/// model has a full series of length `horizon`.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedModel {
    horizon: usize,
    flows: Vec<(FlowKey, Vec<f64>)>,
    primary: BTreeMap<String, Vec<f64>>,
    soc: BTreeMap<String, Vec<f64>>,
    invested: BTreeMap<String, f64>,
    objective: f64,
}

impl SolvedModel {
    /// Resolves the compiled variables of `model` against `outcome`.
    pub fn from_solution(model: &Model, compiled: &CompiledModel, outcome: &SolverOutcome) -> Self {
        let values = &outcome.values;
        let flows: Vec<(FlowKey, Vec<f64>)> = compiled
            .index
            .flows()
            .map(|(key, series)| {
                (
                    key.clone(),
                    series.iter().map(|v| v.resolve(values)).collect(),
                )
            })
            .collect();

        let lookup = |label: &str, bus: &str, direction: Direction| {
            flows
                .iter()
                .find(|(k, _)| k.component == label && k.bus == bus && k.direction == direction)
                .map(|(_, v)| v.clone())
        };

        let mut primary = BTreeMap::new();
        for component in model.components() {
            let series = match component {
                Component::Source(s) => lookup(&s.label, &s.output.bus, Direction::ToBus),
                Component::Sink(s) => lookup(&s.label, &s.input.bus, Direction::FromBus),
                Component::Storage(s) => lookup(&s.label, &s.output.bus, Direction::ToBus),
                Component::Transformer(t) => {
                    let mut total = vec![0.0; compiled.timesteps];
                    for output in &t.outputs {
                        if let Some(series) = lookup(&t.label, &output.bus, Direction::ToBus) {
                            for (acc, v) in total.iter_mut().zip(series) {
                                *acc += v;
                            }
                        }
                    }
                    Some(total)
                }
            };
            if let Some(series) = series {
                primary.insert(component.label().to_string(), series);
            }
        }

        let mut soc = BTreeMap::new();
        let mut invested = BTreeMap::new();
        for storage in compiled.index.storage() {
            soc.insert(
                storage.label.clone(),
                storage.soc.iter().map(|v| v.resolve(values)).collect(),
            );
            invested.insert(
                storage.label.clone(),
                values.get(storage.invest.0).copied().unwrap_or(0.0),
            );
        }

        Self {
            horizon: compiled.timesteps,
            flows,
            primary,
            soc,
            invested,
            objective: outcome.objective_value,
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn flows(&self) -> impl Iterator<Item = (&FlowKey, &[f64])> {
        self.flows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn flow(&self, component: &str, bus: &str, direction: Direction) -> Option<&[f64]> {
        self.flows
            .iter()
            .find(|(k, _)| k.component == component && k.bus == bus && k.direction == direction)
            .map(|(_, v)| v.as_slice())
    }

    /// The flow that represents a component in reports: a source's output,
    /// a sink's input, a transformer's total output, a storage's discharge.
    pub fn primary_flow(&self, label: &str) -> Option<&[f64]> {
        self.primary.get(label).map(Vec::as_slice)
    }

    /// State-of-charge trajectory with `horizon + 1` points; point 0 is the initial capacity.
    pub fn soc(&self, label: &str) -> Option<&[f64]> {
        self.soc.get(label).map(Vec::as_slice)
    }

    /// Labels of the storage units in the model.
    pub fn storage_labels(&self) -> impl Iterator<Item = &str> {
        self.soc.keys().map(String::as_str)
    }

    pub fn invested_capacity(&self, label: &str) -> Option<f64> {
        self.invested.get(label).copied()
    }

    /// Total invested storage capacity over all storage units.
    pub fn storage_capacity(&self) -> f64 {
        self.invested.values().sum()
    }

    /// `Σ inflow − Σ outflow` at `bus` and `timestep`; zero for a balanced bus.
    ///
    /// `None` if `timestep` lies outside the solved horizon.
    pub fn bus_residual(&self, bus: &str, timestep: usize) -> Option<f64> {
        if timestep >= self.horizon {
            return None;
        }
        let residual = self
            .flows
            .iter()
            .filter(|(k, _)| k.bus == bus)
            .map(|(k, v)| match k.direction {
                Direction::ToBus => v[timestep],
                Direction::FromBus => -v[timestep],
            })
            .sum();
        Some(residual)
    }
}
