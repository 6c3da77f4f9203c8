//! Energy-system building blocks: flows and the component variants that own them.

use std::collections::BTreeMap;

use crate::timeseries::TimeSeries;

use super::investment::Investment;

/// Directed edge between a component and a bus.
///
/// Carries a non-negative value per timestep. A flow with both a fixed
/// profile and a nominal capacity is pinned to `profile[t] × nominal_capacity`
/// and contributes no decision variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Flow {
    /// Label of the bus at the other end of the flow.
    pub bus: String,
    /// Upper bound per timestep, and the scale of a fixed profile.
    pub nominal_capacity: Option<f64>,
    /// Relative per-timestep values pinning the flow.
    pub fixed_profile: Option<TimeSeries>,
    /// Cost per unit of energy carried.
    pub variable_cost: f64,
    /// Cost per unit of nominal capacity.
    pub fixed_cost: f64,
    /// Cap on total energy over the horizon, as a multiple of `nominal_capacity × T`.
    pub summed_max: Option<f64>,
}

impl Flow {
    /// An unconstrained flow attached to `bus`.
    pub fn new(bus: impl Into<String>) -> Self {
        Self {
            bus: bus.into(),
            ..Self::default()
        }
    }

    pub fn with_nominal_capacity(mut self, capacity: f64) -> Self {
        self.nominal_capacity = Some(capacity);
        self
    }

    pub fn with_fixed_profile(mut self, profile: TimeSeries) -> Self {
        self.fixed_profile = Some(profile);
        self
    }

    pub fn with_variable_cost(mut self, cost: f64) -> Self {
        self.variable_cost = cost;
        self
    }

    pub fn with_fixed_cost(mut self, cost: f64) -> Self {
        self.fixed_cost = cost;
        self
    }

    pub fn with_summed_max(mut self, summed_max: f64) -> Self {
        self.summed_max = Some(summed_max);
        self
    }

    /// Per-timestep values when the flow is pinned by a fixed profile.
    pub fn pinned_value(&self, timestep: usize) -> Option<f64> {
        match (&self.fixed_profile, self.nominal_capacity) {
            (Some(profile), Some(nominal)) => Some(profile[timestep] * nominal),
            _ => None,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.fixed_profile.is_some() && self.nominal_capacity.is_some()
    }
}

/// Which side of a bus a flow sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Bus → component (consumption from the bus).
    FromBus,
    /// Component → bus (supply into the bus).
    ToBus,
}

/// Generation technology feeding a bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub label: String,
    pub output: Flow,
}

/// Role of a sink on its bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// Demand; its flow must be specified by a profile or a capacity.
    Demand,
    /// Unconstrained outlet absorbing overproduction.
    Excess,
}

/// Consumer drawing from a bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Sink {
    pub label: String,
    pub input: Flow,
    pub kind: SinkKind,
}

/// Converter with fixed output/input ratios.
///
/// For every output bus `o`: `output_o(t) = conversion_factors[o] × Σ inputs(t)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformer {
    pub label: String,
    pub inputs: Vec<Flow>,
    pub outputs: Vec<Flow>,
    /// Conversion factor keyed by output bus label.
    pub conversion_factors: BTreeMap<String, f64>,
}

/// Storage sized by an investment decision.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageUnit {
    pub label: String,
    /// Charging flow, drawn from the bus.
    pub input: Flow,
    /// Discharging flow, delivered to the same bus.
    pub output: Flow,
    /// Fraction of the stored energy lost per timestep.
    pub capacity_loss: f64,
    /// Stored energy before the first timestep.
    pub initial_capacity: f64,
    /// Maximum charging power relative to capacity.
    pub input_capacity_ratio: f64,
    /// Maximum discharging power relative to capacity.
    pub output_capacity_ratio: f64,
    pub inflow_efficiency: f64,
    pub outflow_efficiency: f64,
    /// Cost per unit of invested capacity, on top of the annuity.
    pub fixed_cost: f64,
    pub investment: Investment,
}

/// Tagged variant over every building block the model builder knows.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Source(Source),
    Sink(Sink),
    Transformer(Transformer),
    Storage(StorageUnit),
}

impl Component {
    pub fn label(&self) -> &str {
        match self {
            Self::Source(c) => &c.label,
            Self::Sink(c) => &c.label,
            Self::Transformer(c) => &c.label,
            Self::Storage(c) => &c.label,
        }
    }

    /// Every flow of the component with its direction relative to the bus.
    pub fn flows(&self) -> Vec<(Direction, &Flow)> {
        match self {
            Self::Source(c) => vec![(Direction::ToBus, &c.output)],
            Self::Sink(c) => vec![(Direction::FromBus, &c.input)],
            Self::Transformer(c) => c
                .inputs
                .iter()
                .map(|f| (Direction::FromBus, f))
                .chain(c.outputs.iter().map(|f| (Direction::ToBus, f)))
                .collect(),
            Self::Storage(c) => vec![(Direction::FromBus, &c.input), (Direction::ToBus, &c.output)],
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Source(_) => "source",
            Self::Sink(_) => "sink",
            Self::Transformer(_) => "transformer",
            Self::Storage(_) => "storage",
        }
    }
}
