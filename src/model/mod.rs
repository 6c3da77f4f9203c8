//! Energy-system model: buses, components and the validating aggregate that owns them.
//!
//! A [`Model`] is built once per optimisation run, either by hand through the
//! `add_*` methods or from data via [`catalogue::build_catalogue`], and is then
//! compiled into a linear program by [`builder::compile`].

pub mod builder;
pub mod catalogue;
pub mod component;
pub mod investment;

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::ConfigurationError;

pub use component::{Component, Direction, Flow, Sink, SinkKind, Source, StorageUnit, Transformer};
pub use investment::{Investment, capital_recovery_factor};

/// A named commodity node balancing inflows against outflows every timestep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bus {
    pub label: String,
}

impl Bus {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// Aggregate root holding every bus and component of one run.
///
/// Insertion order is preserved so that compilation is deterministic. Each
/// `add_*` call validates the new element against the buses already present
/// and the model horizon; a rejected element leaves the model unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    timesteps: usize,
    buses: Vec<Bus>,
    bus_index: BTreeMap<String, usize>,
    components: Vec<Component>,
    component_index: BTreeMap<String, usize>,
}

impl Model {
    /// Creates an empty model covering `timesteps` hourly steps.
    pub fn new(timesteps: usize) -> Self {
        Self {
            timesteps,
            buses: Vec::new(),
            bus_index: BTreeMap::new(),
            components: Vec::new(),
            component_index: BTreeMap::new(),
        }
    }

    pub fn timesteps(&self) -> usize {
        self.timesteps
    }

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn bus(&self, label: &str) -> Option<&Bus> {
        self.bus_index.get(label).map(|&i| &self.buses[i])
    }

    pub fn component(&self, label: &str) -> Option<&Component> {
        self.component_index.get(label).map(|&i| &self.components[i])
    }

    /// Storage units in insertion order.
    pub fn storage_units(&self) -> impl Iterator<Item = &StorageUnit> {
        self.components.iter().filter_map(|c| match c {
            Component::Storage(s) => Some(s),
            _ => None,
        })
    }

    /// Registers a bus.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateLabel`] if a bus with the same
    /// label already exists.
    pub fn add_bus(&mut self, bus: Bus) -> Result<(), ConfigurationError> {
        if self.bus_index.contains_key(&bus.label) {
            return Err(ConfigurationError::DuplicateLabel { label: bus.label });
        }
        debug!(bus = %bus.label, "bus added");
        self.bus_index.insert(bus.label.clone(), self.buses.len());
        self.buses.push(bus);
        Ok(())
    }

    /// Registers a component after validating its flows and parameters.
    ///
    /// # Errors
    ///
    /// * [`ConfigurationError::DuplicateLabel`] for a label already in use
    /// * [`ConfigurationError::UnknownBus`] for a flow pointing at an undeclared bus
    /// * [`ConfigurationError::HorizonMismatch`] for a fixed profile of the wrong length
    /// * [`ConfigurationError::UnderSpecifiedFlow`] for a source or demand sink
    ///   with neither fixed profile nor nominal capacity
    /// * [`ConfigurationError::InvalidParameter`] for out-of-range parameters
    pub fn add_component(&mut self, component: Component) -> Result<(), ConfigurationError> {
        let label = component.label().to_string();
        if self.component_index.contains_key(&label) {
            return Err(ConfigurationError::DuplicateLabel { label });
        }
        for (_, flow) in component.flows() {
            self.validate_flow(&label, flow)?;
        }
        match &component {
            Component::Source(source) => require_specified(&label, &source.output)?,
            Component::Sink(sink) => {
                if sink.kind == SinkKind::Demand {
                    require_specified(&label, &sink.input)?;
                }
            }
            Component::Transformer(transformer) => validate_transformer(transformer)?,
            Component::Storage(storage) => validate_storage(storage)?,
        }
        debug!(component = %label, kind = component.kind_name(), "component added");
        self.component_index.insert(label, self.components.len());
        self.components.push(component);
        Ok(())
    }

    /// Builder-style variant of [`Model::add_bus`].
    ///
    /// # Errors
    ///
    /// See [`Model::add_bus`].
    pub fn with_bus(mut self, label: impl Into<String>) -> Result<Self, ConfigurationError> {
        self.add_bus(Bus::new(label))?;
        Ok(self)
    }

    /// Builder-style variant of [`Model::add_component`].
    ///
    /// # Errors
    ///
    /// See [`Model::add_component`].
    pub fn with_component(mut self, component: Component) -> Result<Self, ConfigurationError> {
        self.add_component(component)?;
        Ok(self)
    }

    fn validate_flow(&self, label: &str, flow: &Flow) -> Result<(), ConfigurationError> {
        if !self.bus_index.contains_key(&flow.bus) {
            return Err(ConfigurationError::UnknownBus {
                label: label.to_string(),
                bus: flow.bus.clone(),
            });
        }
        if let Some(profile) = &flow.fixed_profile {
            if profile.len() != self.timesteps {
                return Err(ConfigurationError::HorizonMismatch {
                    label: label.to_string(),
                    expected: self.timesteps,
                    actual: profile.len(),
                });
            }
            if flow.nominal_capacity.is_none() {
                return Err(ConfigurationError::invalid(
                    label,
                    "fixed profile requires a nominal capacity",
                ));
            }
            if profile.iter().any(|v| !v.is_finite() || v < 0.0) {
                return Err(ConfigurationError::invalid(
                    label,
                    "fixed profile values must be finite and >= 0",
                ));
            }
        }
        if flow.summed_max.is_some() && flow.nominal_capacity.is_none() {
            return Err(ConfigurationError::invalid(
                label,
                "summed maximum requires a nominal capacity",
            ));
        }
        non_negative(label, "nominal capacity", flow.nominal_capacity)?;
        non_negative(label, "summed maximum", flow.summed_max)?;
        non_negative(label, "variable cost", Some(flow.variable_cost))?;
        non_negative(label, "fixed cost", Some(flow.fixed_cost))?;
        Ok(())
    }
}

fn require_specified(label: &str, flow: &Flow) -> Result<(), ConfigurationError> {
    if flow.fixed_profile.is_none() && flow.nominal_capacity.is_none() {
        return Err(ConfigurationError::UnderSpecifiedFlow {
            label: label.to_string(),
        });
    }
    Ok(())
}

fn non_negative(label: &str, what: &str, value: Option<f64>) -> Result<(), ConfigurationError> {
    match value {
        Some(v) if !(v.is_finite() && v >= 0.0) => Err(ConfigurationError::invalid(
            label,
            format!("{what} must be finite and >= 0, got {v}"),
        )),
        _ => Ok(()),
    }
}

fn positive(label: &str, what: &str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(
            label,
            format!("{what} must be > 0, got {value}"),
        ))
    }
}

fn validate_transformer(t: &Transformer) -> Result<(), ConfigurationError> {
    if t.inputs.is_empty() || t.outputs.is_empty() {
        return Err(ConfigurationError::invalid(
            &t.label,
            "transformer needs at least one input and one output",
        ));
    }
    for flows in [&t.inputs, &t.outputs] {
        for (i, flow) in flows.iter().enumerate() {
            if flows[..i].iter().any(|f| f.bus == flow.bus) {
                return Err(ConfigurationError::invalid(
                    &t.label,
                    format!("more than one flow on the same side of bus `{}`", flow.bus),
                ));
            }
        }
    }
    for output in &t.outputs {
        let factor = t.conversion_factors.get(&output.bus).ok_or_else(|| {
            ConfigurationError::invalid(
                &t.label,
                format!("no conversion factor for output bus `{}`", output.bus),
            )
        })?;
        positive(&t.label, "conversion factor", *factor)?;
    }
    if let Some(stray) = t
        .conversion_factors
        .keys()
        .find(|bus| !t.outputs.iter().any(|o| &o.bus == *bus))
    {
        return Err(ConfigurationError::invalid(
            &t.label,
            format!("conversion factor given for `{stray}`, which is not an output"),
        ));
    }
    Ok(())
}

fn validate_storage(s: &StorageUnit) -> Result<(), ConfigurationError> {
    if s.input.bus != s.output.bus {
        return Err(ConfigurationError::invalid(
            &s.label,
            format!(
                "inflow bus `{}` differs from outflow bus `{}`",
                s.input.bus, s.output.bus
            ),
        ));
    }
    if !(0.0..1.0).contains(&s.capacity_loss) {
        return Err(ConfigurationError::invalid(
            &s.label,
            format!("capacity loss must be in [0, 1), got {}", s.capacity_loss),
        ));
    }
    positive(&s.label, "inflow efficiency", s.inflow_efficiency)?;
    positive(&s.label, "outflow efficiency", s.outflow_efficiency)?;
    positive(&s.label, "input capacity ratio", s.input_capacity_ratio)?;
    positive(&s.label, "output capacity ratio", s.output_capacity_ratio)?;
    non_negative(&s.label, "initial capacity", Some(s.initial_capacity))?;
    non_negative(&s.label, "fixed cost", Some(s.fixed_cost))?;
    non_negative(&s.label, "equivalent periodic cost", Some(s.investment.ep_costs))?;
    non_negative(&s.label, "investment maximum", s.investment.maximum)?;
    if let Some(max) = s.investment.maximum {
        if s.initial_capacity > max {
            return Err(ConfigurationError::invalid(
                &s.label,
                "initial capacity exceeds the investment maximum",
            ));
        }
    }
    Ok(())
}
