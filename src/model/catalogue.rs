//! Data-driven construction of the single-node electricity model.
//!
//! [`build_catalogue`] declares an electricity bus and a fuel bus, an excess
//! sink, a demand sink, one source per enabled technology, a fuel source with
//! a horizon-wide cap, a gas-fired transformer and an investable storage unit.
//! Every constant comes from [`Economics`] or the capacity table; nothing is
//! read from process-wide state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigurationError;
use crate::timeseries::TimeSeriesTable;

use super::component::{Component, Flow, Sink, SinkKind, Source, StorageUnit, Transformer};
use super::investment::Investment;
use super::{Bus, Model};

/// Hours per year; annual fuel budgets are scaled by `number_timesteps / HOURS_PER_YEAR`.
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// Installed capacity per technology name.
pub type Capacities = BTreeMap<String, f64>;

/// Shape used to synthesise an availability profile when no measured data is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileShape {
    /// Nearly flat availability with small noise.
    #[default]
    Baseload,
    /// Half-cosine daylight curve with noise.
    Solar,
    /// AR(1)-correlated availability.
    Wind,
}

/// One generation technology of the catalogue.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Technology {
    /// Component label and key into the capacity table.
    pub name: String,
    /// Time-series column holding the relative availability; defaults to `name`.
    pub column: Option<String>,
    pub fixed_cost: f64,
    pub variable_cost: f64,
    /// Disabled technologies are not built and report zero.
    pub enabled: bool,
    /// Divisor applied to the reported peak.
    pub peak_divisor: f64,
    pub shape: ProfileShape,
}

impl Default for Technology {
    fn default() -> Self {
        Self {
            name: String::new(),
            column: None,
            fixed_cost: 0.0,
            variable_cost: 0.0,
            enabled: true,
            peak_divisor: 1.0,
            shape: ProfileShape::Baseload,
        }
    }
}

impl Technology {
    pub fn new(name: impl Into<String>, fixed_cost: f64) -> Self {
        Self {
            name: name.into(),
            fixed_cost,
            ..Self::default()
        }
    }

    pub fn with_shape(mut self, shape: ProfileShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_peak_divisor(mut self, divisor: f64) -> Self {
        self.peak_divisor = divisor;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }
}

/// Labels of the two commodity buses.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusLabels {
    pub electricity: String,
    pub fuel: String,
}

impl Default for BusLabels {
    fn default() -> Self {
        Self {
            electricity: "electricity".to_string(),
            fuel: "natural_gas".to_string(),
        }
    }
}

/// Demand sink, pinned to `column × nominal_capacity`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemandParams {
    pub label: String,
    pub column: String,
    pub nominal_capacity: f64,
}

impl Default for DemandParams {
    fn default() -> Self {
        Self {
            label: "demand".to_string(),
            column: "demand_el".to_string(),
            nominal_capacity: 1.0,
        }
    }
}

/// Unconstrained outlet for overproduction on the electricity bus.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExcessParams {
    pub label: String,
}

impl Default for ExcessParams {
    fn default() -> Self {
        Self {
            label: "excess_bel".to_string(),
        }
    }
}

/// Fuel source feeding the fuel bus.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FuelParams {
    pub label: String,
    /// Nominal capacity for a full year; scaled to the horizon.
    pub annual_nominal_capacity: f64,
    pub summed_max: Option<f64>,
    pub variable_cost: f64,
}

impl Default for FuelParams {
    fn default() -> Self {
        Self {
            label: "rgas".to_string(),
            annual_nominal_capacity: 194_397_000.0,
            summed_max: Some(1000.0),
            variable_cost: 0.0,
        }
    }
}

/// Fuel-to-electricity power plant.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformerParams {
    pub label: String,
    pub output_nominal_capacity: f64,
    pub variable_cost: f64,
    pub conversion_factor: f64,
}

impl Default for TransformerParams {
    fn default() -> Self {
        Self {
            label: "pp_gas".to_string(),
            output_nominal_capacity: 10e10,
            variable_cost: 50.0,
            conversion_factor: 0.58,
        }
    }
}

/// Storage unit sized by investment.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageParams {
    pub label: String,
    pub enabled: bool,
    pub inflow_variable_cost: f64,
    pub outflow_variable_cost: f64,
    pub capacity_loss: f64,
    pub initial_capacity: f64,
    pub input_capacity_ratio: f64,
    pub output_capacity_ratio: f64,
    pub inflow_efficiency: f64,
    pub outflow_efficiency: f64,
    pub fixed_cost: f64,
    pub capex: f64,
    pub lifetime_years: u32,
    pub wacc: f64,
    pub maximum: Option<f64>,
}

impl Default for StorageParams {
    fn default() -> Self {
        Self {
            label: "storage".to_string(),
            enabled: true,
            inflow_variable_cost: 10e2,
            outflow_variable_cost: 10e2,
            capacity_loss: 0.0,
            initial_capacity: 0.0,
            input_capacity_ratio: 1.0 / 6.0,
            output_capacity_ratio: 1.0 / 6.0,
            inflow_efficiency: 1.0,
            outflow_efficiency: 0.8,
            fixed_cost: 35.0,
            capex: 1000.0,
            lifetime_years: 20,
            wacc: 0.05,
            maximum: None,
        }
    }
}

/// Every technical and economic constant of the catalogue.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Economics {
    pub buses: BusLabels,
    pub demand: DemandParams,
    pub excess: ExcessParams,
    pub technologies: Vec<Technology>,
    pub fuel: FuelParams,
    pub transformer: TransformerParams,
    pub storage: StorageParams,
}

impl Economics {
    /// Labels to report on, in catalogue order: technologies (enabled or not),
    /// the gas plant, and the demand.
    pub fn report_labels(&self) -> Vec<String> {
        self.technologies
            .iter()
            .map(|t| t.name.clone())
            .chain([self.transformer.label.clone(), self.demand.label.clone()])
            .collect()
    }

    /// Peak divisors of the technologies that declare one other than 1.
    pub fn peak_divisors(&self) -> impl Iterator<Item = (&str, f64)> {
        self.technologies
            .iter()
            .filter(|t| t.peak_divisor != 1.0)
            .map(|t| (t.name.as_str(), t.peak_divisor))
    }
}

/// Builds the model for one run from data, capacities and economic constants.
///
/// # Arguments
///
/// * `time_series` - Table with the demand column and one availability column per enabled technology
/// * `capacities` - Installed capacity per technology name
/// * `economics` - Labels, costs, ratios and investment parameters
/// * `number_timesteps` - Model horizon; every profile must have exactly this length
///
/// # Errors
///
/// * [`ConfigurationError::MissingColumn`] if the demand or an enabled technology has no column
/// * [`ConfigurationError::MissingCapacity`] if an enabled technology has no capacity entry
/// * [`ConfigurationError::HorizonMismatch`] if the table length differs from `number_timesteps`
/// * any validation error raised while adding components to the [`Model`]
pub fn build_catalogue(
    time_series: &TimeSeriesTable,
    capacities: &Capacities,
    economics: &Economics,
    number_timesteps: usize,
) -> Result<Model, ConfigurationError> {
    let el = &economics.buses.electricity;
    let fuel_bus = &economics.buses.fuel;

    let mut model = Model::new(number_timesteps);
    model.add_bus(Bus::new(el.clone()))?;
    model.add_bus(Bus::new(fuel_bus.clone()))?;

    model.add_component(Component::Sink(Sink {
        label: economics.excess.label.clone(),
        input: Flow::new(el.clone()),
        kind: SinkKind::Excess,
    }))?;

    let demand = &economics.demand;
    let demand_profile = time_series.column(&demand.column)?;
    model.add_component(Component::Sink(Sink {
        label: demand.label.clone(),
        input: Flow::new(el.clone())
            .with_nominal_capacity(demand.nominal_capacity)
            .with_fixed_profile(demand_profile.clone()),
        kind: SinkKind::Demand,
    }))?;

    for tech in &economics.technologies {
        if !tech.enabled {
            debug!(technology = %tech.name, "disabled, not built");
            continue;
        }
        if !(tech.peak_divisor.is_finite() && tech.peak_divisor > 0.0) {
            return Err(ConfigurationError::invalid(
                &tech.name,
                format!("peak divisor must be > 0, got {}", tech.peak_divisor),
            ));
        }
        let capacity = capacities
            .get(&tech.name)
            .copied()
            .ok_or_else(|| ConfigurationError::MissingCapacity {
                technology: tech.name.clone(),
            })?;
        let profile = time_series.column(tech.column())?;
        model.add_component(Component::Source(Source {
            label: tech.name.clone(),
            output: Flow::new(el.clone())
                .with_nominal_capacity(capacity)
                .with_fixed_profile(profile.clone())
                .with_fixed_cost(tech.fixed_cost)
                .with_variable_cost(tech.variable_cost),
        }))?;
    }

    let fuel = &economics.fuel;
    let mut fuel_flow = Flow::new(fuel_bus.clone())
        .with_nominal_capacity(
            fuel.annual_nominal_capacity * number_timesteps as f64 / HOURS_PER_YEAR,
        )
        .with_variable_cost(fuel.variable_cost);
    if let Some(summed_max) = fuel.summed_max {
        fuel_flow = fuel_flow.with_summed_max(summed_max);
    }
    model.add_component(Component::Source(Source {
        label: fuel.label.clone(),
        output: fuel_flow,
    }))?;

    let tr = &economics.transformer;
    model.add_component(Component::Transformer(Transformer {
        label: tr.label.clone(),
        inputs: vec![Flow::new(fuel_bus.clone())],
        outputs: vec![
            Flow::new(el.clone())
                .with_nominal_capacity(tr.output_nominal_capacity)
                .with_variable_cost(tr.variable_cost),
        ],
        conversion_factors: BTreeMap::from([(el.clone(), tr.conversion_factor)]),
    }))?;

    let st = &economics.storage;
    if st.enabled {
        let mut investment = Investment::from_annuity(st.capex, st.lifetime_years, st.wacc)
            .map_err(|e| match e {
                ConfigurationError::InvalidParameter { message, .. } => {
                    ConfigurationError::invalid(&st.label, message)
                }
                other => other,
            })?;
        if let Some(max) = st.maximum {
            investment = investment.with_maximum(max);
        }
        debug!(storage = %st.label, ep_costs = investment.ep_costs, "storage annuity");
        model.add_component(Component::Storage(StorageUnit {
            label: st.label.clone(),
            input: Flow::new(el.clone()).with_variable_cost(st.inflow_variable_cost),
            output: Flow::new(el.clone()).with_variable_cost(st.outflow_variable_cost),
            capacity_loss: st.capacity_loss,
            initial_capacity: st.initial_capacity,
            input_capacity_ratio: st.input_capacity_ratio,
            output_capacity_ratio: st.output_capacity_ratio,
            inflow_efficiency: st.inflow_efficiency,
            outflow_efficiency: st.outflow_efficiency,
            fixed_cost: st.fixed_cost,
            investment,
        }))?;
    }

    info!(
        buses = model.buses().len(),
        components = model.components().len(),
        timesteps = number_timesteps,
        "catalogue built"
    );
    Ok(model)
}
