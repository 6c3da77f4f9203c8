//! Compiles a [`Model`] into a [`LinearProgram`].
//!
//! Every free flow becomes one variable per timestep, each storage unit adds
//! an investment variable and a state-of-charge trajectory, and the
//! constraint families are emitted in a fixed order:
//!
//! 1. summed-maximum rows, per flow, in component order
//! 2. transformer conversion rows
//! 3. storage dynamics, state-of-charge and power rows
//! 4. bus balance rows, per bus and timestep
//!
//! Pinned flows (fixed profile with nominal capacity) enter the rows and the
//! objective as constants. The same model always compiles to the same
//! program, variable names and coefficient order included.

use tracing::{debug, info, warn};

use crate::lp::{LinearExpr, LinearProgram, Relation, VariableId};

use super::component::{Component, Direction, Flow, StorageUnit, Transformer};
use super::Model;

/// Identifies one flow of the model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowKey {
    pub component: String,
    pub bus: String,
    pub direction: Direction,
}

impl FlowKey {
    /// Column label in the `source->target` form.
    pub fn display_name(&self) -> String {
        match self.direction {
            Direction::ToBus => format!("{}->{}", self.component, self.bus),
            Direction::FromBus => format!("{}->{}", self.bus, self.component),
        }
    }
}

/// Value of a flow, or of a state-of-charge point, at one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowValue {
    /// Known before solving.
    Fixed(f64),
    /// Chosen by the solver.
    Variable(VariableId),
}

impl FlowValue {
    /// Adds `coefficient × self` to `expr`.
    pub fn add_to(self, expr: &mut LinearExpr, coefficient: f64) {
        match self {
            Self::Fixed(v) => expr.add_constant(coefficient * v),
            Self::Variable(var) => expr.add_term(var, coefficient),
        }
    }

    /// Resolves the value against a primal solution.
    pub fn resolve(self, values: &[f64]) -> f64 {
        match self {
            Self::Fixed(v) => v,
            Self::Variable(var) => values.get(var.0).copied().unwrap_or(0.0),
        }
    }
}

/// Decision variables owned by one storage unit.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageVariables {
    pub label: String,
    /// Invested capacity.
    pub invest: VariableId,
    /// `T + 1` trajectory points; point 0 is the initial capacity.
    pub soc: Vec<FlowValue>,
}

/// Maps model elements to the program's variables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableIndex {
    flows: Vec<(FlowKey, Vec<FlowValue>)>,
    storage: Vec<StorageVariables>,
}

impl VariableIndex {
    /// All flows in compilation order.
    pub fn flows(&self) -> impl Iterator<Item = (&FlowKey, &[FlowValue])> {
        self.flows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn flow(&self, component: &str, bus: &str, direction: Direction) -> Option<&[FlowValue]> {
        self.flows
            .iter()
            .find(|(k, _)| k.component == component && k.bus == bus && k.direction == direction)
            .map(|(_, v)| v.as_slice())
    }

    pub fn storage(&self) -> &[StorageVariables] {
        &self.storage
    }

    pub fn storage_unit(&self, label: &str) -> Option<&StorageVariables> {
        self.storage.iter().find(|s| s.label == label)
    }
}

/// A compiled program together with the mapping back to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModel {
    pub program: LinearProgram,
    pub index: VariableIndex,
    pub timesteps: usize,
}

/// Compiles `model` into a linear program.
///
/// Models are validated on construction, so compilation cannot fail.
///
/// # Examples
///
/// ```
/// use esys_opt::model::{Component, Flow, Model, Sink, SinkKind, Source};
/// use esys_opt::model::builder::compile;
/// use esys_opt::timeseries::TimeSeries;
///
/// let model = Model::new(3)
///     .with_bus("electricity")
///     .and_then(|m| m.with_component(Component::Source(Source {
///         label: "gen".into(),
///         output: Flow::new("electricity").with_nominal_capacity(10.0).with_variable_cost(1.0),
///     })))
///     .and_then(|m| m.with_component(Component::Sink(Sink {
///         label: "demand".into(),
///         input: Flow::new("electricity")
///             .with_nominal_capacity(5.0)
///             .with_fixed_profile(TimeSeries::constant(1.0, 3)),
///         kind: SinkKind::Demand,
///     })))
///     .expect("valid model");
///
/// let compiled = compile(&model);
/// // three generator variables, the demand is pinned
/// assert_eq!(compiled.program.num_variables(), 3);
/// // one balance row per timestep
/// assert_eq!(compiled.program.num_constraints(), 3);
/// ```
pub fn compile(model: &Model) -> CompiledModel {
    let horizon = model.timesteps();
    let mut program = LinearProgram::new();
    let mut index = VariableIndex::default();

    for component in model.components() {
        let label = component.label();
        if let Component::Storage(storage) = component {
            let invest = program.add_variable(
                format!("invest_{label}"),
                0.0,
                storage.investment.maximum,
            );
            program
                .objective
                .add_term(invest, storage.investment.ep_costs + storage.fixed_cost);
            index.storage.push(StorageVariables {
                label: label.to_string(),
                invest,
                soc: Vec::new(),
            });
        }
        for (direction, flow) in component.flows() {
            let key = FlowKey {
                component: label.to_string(),
                bus: flow.bus.clone(),
                direction,
            };
            let values = add_flow(&mut program, &key, flow, horizon);
            index.flows.push((key, values));
        }
    }

    for (key, values) in &index.flows {
        if let Some(flow) = model
            .component(&key.component)
            .and_then(|c| flow_of(c, &key.bus, key.direction))
        {
            add_summed_max(&mut program, key, flow, values, horizon);
        }
    }

    for component in model.components() {
        match component {
            Component::Transformer(t) => add_conversion(&mut program, &index, t, horizon),
            Component::Storage(s) => add_storage(&mut program, &mut index, s, horizon),
            Component::Source(_) | Component::Sink(_) => {}
        }
    }

    for bus in model.buses() {
        add_balance(&mut program, &index, &bus.label, horizon);
    }

    info!(
        variables = program.num_variables(),
        constraints = program.num_constraints(),
        timesteps = horizon,
        "model compiled"
    );
    CompiledModel {
        program,
        index,
        timesteps: horizon,
    }
}

fn flow_of<'a>(component: &'a Component, bus: &str, direction: Direction) -> Option<&'a Flow> {
    component
        .flows()
        .into_iter()
        .find(|(d, f)| *d == direction && f.bus == bus)
        .map(|(_, f)| f)
}

fn flow_var_name(key: &FlowKey, t: usize) -> String {
    match key.direction {
        Direction::ToBus => format!("flow_{}_{}_{t}", key.component, key.bus),
        Direction::FromBus => format!("flow_{}_{}_{t}", key.bus, key.component),
    }
}

fn add_flow(program: &mut LinearProgram, key: &FlowKey, flow: &Flow, horizon: usize) -> Vec<FlowValue> {
    let values: Vec<FlowValue> = (0..horizon)
        .map(|t| match flow.pinned_value(t) {
            Some(v) => FlowValue::Fixed(v),
            None => FlowValue::Variable(program.add_variable(
                flow_var_name(key, t),
                0.0,
                flow.nominal_capacity,
            )),
        })
        .collect();

    if flow.variable_cost != 0.0 {
        for value in &values {
            value.add_to(&mut program.objective, flow.variable_cost);
        }
    }
    match flow.nominal_capacity {
        Some(nominal) => program.objective.add_constant(flow.fixed_cost * nominal),
        None if flow.fixed_cost != 0.0 => {
            warn!(flow = %key.display_name(), "fixed cost ignored: flow has no nominal capacity");
        }
        None => {}
    }
    debug!(flow = %key.display_name(), pinned = flow.is_pinned(), "flow compiled");
    values
}

fn add_summed_max(
    program: &mut LinearProgram,
    key: &FlowKey,
    flow: &Flow,
    values: &[FlowValue],
    horizon: usize,
) {
    let (Some(summed_max), Some(nominal)) = (flow.summed_max, flow.nominal_capacity) else {
        return;
    };
    let mut lhs = LinearExpr::new();
    for value in values {
        value.add_to(&mut lhs, 1.0);
    }
    let name = match key.direction {
        Direction::ToBus => format!("summed_max_{}_{}", key.component, key.bus),
        Direction::FromBus => format!("summed_max_{}_{}", key.bus, key.component),
    };
    program.add_constraint(
        name,
        lhs,
        Relation::LessOrEqual,
        summed_max * nominal * horizon as f64,
    );
}

fn add_conversion(program: &mut LinearProgram, index: &VariableIndex, t: &Transformer, horizon: usize) {
    let inputs: Vec<&[FlowValue]> = t
        .inputs
        .iter()
        .filter_map(|f| index.flow(&t.label, &f.bus, Direction::FromBus))
        .collect();
    for output in &t.outputs {
        let Some(out_values) = index.flow(&t.label, &output.bus, Direction::ToBus) else {
            continue;
        };
        let factor = t.conversion_factors.get(&output.bus).copied().unwrap_or(0.0);
        for step in 0..horizon {
            let mut lhs = LinearExpr::new();
            out_values[step].add_to(&mut lhs, 1.0);
            for input in &inputs {
                input[step].add_to(&mut lhs, -factor);
            }
            program.add_constraint(
                format!("conversion_{}_{}_{step}", t.label, output.bus),
                lhs,
                Relation::Equal,
                0.0,
            );
        }
    }
}

fn add_storage(program: &mut LinearProgram, index: &mut VariableIndex, s: &StorageUnit, horizon: usize) {
    let Some(slot) = index.storage.iter().position(|v| v.label == s.label) else {
        return;
    };
    let invest = index.storage[slot].invest;
    let (Some(inflow), Some(outflow)) = (
        index.flow(&s.label, &s.input.bus, Direction::FromBus).map(<[_]>::to_vec),
        index.flow(&s.label, &s.output.bus, Direction::ToBus).map(<[_]>::to_vec),
    ) else {
        return;
    };

    let mut soc = Vec::with_capacity(horizon + 1);
    soc.push(FlowValue::Fixed(s.initial_capacity));
    for point in 1..=horizon {
        let var = program.add_variable(format!("soc_{}_{point}", s.label), 0.0, None);
        soc.push(FlowValue::Variable(var));
        let mut cap = LinearExpr::new();
        cap.add_term(var, 1.0);
        cap.add_term(invest, -1.0);
        program.add_constraint(
            format!("soc_cap_{}_{point}", s.label),
            cap,
            Relation::LessOrEqual,
            0.0,
        );
    }

    let retention = 1.0 - s.capacity_loss;
    for step in 0..horizon {
        // point step + 1 closes timestep step
        let mut dynamics = LinearExpr::new();
        soc[step + 1].add_to(&mut dynamics, 1.0);
        soc[step].add_to(&mut dynamics, -retention);
        inflow[step].add_to(&mut dynamics, -s.inflow_efficiency);
        outflow[step].add_to(&mut dynamics, 1.0 / s.outflow_efficiency);
        program.add_constraint(
            format!("storage_balance_{}_{step}", s.label),
            dynamics,
            Relation::Equal,
            0.0,
        );

        let mut charge = LinearExpr::new();
        inflow[step].add_to(&mut charge, 1.0);
        charge.add_term(invest, -s.input_capacity_ratio);
        program.add_constraint(
            format!("inflow_cap_{}_{step}", s.label),
            charge,
            Relation::LessOrEqual,
            0.0,
        );

        let mut discharge = LinearExpr::new();
        outflow[step].add_to(&mut discharge, 1.0);
        discharge.add_term(invest, -s.output_capacity_ratio);
        program.add_constraint(
            format!("outflow_cap_{}_{step}", s.label),
            discharge,
            Relation::LessOrEqual,
            0.0,
        );
    }
    index.storage[slot].soc = soc;
}

fn add_balance(program: &mut LinearProgram, index: &VariableIndex, bus: &str, horizon: usize) {
    let attached: Vec<(Direction, &[FlowValue])> = index
        .flows()
        .filter(|(k, _)| k.bus == bus)
        .map(|(k, v)| (k.direction, v))
        .collect();
    if attached.is_empty() {
        warn!(bus, "bus has no flows attached, skipping balance rows");
        return;
    }
    for step in 0..horizon {
        let mut lhs = LinearExpr::new();
        for (direction, values) in &attached {
            let sign = match direction {
                Direction::ToBus => 1.0,
                Direction::FromBus => -1.0,
            };
            values[step].add_to(&mut lhs, sign);
        }
        program.add_constraint(format!("balance_{bus}_{step}"), lhs, Relation::Equal, 0.0);
    }
}
