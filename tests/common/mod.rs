//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use esys_opt::model::{Bus, Component, Flow, Investment, Model, Sink, SinkKind, Source, StorageUnit};
use esys_opt::timeseries::TimeSeries;

pub const TOL: f64 = 1e-6;

/// PV output of 10 at step 0 only, demand of 5 at steps 0 and 1, free excess sink.
///
/// Without storage step 1 has no supply.
pub fn shift_model(with_storage: bool) -> Model {
    shift_model_with(with_storage, 10.0, 1.0)
}

/// [`shift_model`] with a chosen PV nominal capacity and discharge efficiency.
pub fn shift_model_with(with_storage: bool, pv_nominal: f64, outflow_efficiency: f64) -> Model {
    let mut model = Model::new(4);
    model.add_bus(Bus::new("electricity")).expect("bus");
    model
        .add_component(Component::Source(Source {
            label: "pv".into(),
            output: Flow::new("electricity")
                .with_nominal_capacity(pv_nominal)
                .with_fixed_profile(TimeSeries::from(vec![1.0, 0.0, 0.0, 0.0])),
        }))
        .expect("pv");
    model
        .add_component(Component::Sink(Sink {
            label: "demand".into(),
            input: Flow::new("electricity")
                .with_nominal_capacity(1.0)
                .with_fixed_profile(TimeSeries::from(vec![5.0, 5.0, 0.0, 0.0])),
            kind: SinkKind::Demand,
        }))
        .expect("demand");
    model
        .add_component(Component::Sink(Sink {
            label: "excess".into(),
            input: Flow::new("electricity"),
            kind: SinkKind::Excess,
        }))
        .expect("excess");
    if with_storage {
        model
            .add_component(Component::Storage(unit_storage(outflow_efficiency)))
            .expect("storage");
    }
    model
}

/// Lossless storage with unit ratios and an equivalent periodical cost of 1.
pub fn unit_storage(outflow_efficiency: f64) -> StorageUnit {
    StorageUnit {
        label: "storage".into(),
        input: Flow::new("electricity"),
        output: Flow::new("electricity"),
        capacity_loss: 0.0,
        initial_capacity: 0.0,
        input_capacity_ratio: 1.0,
        output_capacity_ratio: 1.0,
        inflow_efficiency: 1.0,
        outflow_efficiency,
        fixed_cost: 0.0,
        investment: Investment::new(1.0),
    }
}

/// Constant demand of 1 served by a generator whose total output is capped
/// at `summed_max * nominal * T`.
pub fn summed_max_model(summed_max: f64) -> Model {
    let t = 4;
    Model::new(t)
        .with_bus("electricity")
        .and_then(|m| {
            m.with_component(Component::Source(Source {
                label: "gen".into(),
                output: Flow::new("electricity")
                    .with_nominal_capacity(2.0)
                    .with_variable_cost(1.0)
                    .with_summed_max(summed_max),
            }))
        })
        .and_then(|m| {
            m.with_component(Component::Sink(Sink {
                label: "demand".into(),
                input: Flow::new("electricity")
                    .with_nominal_capacity(1.0)
                    .with_fixed_profile(TimeSeries::constant(1.0, t)),
                kind: SinkKind::Demand,
            }))
        })
        .expect("valid model")
}
