//! Per-timestep flow CSV and result-mapping JSON export.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::results::{ResultSummary, SolvedModel};
use crate::timeseries::{TIMESTAMP_FORMAT, TimeIndex};

/// Writes every flow and state of charge of `solved` as CSV to `path`.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_flows_csv(solved: &SolvedModel, index: Option<&TimeIndex>, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_flows_csv(solved, index, BufWriter::new(file))
}

/// Writes one row per timestep: `timestep`, optionally `timestamp`, one
/// column per flow named `source->target`, and one `<storage>_soc` column
/// holding the state of charge at the end of the timestep.
///
/// Output is deterministic for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_flows_csv(solved: &SolvedModel, index: Option<&TimeIndex>, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let flows: Vec<(String, &[f64])> = solved
        .flows()
        .map(|(key, values)| (key.display_name(), values))
        .collect();
    let storage: Vec<(String, &[f64])> = solved
        .storage_labels()
        .filter_map(|label| solved.soc(label).map(|soc| (format!("{label}_soc"), soc)))
        .collect();

    let mut header = vec!["timestep".to_string()];
    if index.is_some() {
        header.push("timestamp".to_string());
    }
    header.extend(flows.iter().map(|(name, _)| name.clone()));
    header.extend(storage.iter().map(|(name, _)| name.clone()));
    wtr.write_record(&header)?;

    for t in 0..solved.horizon() {
        let mut row = vec![t.to_string()];
        if let Some(index) = index {
            row.push(index.timestamp(t).format(TIMESTAMP_FORMAT).to_string());
        }
        row.extend(flows.iter().map(|(_, v)| format!("{:.4}", v[t])));
        row.extend(storage.iter().map(|(_, soc)| format!("{:.4}", soc[t + 1])));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the result mapping of `summary` as a JSON object to `path`.
///
/// # Errors
///
/// Returns an `io::Error` if file creation, serialisation or writing fails.
pub fn export_results_json(summary: &ResultSummary, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_results_json(summary, BufWriter::new(file))
}

/// Writes the result mapping as pretty-printed JSON with sorted keys.
///
/// # Errors
///
/// Returns an `io::Error` if serialisation or writing fails.
pub fn write_results_json(summary: &ResultSummary, mut writer: impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, &summary.to_map())?;
    writeln!(writer)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::builder::compile;
    use crate::model::{Bus, Component, Flow, Investment, Model, Sink, SinkKind, Source, StorageUnit};
    use crate::results::{ResultAggregator, Window};
    use crate::solver::{SolveStatus, SolverOutcome};
    use crate::timeseries::TimeSeries;

    fn solved() -> SolvedModel {
        let mut model = Model::new(3);
        model.add_bus(Bus::new("electricity")).expect("bus");
        model
            .add_component(Component::Source(Source {
                label: "pv".into(),
                output: Flow::new("electricity")
                    .with_nominal_capacity(2.0)
                    .with_fixed_profile(TimeSeries::from(vec![1.0, 0.5, 0.0])),
            }))
            .expect("pv");
        model
            .add_component(Component::Sink(Sink {
                label: "demand".into(),
                input: Flow::new("electricity")
                    .with_nominal_capacity(1.0)
                    .with_fixed_profile(TimeSeries::constant(1.0, 3)),
                kind: SinkKind::Demand,
            }))
            .expect("demand");
        model
            .add_component(Component::Storage(StorageUnit {
                label: "storage".into(),
                input: Flow::new("electricity"),
                output: Flow::new("electricity"),
                capacity_loss: 0.0,
                initial_capacity: 0.0,
                input_capacity_ratio: 1.0,
                output_capacity_ratio: 1.0,
                inflow_efficiency: 1.0,
                outflow_efficiency: 1.0,
                fixed_cost: 0.0,
                investment: Investment::new(1.0),
            }))
            .expect("storage");
        let compiled = compile(&model);
        let outcome = SolverOutcome {
            status: SolveStatus::Optimal,
            values: vec![0.0; compiled.program.num_variables()],
            objective_value: 12.5,
            message: String::new(),
        };
        SolvedModel::from_solution(&model, &compiled, &outcome)
    }

    fn to_string(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        assert!(f(&mut buf).is_ok());
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn flows_header_and_rows() {
        let solved = solved();
        let out = to_string(|buf| write_flows_csv(&solved, None, buf));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "timestep,pv->electricity,electricity->demand,electricity->storage,storage->electricity,storage_soc"
        );
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "0,2.0000,1.0000,0.0000,0.0000,0.0000");
    }

    #[test]
    fn timestamp_column_when_indexed() {
        let solved = solved();
        let start = TimeIndex::parse("2012-01-01 00:00:00").expect("valid");
        let index = TimeIndex::new(start, 3);
        let out = to_string(|buf| write_flows_csv(&solved, Some(&index), buf));
        assert!(out.lines().nth(2).is_some_and(|l| l.starts_with("1,2012-01-01 01:00:00,")));
    }

    #[test]
    fn results_json_is_flat_mapping() {
        let solved = solved();
        let agg = ResultAggregator::new(&solved, Window::full(3).expect("window")).expect("fits");
        let summary = agg.summary(&["pv"]);
        let out = to_string(|buf| write_results_json(&summary, buf));
        let parsed: BTreeMap<String, f64> = serde_json::from_str(&out).unwrap_or_default();
        assert_eq!(parsed.get("pv_sum"), Some(&3.0));
        assert_eq!(parsed.get("pv_inst"), Some(&2.0));
        assert_eq!(parsed.get("objective"), Some(&12.5));
        assert_eq!(parsed.get("storage_cap"), Some(&0.0));
    }
}
