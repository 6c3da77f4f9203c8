//! CSV time-series import.

use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::error::{DataError, Result};
use crate::timeseries::{TimeSeries, TimeSeriesTable};

/// Header names treated as the time axis and skipped.
const TIMESTAMP_COLUMNS: &[&str] = &["timestamp", "utc_timestamp", "time", "datetime"];

/// Reads a comma-separated table with a header row into a [`TimeSeriesTable`].
///
/// Every column except a recognised timestamp column must hold numbers.
/// Rows are timesteps in file order.
///
/// # Errors
///
/// * [`DataError::Csv`] for malformed CSV, including rows of differing length
/// * [`DataError::InvalidNumber`] for a cell that is not a number, naming row and column
/// * [`DataError::DuplicateColumn`] if a header names a column twice
/// * [`DataError::Empty`] if no data column remains
pub fn read_table(reader: impl Read) -> Result<TimeSeriesTable> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers().map_err(DataError::from)?.clone();
    let data_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !TIMESTAMP_COLUMNS.contains(&name.to_ascii_lowercase().as_str()))
        .map(|(i, name)| (i, name.to_string()))
        .collect();
    for (i, (_, name)) in data_columns.iter().enumerate() {
        if data_columns[..i].iter().any(|(_, earlier)| earlier == name) {
            return Err(DataError::DuplicateColumn {
                column: name.clone(),
            }
            .into());
        }
    }
    if data_columns.is_empty() {
        return Err(DataError::Empty.into());
    }

    let mut values: Vec<Vec<f64>> = vec![Vec::new(); data_columns.len()];
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(DataError::from)?;
        for ((idx, name), column) in data_columns.iter().zip(values.iter_mut()) {
            let cell = record.get(*idx).unwrap_or("");
            let value = cell.parse::<f64>().map_err(|_| DataError::InvalidNumber {
                row: row + 1,
                column: name.clone(),
                value: cell.to_string(),
            })?;
            column.push(value);
        }
    }

    let mut table = TimeSeriesTable::new();
    for ((_, name), column) in data_columns.into_iter().zip(values) {
        table.insert(name, TimeSeries::from(column))?;
    }
    Ok(table)
}

/// Reads a CSV file with [`read_table`].
///
/// # Errors
///
/// See [`read_table`]; a missing or unreadable file is reported as [`crate::error::Error::Io`].
pub fn load_table(path: &Path) -> Result<TimeSeriesTable> {
    let file = std::fs::File::open(path)?;
    let table = read_table(std::io::BufReader::new(file))?;
    info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.column_names().count(),
        "time series loaded"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn skips_timestamp_and_parses_numbers() {
        let csv = "timestamp,demand_el,pv\n\
                   2012-01-01 00:00:00,5.0,0.0\n\
                   2012-01-01 01:00:00,6.5,0.25\n";
        let table = read_table(csv.as_bytes()).expect("valid csv");
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["demand_el", "pv"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("pv").map(|c| c[1]), Ok(0.25));
    }

    #[test]
    fn bad_cell_names_row_and_column() {
        let csv = "demand_el,pv\n1,2\n3,x\n";
        match read_table(csv.as_bytes()) {
            Err(Error::Data(DataError::InvalidNumber { row, column, value })) => {
                assert_eq!((row, column.as_str(), value.as_str()), (2, "pv", "x"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn repeated_header_is_rejected() {
        match read_table("pv,pv\n1,2\n3,4\n".as_bytes()) {
            Err(Error::Data(DataError::DuplicateColumn { column })) => assert_eq!(column, "pv"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ragged_row_is_csv_error() {
        let csv = "demand_el,pv\n1,2\n3\n";
        assert!(matches!(
            read_table(csv.as_bytes()),
            Err(Error::Data(DataError::Csv(_)))
        ));
    }

    #[test]
    fn only_timestamp_is_empty() {
        let csv = "time\n2012-01-01 00:00:00\n";
        assert!(matches!(
            read_table(csv.as_bytes()),
            Err(Error::Data(DataError::Empty))
        ));
    }
}
