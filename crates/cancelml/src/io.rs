//! CSV loading and persistence for raw and processed splits.
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::frame::{RawFrame, Table};

/// Read a raw CSV file into string cells.
pub fn read_raw_csv<P: AsRef<Path>>(path: P) -> Result<RawFrame> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| PipelineError::io(format!("failed to open {}: {}", path.display(), e)))?;

    let names: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::data(format!("failed to read header of {}: {}", path.display(), e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            PipelineError::data(format!(
                "failed to read row {} of {}: {}",
                row_idx + 1,
                path.display(),
                e
            ))
        })?;
        rows.push(record.iter().map(|c| c.trim().to_string()).collect());
    }

    log::info!("loaded {} rows from {}", rows.len(), path.display());
    RawFrame::new(names, rows)
}

/// Read a processed (all-numeric) CSV file.
pub fn read_table_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let frame = read_raw_csv(path)?;
    let ncols = frame.names.len();
    let nrows = frame.nrows();

    let mut data = Vec::with_capacity(nrows * ncols);
    for (row_idx, row) in frame.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let value: f64 = cell.parse().map_err(|_| {
                PipelineError::data(format!(
                    "non-numeric value '{}' in column '{}' at row {} of {}",
                    cell,
                    frame.names[col_idx],
                    row_idx + 1,
                    path.display()
                ))
            })?;
            data.push(value);
        }
    }

    let x = ndarray::Array2::from_shape_vec((nrows, ncols), data)?;
    Table::new(frame.names, x)
}

/// Write a table to CSV, creating parent directories as needed.
pub fn write_table_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| PipelineError::io(format!("failed to create {}: {}", path.display(), e)))?;
    writer.write_record(&table.names)?;
    for row in table.x.rows() {
        let cells: Vec<String> = row.iter().map(|v| format_cell(*v)).collect();
        writer.write_record(&cells)?;
    }
    writer
        .flush()
        .map_err(|e| PipelineError::io(format!("failed to flush {}: {}", path.display(), e)))?;
    log::info!("wrote {} rows to {}", table.nrows(), path.display());
    Ok(())
}

/// Integral values are written without a fractional part so encoded
/// categorical columns stay readable.
fn format_cell(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn table_round_trips_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let table = Table::new(
            vec!["a".into(), "b".into()],
            Array2::from_shape_vec((2, 2), vec![1.0, 2.5, 3.0, 4.0]).unwrap(),
        )
        .unwrap();

        write_table_csv(&table, &path).unwrap();
        let loaded = read_table_csv(&path).unwrap();

        assert_eq!(loaded.names, table.names);
        assert_eq!(loaded.x, table.x);
    }

    #[test]
    fn non_numeric_cell_is_a_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "a,b\n1,x\n").unwrap();

        let err = read_table_csv(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Data(_)), "{err}");
        assert!(err.to_string().contains("column 'b'"));
    }
}
