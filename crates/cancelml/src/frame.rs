//! In-memory tabular containers used by the pipeline.
//!
//! `RawFrame` holds CSV data as string cells before preprocessing;
//! `Table` holds fully numeric data (including the encoded label) as an
//! `ndarray` matrix with named columns.
use std::collections::HashSet;

use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{PipelineError, Result};

/// A raw CSV split: header names plus rows of unparsed string cells.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub names: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawFrame {
    pub fn new(names: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != names.len() {
                return Err(PipelineError::data(format!(
                    "row {} has {} cells, expected {}",
                    i + 1,
                    row.len(),
                    names.len()
                )));
            }
        }
        Ok(RawFrame { names, rows })
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn col_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Values of one column, by name.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self
            .col_index(name)
            .ok_or_else(|| PipelineError::data(format!("missing column '{}'", name)))?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Remove the given columns in place. Names not present are ignored.
    pub fn drop_columns(&mut self, names: &[String]) {
        let keep: Vec<usize> = (0..self.names.len())
            .filter(|&i| !names.iter().any(|n| *n == self.names[i]))
            .collect();
        if keep.len() == self.names.len() {
            return;
        }
        self.names = keep.iter().map(|&i| self.names[i].clone()).collect();
        for row in self.rows.iter_mut() {
            *row = keep.iter().map(|&i| row[i].clone()).collect();
        }
    }

    /// Remove exact duplicate rows, keeping first occurrences. Returns the
    /// number of rows removed.
    pub fn dedup_rows(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(before);
        self.rows.retain(|row| seen.insert(row.clone()));
        before - self.rows.len()
    }
}

/// A fully numeric table: named columns over an `Array2<f64>`.
#[derive(Debug, Clone)]
pub struct Table {
    pub names: Vec<String>,
    pub x: Array2<f64>,
}

impl Table {
    pub fn new(names: Vec<String>, x: Array2<f64>) -> Result<Self> {
        if names.len() != x.ncols() {
            return Err(PipelineError::data(format!(
                "{} column names for a matrix with {} columns",
                names.len(),
                x.ncols()
            )));
        }
        Ok(Table { names, x })
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }

    pub fn col_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.x.column(idx)
    }

    /// New table containing exactly the given columns, in the given order.
    pub fn select_columns(&self, names: &[String]) -> Result<Table> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let idx = self
                .col_index(name)
                .ok_or_else(|| PipelineError::data(format!("missing column '{}'", name)))?;
            indices.push(idx);
        }
        let x = self.x.select(Axis(1), &indices);
        Table::new(names.to_vec(), x)
    }

    /// Split into a feature matrix and an integer label vector. The label
    /// column is removed from the returned feature set.
    pub fn split_label(&self, label: &str) -> Result<(Vec<String>, Array2<f64>, Vec<i64>)> {
        let label_idx = self
            .col_index(label)
            .ok_or_else(|| PipelineError::data(format!("missing label column '{}'", label)))?;

        let feature_indices: Vec<usize> =
            (0..self.ncols()).filter(|&i| i != label_idx).collect();
        let feature_names: Vec<String> = feature_indices
            .iter()
            .map(|&i| self.names[i].clone())
            .collect();
        let features = self.x.select(Axis(1), &feature_indices);
        let labels: Vec<i64> = self
            .column(label_idx)
            .iter()
            .map(|&v| v.round() as i64)
            .collect();
        Ok((feature_names, features, labels))
    }

    /// Rebuild a table from a feature matrix plus a label vector; the label
    /// becomes the last column.
    pub fn from_features_and_label(
        feature_names: &[String],
        features: Array2<f64>,
        label_name: &str,
        labels: &[i64],
    ) -> Result<Table> {
        if features.nrows() != labels.len() {
            return Err(PipelineError::data(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        let nrows = features.nrows();
        let ncols = features.ncols() + 1;
        let mut data = Vec::with_capacity(nrows * ncols);
        for (i, row) in features.rows().into_iter().enumerate() {
            data.extend(row.iter().copied());
            data.push(labels[i] as f64);
        }
        let mut names: Vec<String> = feature_names.to_vec();
        names.push(label_name.to_string());
        let x = Array2::from_shape_vec((nrows, ncols), data)?;
        Table::new(names, x)
    }
}
