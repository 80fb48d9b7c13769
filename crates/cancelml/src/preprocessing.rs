//! Raw-data cleaning: column drops, deduplication, label encoding and
//! skew correction.
//!
//! Encoding maps are fit from whatever values are present in the split
//! being processed and are logged rather than persisted; see DESIGN.md for
//! the open question on reusing them at inference time.
use std::collections::BTreeMap;

use ndarray::Array2;

use crate::config::DataProcessingConfig;
use crate::error::{PipelineError, Result};
use crate::frame::{RawFrame, Table};

/// Per-column mapping from categorical string value to integer code.
pub type LabelEncodings = BTreeMap<String, BTreeMap<String, i64>>;

/// Fit a label encoding for one column: sorted unique values get codes
/// 0..n, so the assignment is deterministic for a given value set.
pub fn fit_label_encoding(values: &[&str]) -> BTreeMap<String, i64> {
    let mut unique: Vec<&str> = values.to_vec();
    unique.sort_unstable();
    unique.dedup();
    unique
        .into_iter()
        .enumerate()
        .map(|(code, value)| (value.to_string(), code as i64))
        .collect()
}

/// Bias-corrected sample skewness (the Fisher-Pearson adjusted estimate).
/// Returns 0.0 for degenerate inputs (fewer than 3 values or zero
/// variance).
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let n_f = n as f64;
    let mean = values.iter().sum::<f64>() / n_f;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n_f;
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n_f;
    if m2 <= f64::EPSILON {
        return 0.0;
    }
    let g1 = m3 / m2.powf(1.5);
    g1 * (n_f * (n_f - 1.0)).sqrt() / (n_f - 2.0)
}

/// Clean one raw split into a numeric table.
///
/// Steps, in order: drop configured identifier columns, drop exact
/// duplicate rows, label-encode categorical columns, parse the remaining
/// columns as floats, and apply `ln(1+x)` to every configured numeric
/// column whose skewness exceeds the threshold.
pub fn preprocess(
    mut frame: RawFrame,
    config: &DataProcessingConfig,
) -> Result<(Table, LabelEncodings)> {
    log::info!("starting preprocessing on {} rows", frame.nrows());

    frame.drop_columns(&config.drop_columns);
    let removed = frame.dedup_rows();
    if removed > 0 {
        log::info!("dropped {} duplicate rows", removed);
    }
    if frame.nrows() == 0 {
        return Err(PipelineError::data("no rows left after deduplication"));
    }

    let mut encodings = LabelEncodings::new();
    for col in &config.categorical_columns {
        let values = frame.column(col).map_err(|e| {
            log::error!("preprocessing failed: {}", e);
            e
        })?;
        let mapping = fit_label_encoding(&values);
        log::info!("label mapping for {}: {:?}", col, mapping);
        encodings.insert(col.clone(), mapping);
    }

    let nrows = frame.nrows();
    let ncols = frame.names.len();
    let mut data = vec![0.0f64; nrows * ncols];

    for (col_idx, name) in frame.names.iter().enumerate() {
        if let Some(mapping) = encodings.get(name) {
            for (row_idx, row) in frame.rows.iter().enumerate() {
                // Mapping was fit from this same column, so lookups cannot miss.
                data[row_idx * ncols + col_idx] = mapping[&row[col_idx]] as f64;
            }
        } else {
            for (row_idx, row) in frame.rows.iter().enumerate() {
                let cell = &row[col_idx];
                data[row_idx * ncols + col_idx] = cell.parse().map_err(|_| {
                    let err = PipelineError::data(format!(
                        "non-numeric value '{}' in column '{}' at row {}",
                        cell,
                        name,
                        row_idx + 1
                    ));
                    log::error!("preprocessing failed: {}", err);
                    err
                })?;
            }
        }
    }

    let x = Array2::from_shape_vec((nrows, ncols), data)?;
    let mut table = Table::new(frame.names, x)?;

    apply_skew_transform(&mut table, config)?;

    log::info!(
        "preprocessing produced {} rows x {} columns",
        table.nrows(),
        table.ncols()
    );
    Ok((table, encodings))
}

fn apply_skew_transform(table: &mut Table, config: &DataProcessingConfig) -> Result<()> {
    for col in &config.numerical_columns {
        let idx = table.col_index(col).ok_or_else(|| {
            let err =
                PipelineError::data(format!("numerical column '{}' not found", col));
            log::error!("skew handling failed: {}", err);
            err
        })?;
        let values: Vec<f64> = table.column(idx).to_vec();
        let skew = skewness(&values);
        if skew > config.skewness_threshold {
            log::info!(
                "column {} has skewness {:.3} > {:.3}, applying log1p",
                col,
                skew,
                config.skewness_threshold
            );
            for v in table.x.column_mut(idx).iter_mut() {
                *v = v.ln_1p();
            }
        }
    }
    Ok(())
}
