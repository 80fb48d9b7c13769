//! Class rebalancing via synthetic minority oversampling.
//!
//! Synthetic rows are interpolations between a minority sample and one of
//! its k nearest minority neighbors, which is the classic SMOTE scheme.
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PipelineError, Result};
use crate::frame::Table;

const NEIGHBORS: usize = 5;

/// Oversample the minority class until both label classes have equal
/// counts. The label column is moved to the last position in the output.
pub fn balance_classes(table: &Table, label: &str, seed: u64) -> Result<Table> {
    log::info!("balancing classes on {} rows", table.nrows());

    let (feature_names, features, labels) = table.split_label(label).map_err(|e| {
        log::error!("balancing failed: {}", e);
        e
    })?;

    let mut counts: Vec<(i64, usize)> = Vec::new();
    for &l in &labels {
        match counts.iter_mut().find(|(c, _)| *c == l) {
            Some((_, n)) => *n += 1,
            None => counts.push((l, 1)),
        }
    }
    if counts.len() != 2 {
        let err = PipelineError::data(format!(
            "expected 2 label classes for oversampling, found {}",
            counts.len()
        ));
        log::error!("balancing failed: {}", err);
        return Err(err);
    }

    counts.sort_by_key(|&(_, n)| n);
    let (minority_label, minority_count) = counts[0];
    let (_, majority_count) = counts[1];
    let deficit = majority_count - minority_count;

    if deficit == 0 {
        return Table::from_features_and_label(&feature_names, features, label, &labels);
    }
    if minority_count < 2 {
        let err = PipelineError::data(
            "minority class needs at least 2 samples for interpolation",
        );
        log::error!("balancing failed: {}", err);
        return Err(err);
    }

    let minority_rows: Vec<Vec<f64>> = labels
        .iter()
        .enumerate()
        .filter(|(_, &l)| l == minority_label)
        .map(|(i, _)| features.row(i).to_vec())
        .collect();
    let neighbors = nearest_neighbors(&minority_rows, NEIGHBORS.min(minority_count - 1));

    let mut rng = StdRng::seed_from_u64(seed);
    let ncols = features.ncols();
    let total = features.nrows() + deficit;
    let mut data = Vec::with_capacity(total * ncols);
    data.extend(features.iter().copied());

    let mut out_labels = labels.clone();
    for _ in 0..deficit {
        let base = rng.gen_range(0..minority_rows.len());
        let nb = neighbors[base][rng.gen_range(0..neighbors[base].len())];
        let gap: f64 = rng.gen_range(0.0..1.0);
        for c in 0..ncols {
            let a = minority_rows[base][c];
            let b = minority_rows[nb][c];
            data.push(a + gap * (b - a));
        }
        out_labels.push(minority_label);
    }

    let resampled = Array2::from_shape_vec((total, ncols), data)?;
    log::info!(
        "oversampled minority class {} with {} synthetic rows",
        minority_label,
        deficit
    );
    Table::from_features_and_label(&feature_names, resampled, label, &out_labels)
}

/// Indices of the k nearest rows (by squared euclidean distance) for each
/// row. Quadratic, which is fine for minority-class sizes seen here.
fn nearest_neighbors(rows: &[Vec<f64>], k: usize) -> Vec<Vec<usize>> {
    let n = rows.len();
    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let mut dists: Vec<(usize, f64)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| {
                let d = rows[i]
                    .iter()
                    .zip(&rows[j])
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                (j, d)
            })
            .collect();
        dists.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        result.push(dists.into_iter().take(k).map(|(j, _)| j).collect());
    }
    result
}
