//! Bootstrap forest of CART trees used for impurity-based feature ranking.
//!
//! Only the importance accumulation is kept per tree; the fitted trees
//! themselves are not used for prediction anywhere in the pipeline.
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::ForestConfig;
use crate::error::{PipelineError, Result};

/// Fit a random forest on the full feature set and return one mean
/// decrease-in-impurity score per feature, normalized to sum to 1.
pub fn gini_importances(
    x: &Array2<f64>,
    y: &[i64],
    config: &ForestConfig,
    seed: u64,
) -> Result<Vec<f64>> {
    let n_samples = x.nrows();
    let n_features = x.ncols();
    if n_samples == 0 || n_features == 0 {
        return Err(PipelineError::data("cannot fit a forest on an empty matrix"));
    }
    if y.len() != n_samples {
        return Err(PipelineError::data(format!(
            "{} labels for {} samples",
            y.len(),
            n_samples
        )));
    }

    let summed: Vec<f64> = (0..config.n_trees)
        .into_par_iter()
        .map(|tree_idx| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(tree_idx as u64));
            let indices: Vec<usize> =
                (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            let mut importances = vec![0.0; n_features];
            grow_tree(x, y, &indices, 0, config, &mut rng, &mut importances);
            importances
        })
        .reduce(
            || vec![0.0; n_features],
            |mut acc, tree| {
                for (a, t) in acc.iter_mut().zip(tree) {
                    *a += t;
                }
                acc
            },
        );

    let total: f64 = summed.iter().sum();
    if total <= 0.0 {
        // All trees were pure at the root; spread importance evenly.
        return Ok(vec![1.0 / n_features as f64; n_features]);
    }
    Ok(summed.iter().map(|v| v / total).collect())
}

struct Split {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

fn gini(pos: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = pos as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

/// Recursively grow one tree over the bootstrap sample `indices`,
/// accumulating the per-feature impurity decrease weighted by node size.
fn grow_tree(
    x: &Array2<f64>,
    y: &[i64],
    indices: &[usize],
    depth: usize,
    config: &ForestConfig,
    rng: &mut StdRng,
    importances: &mut [f64],
) {
    let node_total = indices.len();
    let node_pos = indices.iter().filter(|&&i| y[i] != 0).count();
    let node_gini = gini(node_pos, node_total);

    if depth >= config.max_depth
        || node_total < config.min_samples_split
        || node_gini == 0.0
    {
        return;
    }

    let n_features = x.ncols();
    let mtry = (n_features as f64).sqrt().ceil() as usize;
    let mut candidates: Vec<usize> = (0..n_features).collect();
    // Partial Fisher-Yates: the first mtry entries become the feature subset.
    for i in 0..mtry.min(n_features) {
        let j = rng.gen_range(i..n_features);
        candidates.swap(i, j);
    }

    let mut best: Option<Split> = None;
    for &feature in candidates.iter().take(mtry.min(n_features)) {
        if let Some(split) = best_split_for_feature(x, y, indices, feature, node_gini) {
            if best.as_ref().map_or(true, |b| split.decrease > b.decrease) {
                best = Some(split);
            }
        }
    }

    let Some(split) = best else { return };
    if split.decrease <= 1e-12 {
        return;
    }

    importances[split.feature] += indices.len() as f64 * split.decrease;

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| x[(i, split.feature)] <= split.threshold);
    if left.is_empty() || right.is_empty() {
        return;
    }
    grow_tree(x, y, &left, depth + 1, config, rng, importances);
    grow_tree(x, y, &right, depth + 1, config, rng, importances);
}

/// Best threshold for one feature by scanning the sorted node values.
fn best_split_for_feature(
    x: &Array2<f64>,
    y: &[i64],
    indices: &[usize],
    feature: usize,
    node_gini: f64,
) -> Option<Split> {
    let total = indices.len();
    let total_pos = indices.iter().filter(|&&i| y[i] != 0).count();

    let mut values: Vec<(f64, bool)> = indices
        .iter()
        .map(|&i| (x[(i, feature)], y[i] != 0))
        .collect();
    values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut best: Option<Split> = None;
    let mut left_total = 0usize;
    let mut left_pos = 0usize;

    for w in 0..total - 1 {
        left_total += 1;
        if values[w].1 {
            left_pos += 1;
        }
        // Only split between distinct values.
        if values[w].0 == values[w + 1].0 {
            continue;
        }
        let right_total = total - left_total;
        let right_pos = total_pos - left_pos;
        let weighted = (left_total as f64 * gini(left_pos, left_total)
            + right_total as f64 * gini(right_pos, right_total))
            / total as f64;
        let decrease = node_gini - weighted;
        if best.as_ref().map_or(true, |b| decrease > b.decrease) {
            best = Some(Split {
                feature,
                threshold: (values[w].0 + values[w + 1].0) / 2.0,
                decrease,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn informative_feature_dominates_ranking() {
        // Feature 0 separates the classes perfectly, feature 1 is constant
        // noise, feature 2 is weakly related.
        let n = 40;
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n {
            let class = i % 2;
            data.push(class as f64 * 10.0 + (i % 3) as f64 * 0.1);
            data.push(5.0);
            data.push((i % 7) as f64);
            labels.push(class as i64);
        }
        let x = Array2::from_shape_vec((n, 3), data).unwrap();

        let config = ForestConfig {
            n_trees: 20,
            max_depth: 6,
            min_samples_split: 2,
        };
        let importances = gini_importances(&x, &labels, &config, 42).unwrap();

        assert_eq!(importances.len(), 3);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(
            importances[0] > importances[1] && importances[0] > importances[2],
            "importances = {:?}",
            importances
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        let x = Array2::<f64>::zeros((0, 2));
        let config = ForestConfig::default();
        assert!(gini_importances(&x, &[], &config, 1).is_err());
    }
}
