//! Randomized hyperparameter search with k-fold cross-validation.
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::{ParamSpace, SearchParams};
use crate::error::{PipelineError, Result};
use crate::models::{GbdtClassifier, GbdtParams};
use crate::stats;

/// Result of a randomized search: the winning parameter set, its mean
/// cross-validation score, and the per-candidate scores.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_params: GbdtParams,
    pub best_score: f64,
    pub candidates: Vec<(GbdtParams, f64)>,
}

/// Sample one parameter set from the configured ranges.
fn sample_params(space: &ParamSpace, rng: &mut StdRng) -> GbdtParams {
    GbdtParams {
        iterations: rng.gen_range(space.iterations.0..=space.iterations.1),
        max_depth: rng.gen_range(space.max_depth.0..=space.max_depth.1),
        shrinkage: rng.gen_range(space.shrinkage.0..=space.shrinkage.1),
        data_sample_ratio: rng.gen_range(space.data_sample_ratio.0..=space.data_sample_ratio.1),
        feature_sample_ratio: rng
            .gen_range(space.feature_sample_ratio.0..=space.feature_sample_ratio.1),
    }
}

/// Shuffled row indices partitioned into `cv` contiguous folds.
fn make_folds(n_samples: usize, cv: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let base = n_samples / cv;
    let extra = n_samples % cv;
    let mut folds = Vec::with_capacity(cv);
    let mut start = 0;
    for fold_idx in 0..cv {
        let len = base + usize::from(fold_idx < extra);
        folds.push(indices[start..start + len].to_vec());
        start += len;
    }
    folds
}

/// Mean cross-validation score of one parameter set.
fn cross_validate(
    x: &Array2<f64>,
    y: &[i64],
    params: &GbdtParams,
    folds: &[Vec<usize>],
    search: &SearchParams,
) -> Result<f64> {
    let mut total = 0.0;
    for holdout in folds {
        let train_idx: Vec<usize> = folds
            .iter()
            .filter(|f| !std::ptr::eq(*f, holdout))
            .flatten()
            .copied()
            .collect();

        let x_train = x.select(Axis(0), &train_idx);
        let y_train: Vec<i64> = train_idx.iter().map(|&i| y[i]).collect();
        let x_val = x.select(Axis(0), holdout);
        let y_val: Vec<i64> = holdout.iter().map(|&i| y[i]).collect();

        let mut model = GbdtClassifier::new(params.clone());
        model.fit(&x_train, &y_train)?;
        let preds = model.predict(&x_val)?;
        total += stats::evaluate(&y_val, &preds)?.score(search.scoring);
    }
    Ok(total / folds.len() as f64)
}

/// Run the randomized search and refit the best candidate on the full
/// training split.
pub fn random_search(
    x: &Array2<f64>,
    y: &[i64],
    space: &ParamSpace,
    search: &SearchParams,
) -> Result<(GbdtClassifier, SearchOutcome)> {
    if search.n_iter == 0 {
        return Err(PipelineError::training("search requires n_iter > 0"));
    }
    if search.cv < 2 {
        return Err(PipelineError::training("search requires at least 2 folds"));
    }
    if x.nrows() < search.cv {
        return Err(PipelineError::training(format!(
            "{} samples cannot be split into {} folds",
            x.nrows(),
            search.cv
        )));
    }

    let mut rng = StdRng::seed_from_u64(search.seed);
    let params: Vec<GbdtParams> = (0..search.n_iter)
        .map(|_| sample_params(space, &mut rng))
        .collect();
    let folds = make_folds(x.nrows(), search.cv, search.seed);

    log::info!(
        "randomized search: {} candidates, {}-fold cross-validation, scoring {:?}",
        search.n_iter,
        search.cv,
        search.scoring
    );

    let candidates: Vec<(GbdtParams, f64)> = params
        .into_par_iter()
        .map(|p| {
            let score = cross_validate(x, y, &p, &folds, search)?;
            log::debug!("candidate {:?} scored {:.4}", p, score);
            Ok((p, score))
        })
        .collect::<Result<Vec<_>>>()?;

    // Ties resolve to the earliest sampled candidate.
    let (best_params, best_score) = candidates
        .iter()
        .cloned()
        .reduce(|best, cur| if cur.1 > best.1 { cur } else { best })
        .ok_or_else(|| PipelineError::training("search produced no candidates"))?;

    log::info!("best params {:?} with score {:.4}", best_params, best_score);

    let mut model = GbdtClassifier::new(best_params.clone());
    model.fit(x, y)?;

    Ok((
        model,
        SearchOutcome {
            best_params,
            best_score,
            candidates,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_partition_all_samples() {
        let folds = make_folds(10, 3, 42);
        assert_eq!(folds.len(), 3);
        let mut all: Vec<usize> = folds.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn sampled_params_stay_in_range() {
        let space = ParamSpace::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let p = sample_params(&space, &mut rng);
            assert!(p.iterations >= space.iterations.0 && p.iterations <= space.iterations.1);
            assert!(p.max_depth >= space.max_depth.0 && p.max_depth <= space.max_depth.1);
            assert!(p.shrinkage >= space.shrinkage.0 && p.shrinkage <= space.shrinkage.1);
        }
    }

    #[test]
    fn too_few_samples_for_folds_is_rejected() {
        let x = Array2::zeros((2, 2));
        let y = vec![0, 1];
        let err = random_search(
            &x,
            &y,
            &ParamSpace::default(),
            &SearchParams {
                cv: 3,
                ..SearchParams::default()
            },
        );
        assert!(err.is_err());
    }
}
