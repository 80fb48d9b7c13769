//! Gradient Boosting Decision Tree classifier wrapper.
use std::path::Path;

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Hyper-parameters for the GBDT classifier. Field names mirror the
/// underlying library configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GbdtParams {
    pub iterations: usize,
    pub max_depth: u32,
    pub shrinkage: f64,
    pub data_sample_ratio: f64,
    pub feature_sample_ratio: f64,
}

impl Default for GbdtParams {
    fn default() -> Self {
        GbdtParams {
            iterations: 100,
            max_depth: 6,
            shrinkage: 0.1,
            data_sample_ratio: 1.0,
            feature_sample_ratio: 1.0,
        }
    }
}

/// Binary GBDT classifier over `{0, 1}` labels.
///
/// Internally trains with the log-likelihood loss, which expects labels in
/// `{-1, 1}` and yields positive-class probabilities at prediction time.
pub struct GbdtClassifier {
    model: Option<GBDT>,
    params: GbdtParams,
}

impl GbdtClassifier {
    pub fn new(params: GbdtParams) -> Self {
        GbdtClassifier {
            model: None,
            params,
        }
    }

    pub fn params(&self) -> &GbdtParams {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Fit on a feature matrix and `{0, 1}` labels.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[i64]) -> Result<()> {
        if x.nrows() == 0 {
            return Err(PipelineError::training("cannot fit on an empty matrix"));
        }
        if x.nrows() != y.len() {
            return Err(PipelineError::training(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }

        let mut config = Config::new();
        config.set_feature_size(x.ncols());
        config.set_max_depth(self.params.max_depth);
        config.set_iterations(self.params.iterations);
        config.set_shrinkage(self.params.shrinkage as f32);
        config.set_data_sample_ratio(self.params.data_sample_ratio);
        config.set_feature_sample_ratio(self.params.feature_sample_ratio);
        config.set_loss("LogLikelyhood");
        config.set_debug(false);
        config.set_training_optimization_level(2);

        let mut gbdt = GBDT::new(&config);

        let mut train_dv = DataVec::with_capacity(x.nrows());
        for (i, row) in x.rows().into_iter().enumerate() {
            let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
            let label = if y[i] != 0 { 1.0 } else { -1.0 };
            train_dv.push(Data::new_training_data(features, 1.0, label, None));
        }

        gbdt.fit(&mut train_dv);
        self.model = Some(gbdt);
        Ok(())
    }

    /// Positive-class probability per row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PipelineError::training("predict called before fit"))?;

        let mut test_dv = DataVec::with_capacity(x.nrows());
        for row in x.rows() {
            let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
            test_dv.push(Data::new_training_data(features, 1.0, 0.0, None));
        }
        let probs = model.predict(&test_dv);
        Ok(probs.into_iter().map(|p| p as f64).collect())
    }

    /// Hard `{0, 1}` predictions, thresholded at 0.5.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<i64>> {
        let probs = self.predict_proba(x)?;
        Ok(probs.into_iter().map(|p| i64::from(p > 0.5)).collect())
    }

    /// Persist the fitted model, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PipelineError::training("save called before fit"))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| PipelineError::io(format!("non-utf8 model path {:?}", path)))?;
        model
            .save_model(path_str)
            .map_err(|e| PipelineError::io(format!("failed to save model to {}: {}", path_str, e)))?;
        log::info!("model saved to {}", path_str);
        Ok(())
    }

    /// Load a previously persisted model. The stored file does not carry
    /// the training hyper-parameters, so defaults are kept for `params`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path
            .to_str()
            .ok_or_else(|| PipelineError::io(format!("non-utf8 model path {:?}", path)))?;
        let model = GBDT::load_model(path_str).map_err(|e| {
            PipelineError::io(format!("failed to load model from {}: {}", path_str, e))
        })?;
        Ok(GbdtClassifier {
            model: Some(model),
            params: GbdtParams::default(),
        })
    }
}
