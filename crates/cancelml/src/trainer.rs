//! Training stage: processed CSVs in, persisted model plus tracked
//! metrics out.
use std::path::PathBuf;

use ndarray::Array2;

use crate::config::TrainingConfig;
use crate::error::{PipelineError, Result};
use crate::io;
use crate::models::GbdtClassifier;
use crate::search::{self, SearchOutcome};
use crate::stats::{self, Metrics};
use crate::tracking::RunTracker;

/// Orchestrates hyperparameter search, evaluation, model persistence and
/// run tracking.
pub struct ModelTrainer {
    train_path: PathBuf,
    test_path: PathBuf,
    model_output_path: PathBuf,
    experiments_dir: PathBuf,
    label_column: String,
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(
        train_path: PathBuf,
        test_path: PathBuf,
        model_output_path: PathBuf,
        experiments_dir: PathBuf,
        label_column: String,
        config: TrainingConfig,
    ) -> Self {
        ModelTrainer {
            train_path,
            test_path,
            model_output_path,
            experiments_dir,
            label_column,
            config,
        }
    }

    /// Read both processed splits and separate features from labels.
    #[allow(clippy::type_complexity)]
    pub fn load_and_split_data(
        &self,
    ) -> Result<(Array2<f64>, Vec<i64>, Array2<f64>, Vec<i64>)> {
        log::info!("loading training data from {}", self.train_path.display());
        let train = io::read_table_csv(&self.train_path)?;
        log::info!("loading testing data from {}", self.test_path.display());
        let test = io::read_table_csv(&self.test_path)?;

        let (_, x_train, y_train) = train.split_label(&self.label_column)?;
        let (_, x_test, y_test) = test.split_label(&self.label_column)?;
        Ok((x_train, y_train, x_test, y_test))
    }

    /// Randomized search over the configured parameter space; the best
    /// candidate is refit on the full training split.
    pub fn train(&self, x: &Array2<f64>, y: &[i64]) -> Result<(GbdtClassifier, SearchOutcome)> {
        search::random_search(x, y, &self.config.param_space, &self.config.search).map_err(|e| {
            log::error!("hyperparameter search failed: {}", e);
            e
        })
    }

    pub fn evaluate_model(
        &self,
        model: &GbdtClassifier,
        x_test: &Array2<f64>,
        y_test: &[i64],
    ) -> Result<Metrics> {
        let preds = model.predict(x_test)?;
        let metrics = stats::evaluate(y_test, &preds)?;
        log::info!(
            "evaluation: accuracy={:.4} precision={:.4} recall={:.4} f1={:.4}",
            metrics.accuracy,
            metrics.precision,
            metrics.recall,
            metrics.f1
        );
        Ok(metrics)
    }

    pub fn save_model(&self, model: &GbdtClassifier) -> Result<()> {
        model.save(&self.model_output_path).map_err(|e| {
            log::error!("saving model failed: {}", e);
            e
        })
    }

    /// Run the whole stage inside a tracked session.
    pub fn run(&self) -> Result<Metrics> {
        log::info!("starting model training pipeline");

        let mut tracker = RunTracker::start(&self.experiments_dir)?;
        tracker.log_artifact(&self.train_path, "datasets")?;
        tracker.log_artifact(&self.test_path, "datasets")?;

        let (x_train, y_train, x_test, y_test) = self.load_and_split_data().map_err(|e| {
            log::error!("loading training data failed: {}", e);
            e
        })?;
        if x_train.ncols() != x_test.ncols() {
            let err = PipelineError::data(format!(
                "train has {} feature columns but test has {}",
                x_train.ncols(),
                x_test.ncols()
            ));
            log::error!("loading training data failed: {}", err);
            return Err(err);
        }

        let (model, outcome) = self.train(&x_train, &y_train)?;
        let metrics = self.evaluate_model(&model, &x_test, &y_test)?;
        self.save_model(&model)?;

        tracker.log_artifact(&self.model_output_path, "model")?;
        tracker.log_params(model.params())?;
        tracker.log_metrics(&metrics)?;
        tracker.write_report(model.params(), &metrics, outcome.best_score)?;

        log::info!("model training completed");
        Ok(metrics)
    }
}
