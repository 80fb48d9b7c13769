//! Typed configuration for the pipeline, loaded from a single YAML document.
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    pub data_processing: DataProcessingConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

/// Filesystem locations for the pipeline stages. Stage binaries read these
/// from the config document rather than taking them as CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub raw_train: PathBuf,
    pub raw_test: PathBuf,
    pub processed_dir: PathBuf,
    pub model_path: PathBuf,
    pub experiments_dir: PathBuf,
    pub frontend_dist: PathBuf,
    pub bind_addr: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            raw_train: PathBuf::from("artifacts/raw/train.csv"),
            raw_test: PathBuf::from("artifacts/raw/test.csv"),
            processed_dir: PathBuf::from("artifacts/processed"),
            model_path: PathBuf::from("artifacts/models/gbdt_model.json"),
            experiments_dir: PathBuf::from("artifacts/experiments"),
            frontend_dist: PathBuf::from("frontend/dist"),
            bind_addr: String::from("0.0.0.0:8080"),
        }
    }
}

impl PathsConfig {
    pub fn processed_train(&self) -> PathBuf {
        self.processed_dir.join("processed_train.csv")
    }

    pub fn processed_test(&self) -> PathBuf {
        self.processed_dir.join("processed_test.csv")
    }
}

/// Column roles and thresholds for the data processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataProcessingConfig {
    /// Identifier/index columns removed before any other step. Columns not
    /// present in the input are ignored.
    #[serde(default = "default_drop_columns")]
    pub drop_columns: Vec<String>,
    /// Columns label-encoded to integer codes. The label column belongs
    /// here when the raw data stores it as text.
    pub categorical_columns: Vec<String>,
    /// Columns checked for skew and log-transformed above the threshold.
    pub numerical_columns: Vec<String>,
    pub skewness_threshold: f64,
    /// Number of top-ranked features kept by feature selection.
    pub no_of_features: usize,
    #[serde(default = "default_label_column")]
    pub label_column: String,
    /// Random-forest settings used for importance ranking.
    #[serde(default)]
    pub forest: ForestConfig,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_drop_columns() -> Vec<String> {
    vec![String::from("Unnamed: 0"), String::from("Booking_ID")]
}

fn default_label_column() -> String {
    String::from("booking_status")
}

fn default_seed() -> u64 {
    42
}

/// Settings for the importance-ranking random forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            n_trees: 100,
            max_depth: 12,
            min_samples_split: 2,
        }
    }
}

/// Training-stage configuration: the sampled parameter ranges plus the
/// randomized-search settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub param_space: ParamSpace,
    pub search: SearchParams,
}

/// Inclusive ranges the randomized search samples GBDT parameters from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamSpace {
    pub iterations: (usize, usize),
    pub max_depth: (u32, u32),
    pub shrinkage: (f64, f64),
    pub data_sample_ratio: (f64, f64),
    pub feature_sample_ratio: (f64, f64),
}

impl Default for ParamSpace {
    fn default() -> Self {
        ParamSpace {
            iterations: (50, 300),
            max_depth: (3, 10),
            shrinkage: (0.01, 0.2),
            data_sample_ratio: (0.6, 1.0),
            feature_sample_ratio: (0.6, 1.0),
        }
    }
}

/// Randomized cross-validated search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Number of sampled parameter combinations.
    pub n_iter: usize,
    /// Cross-validation fold count.
    pub cv: usize,
    pub scoring: Scoring,
    pub seed: u64,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            n_iter: 5,
            cv: 3,
            scoring: Scoring::F1,
            seed: 42,
        }
    }
}

/// Scoring metric used to rank search candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    Accuracy,
    Precision,
    Recall,
    F1,
}

impl FromStr for Scoring {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accuracy" => Ok(Scoring::Accuracy),
            "precision" => Ok(Scoring::Precision),
            "recall" => Ok(Scoring::Recall),
            "f1" => Ok(Scoring::F1),
            _ => Err(format!(
                "Unknown scoring metric: {}. Expected one of accuracy, precision, recall, f1",
                s
            )),
        }
    }
}

/// Read and deserialize the YAML configuration document.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        PipelineError::config(format!("failed to read config file {}: {}", path.display(), e))
    })?;
    let config: PipelineConfig = serde_yaml::from_str(&raw).map_err(|e| {
        PipelineError::config(format!("failed to parse config file {}: {}", path.display(), e))
    })?;
    log::info!("loaded configuration from {}", path.display());
    Ok(config)
}
