//! File-based experiment tracking.
//!
//! Each training run gets a timestamped directory under the experiments
//! dir holding copies of the input datasets, the model file, the best
//! parameters, the evaluation metrics and an HTML run report.
use std::path::{Path, PathBuf};

use chrono::Local;
use maud::{html, Markup, DOCTYPE};
use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::models::GbdtParams;
use crate::stats::Metrics;

/// One tracked training run.
pub struct RunTracker {
    run_dir: PathBuf,
    artifacts: Vec<String>,
}

impl RunTracker {
    /// Create a fresh run directory named after the current local time.
    pub fn start<P: AsRef<Path>>(experiments_dir: P) -> Result<Self> {
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let run_dir = experiments_dir.as_ref().join(format!("run-{}", stamp));
        std::fs::create_dir_all(&run_dir).map_err(|e| {
            PipelineError::io(format!(
                "failed to create run directory {}: {}",
                run_dir.display(),
                e
            ))
        })?;
        log::info!("tracking run in {}", run_dir.display());
        Ok(RunTracker {
            run_dir,
            artifacts: Vec::new(),
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Copy a file into the run directory under the given subdirectory.
    pub fn log_artifact<P: AsRef<Path>>(&mut self, path: P, subdir: &str) -> Result<()> {
        let src = path.as_ref();
        let file_name = src
            .file_name()
            .ok_or_else(|| PipelineError::io(format!("artifact path {:?} has no file name", src)))?;
        let dest_dir = self.run_dir.join(subdir);
        std::fs::create_dir_all(&dest_dir)?;
        let dest = dest_dir.join(file_name);
        std::fs::copy(src, &dest).map_err(|e| {
            PipelineError::io(format!(
                "failed to copy artifact {} into run directory: {}",
                src.display(),
                e
            ))
        })?;
        self.artifacts
            .push(format!("{}/{}", subdir, file_name.to_string_lossy()));
        log::info!("logged artifact {}", dest.display());
        Ok(())
    }

    pub fn log_params(&self, params: &GbdtParams) -> Result<()> {
        self.write_json("params.json", params)
    }

    pub fn log_metrics(&self, metrics: &Metrics) -> Result<()> {
        self.write_json("metrics.json", metrics)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.run_dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, json)?;
        log::info!("wrote {}", path.display());
        Ok(())
    }

    /// Render the HTML run report summarizing params, metrics and logged
    /// artifacts.
    pub fn write_report(&self, params: &GbdtParams, metrics: &Metrics, cv_score: f64) -> Result<()> {
        let page = report_page(self, params, metrics, cv_score);
        let path = self.run_dir.join("report.html");
        std::fs::write(&path, page.into_string())?;
        log::info!("wrote run report {}", path.display());
        Ok(())
    }
}

fn report_page(
    tracker: &RunTracker,
    params: &GbdtParams,
    metrics: &Metrics,
    cv_score: f64,
) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Training run report" }
                style {
                    "body{font-family:sans-serif;margin:2em;}"
                    "table{border-collapse:collapse;}"
                    "td,th{border:1px solid #999;padding:4px 10px;text-align:left;}"
                }
            }
            body {
                h1 { "Booking cancellation model - training run" }
                p { "Generated " (Local::now().format("%Y-%m-%d %H:%M:%S")) }

                h2 { "Best hyperparameters" }
                table {
                    tr { th { "Parameter" } th { "Value" } }
                    tr { td { "iterations" } td { (params.iterations) } }
                    tr { td { "max_depth" } td { (params.max_depth) } }
                    tr { td { "shrinkage" } td { (format!("{:.4}", params.shrinkage)) } }
                    tr { td { "data_sample_ratio" } td { (format!("{:.3}", params.data_sample_ratio)) } }
                    tr { td { "feature_sample_ratio" } td { (format!("{:.3}", params.feature_sample_ratio)) } }
                }
                p { "Mean cross-validation score: " (format!("{:.4}", cv_score)) }

                h2 { "Held-out metrics" }
                table {
                    tr { th { "Metric" } th { "Value" } }
                    tr { td { "accuracy" } td { (format!("{:.4}", metrics.accuracy)) } }
                    tr { td { "precision" } td { (format!("{:.4}", metrics.precision)) } }
                    tr { td { "recall" } td { (format!("{:.4}", metrics.recall)) } }
                    tr { td { "f1" } td { (format!("{:.4}", metrics.f1)) } }
                }

                h2 { "Artifacts" }
                ul {
                    @for artifact in &tracker.artifacts {
                        li { (artifact) }
                    }
                }
            }
        }
    }
}
