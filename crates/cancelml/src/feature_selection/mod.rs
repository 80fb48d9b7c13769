//! Importance-based feature selection.
mod forest;

pub use forest::gini_importances;

use crate::config::DataProcessingConfig;
use crate::error::Result;
use crate::frame::Table;

/// One feature with its normalized importance score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    pub name: String,
    pub importance: f64,
}

/// Rank every feature column by random-forest impurity importance,
/// descending. Ties keep the original column order.
pub fn rank_features(table: &Table, config: &DataProcessingConfig) -> Result<Vec<RankedFeature>> {
    let (feature_names, features, labels) = table.split_label(&config.label_column)?;
    let importances = gini_importances(&features, &labels, &config.forest, config.seed)?;

    let mut ranked: Vec<RankedFeature> = feature_names
        .into_iter()
        .zip(importances)
        .map(|(name, importance)| RankedFeature { name, importance })
        .collect();
    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(ranked)
}

/// Keep the configured top-K features plus the label column.
pub fn select_features(table: &Table, config: &DataProcessingConfig) -> Result<Table> {
    log::info!("starting feature selection on {} columns", table.ncols());

    let ranked = rank_features(table, config).map_err(|e| {
        log::error!("feature selection failed: {}", e);
        e
    })?;

    let mut keep: Vec<String> = ranked
        .iter()
        .take(config.no_of_features)
        .map(|f| f.name.clone())
        .collect();
    log::info!("top {} features: {:?}", keep.len(), keep);
    keep.push(config.label_column.clone());

    table.select_columns(&keep)
}
