//! Data-processing stage: raw CSVs in, processed CSVs out.
use std::path::PathBuf;

use crate::config::DataProcessingConfig;
use crate::error::Result;
use crate::feature_selection;
use crate::frame::Table;
use crate::io;
use crate::preprocessing::{self, LabelEncodings};
use crate::sampling;

/// Orchestrates load -> preprocess -> balance -> select -> persist for the
/// train and test splits.
pub struct DataProcessor {
    train_path: PathBuf,
    test_path: PathBuf,
    processed_train: PathBuf,
    processed_test: PathBuf,
    config: DataProcessingConfig,
}

impl DataProcessor {
    pub fn new(
        train_path: PathBuf,
        test_path: PathBuf,
        processed_train: PathBuf,
        processed_test: PathBuf,
        config: DataProcessingConfig,
    ) -> Self {
        DataProcessor {
            train_path,
            test_path,
            processed_train,
            processed_test,
            config,
        }
    }

    /// Clean one raw split. See [`preprocessing::preprocess`].
    pub fn preprocess(&self, frame: crate::frame::RawFrame) -> Result<(Table, LabelEncodings)> {
        preprocessing::preprocess(frame, &self.config)
    }

    /// Oversample the minority class to parity.
    pub fn balance_data(&self, table: &Table) -> Result<Table> {
        sampling::balance_classes(table, &self.config.label_column, self.config.seed)
    }

    /// Keep the top-K importance-ranked features plus the label.
    pub fn select_features(&self, table: &Table) -> Result<Table> {
        feature_selection::select_features(table, &self.config)
    }

    pub fn save_data(&self, table: &Table, path: &std::path::Path) -> Result<()> {
        io::write_table_csv(table, path).map_err(|e| {
            log::error!("saving processed data failed: {}", e);
            e
        })
    }

    /// Run the whole stage. The test split is forced onto the train
    /// split's selected column set so both processed files line up.
    pub fn process(&self) -> Result<()> {
        log::info!("starting data processing");

        let train_raw = io::read_raw_csv(&self.train_path)?;
        let test_raw = io::read_raw_csv(&self.test_path)?;

        let (train, _train_encodings) = self.preprocess(train_raw)?;
        let (test, _test_encodings) = self.preprocess(test_raw)?;

        let train = self.balance_data(&train)?;
        let test = self.balance_data(&test)?;

        let train = self.select_features(&train)?;
        let test = test.select_columns(&train.names)?;

        self.save_data(&train, &self.processed_train)?;
        self.save_data(&test, &self.processed_test)?;

        log::info!("data processing completed");
        Ok(())
    }
}
