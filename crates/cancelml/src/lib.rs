//! cancelml: hotel booking cancellation prediction pipeline.
//!
//! The crate covers the batch side of the system: cleaning and encoding
//! raw booking CSVs, rebalancing classes with synthetic oversampling,
//! selecting features by random-forest importance, training a
//! gradient-boosted tree classifier with randomized hyperparameter search,
//! and tracking each training run's artifacts. The HTTP prediction
//! service lives in the companion CLI crate and consumes the persisted
//! model through [`models::GbdtClassifier`].
pub mod config;
pub mod error;
pub mod feature_selection;
pub mod frame;
pub mod io;
pub mod models;
pub mod preprocessing;
pub mod processor;
pub mod sampling;
pub mod search;
pub mod stats;
pub mod tracking;
pub mod trainer;
