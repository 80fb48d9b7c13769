//! Model wrappers.
mod gbdt;

pub use gbdt::{GbdtClassifier, GbdtParams};
