use std::error::Error;
use std::fmt;

/// Closed set of failure kinds for the pipeline stages.
///
/// Every stage failure is logged where it happens and surfaced as one of
/// these variants with the original cause formatted into the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Configuration file missing, unreadable or malformed.
    Config(String),
    /// Bad input data: missing columns, unparseable cells, degenerate class
    /// distributions.
    Data(String),
    /// Model fitting or hyperparameter search failure.
    Training(String),
    /// Filesystem or serialization failure while persisting artifacts.
    Io(String),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        PipelineError::Config(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        PipelineError::Data(msg.into())
    }

    pub fn training(msg: impl Into<String>) -> Self {
        PipelineError::Training(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        PipelineError::Io(msg.into())
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::Config(msg) => write!(f, "configuration error: {}", msg),
            PipelineError::Data(msg) => write!(f, "data error: {}", msg),
            PipelineError::Training(msg) => write!(f, "training error: {}", msg),
            PipelineError::Io(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::Io(e.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(e: csv::Error) -> Self {
        PipelineError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for PipelineError {
    fn from(e: serde_yaml::Error) -> Self {
        PipelineError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Io(e.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(e: ndarray::ShapeError) -> Self {
        PipelineError::Data(e.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PipelineError>;
