use std::io;
use thiserror::Error;

/// Crate-wide error type for the triage pipeline and its offline training path.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The trained model artifact is missing, corrupt, or does not match the
    /// feature space it claims to use. Fatal for the request.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Empty or non-text input, rejected before feature extraction.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A condition label could not be mapped to any recommendation store key.
    /// Only ever produced inside the pipeline; the recommendation resolver
    /// absorbs it through its fallback chain.
    #[error("Unresolved condition: {0}")]
    UnresolvedCondition(String),

    /// Training data that cannot produce a model (empty, single label, ...).
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// Configuration-related errors (e.g., out-of-range environment values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding/decoding failures for artifacts, datasets and stores.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Clone for PipelineError {
    fn clone(&self) -> Self {
        match self {
            PipelineError::ModelUnavailable(s) => PipelineError::ModelUnavailable(s.clone()),
            PipelineError::MalformedInput(s) => PipelineError::MalformedInput(s.clone()),
            PipelineError::UnresolvedCondition(s) => PipelineError::UnresolvedCondition(s.clone()),
            PipelineError::InvalidDataset(s) => PipelineError::InvalidDataset(s.clone()),
            PipelineError::Config(s) => PipelineError::Config(s.clone()),
            PipelineError::Io(e) => PipelineError::Io(io::Error::new(e.kind(), e.to_string())),
            PipelineError::Serialization(s) => PipelineError::Serialization(s.clone()),
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for PipelineError {
    fn from(err: validator::ValidationErrors) -> Self {
        PipelineError::Config(format!("Validation errors: {}", err))
    }
}

impl From<tempfile::PersistError> for PipelineError {
    fn from(err: tempfile::PersistError) -> Self {
        PipelineError::Io(err.error)
    }
}
