//! Error types for spring-io

use spring_solver::ValidationError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IoError>;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Unsupported schema version {found} (this build reads {supported})")]
    SchemaVersion { found: u32, supported: u32 },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Element {index}: {reason}")]
    Element { index: usize, reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
