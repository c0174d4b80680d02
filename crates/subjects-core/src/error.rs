//! Centralized error types for the Subject model.

use thiserror::Error;

/// Errors raised while interpreting caller input as a Subject.
#[derive(Error, Debug)]
pub enum SubjectsError {
    #[error("Malformed subject: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Result type for Subject model operations.
pub type SubjectsResult<T> = Result<T, SubjectsError>;
