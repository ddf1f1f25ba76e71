//! Error handling primitives shared across the crate.
//!
//! Configuration errors are raised before any data is touched; data and I/O
//! errors surface from the loader, the pipeline stages and the artifact codec.

use thiserror::Error;

use crate::training::repo_fs::ArtifactError;
use crate::training::Task;

/// Stable error codes, also attached to lifecycle log events.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Builder or tuning configuration was incomplete or out of range.
    InvalidConfig = 1,
    /// Task has no trainer mapping for the requested operation.
    UnsupportedTask = 2,
    /// Input data did not match what a stage expected.
    InvalidData = 3,
    /// Underlying file I/O failed.
    Io = 4,
    /// Model artifact was malformed or incompatible.
    Artifact = 5,
    /// An evaluator could not score the predictions.
    Evaluation = 6,
}

/// Canonical error type for the crate.
#[derive(Debug, Error)]
pub enum HyperError {
    #[error("no feature columns configured")]
    MissingFeatures,

    #[error("no label column configured")]
    MissingLabel,

    #[error("task type {0} not supported")]
    UnsupportedTask(Task),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("column `{0}` not found")]
    ColumnNotFound(String),

    #[error("column `{column}` is {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model artifact: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

/// Result alias used throughout the crate.
pub type HyperResult<T> = Result<T, HyperError>;

impl HyperError {
    /// Machine parsable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            HyperError::MissingFeatures
            | HyperError::MissingLabel
            | HyperError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            HyperError::UnsupportedTask(_) => ErrorCode::UnsupportedTask,
            HyperError::ColumnNotFound(_)
            | HyperError::ColumnType { .. }
            | HyperError::Parse { .. }
            | HyperError::InvalidData(_) => ErrorCode::InvalidData,
            HyperError::Io(_) => ErrorCode::Io,
            HyperError::Artifact(_) => ErrorCode::Artifact,
            HyperError::Evaluation(_) => ErrorCode::Evaluation,
        }
    }

    /// Type mismatch helper.
    pub fn column_type(column: &str, expected: &'static str, found: &'static str) -> Self {
        HyperError::ColumnType {
            column: column.to_string(),
            expected,
            found,
        }
    }

    /// Evaluation helper.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        HyperError::Evaluation(msg.into())
    }
}
