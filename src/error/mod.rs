//! Error handling module for configuration and the controller boundary

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::errors::{ErrorKind, PipelineError};
use crate::domain::model::{JobId, JobStatus, PipelineStage};

/// Message shown to the submitter for every kind of failure
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Our server hiccuped while processing your video. Please upload another file.";

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unknown config file extension
    #[error("Unsupported config format for {path}: expected .yaml, .yml or .toml")]
    UnsupportedFormat { path: PathBuf },

    /// Config file could not be parsed
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A value failed validation
    #[error("Invalid config value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Adapter could not be built from the configuration
    #[error("Failed to initialize {component}: {message}")]
    Initialization { component: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// A job that ended in `Failed`, with full detail for operators
#[derive(Error, Debug, Clone)]
#[error("Job {job_id} failed at {stage} ({kind}, status {status:?}): {source}")]
pub struct PipelineFailure {
    pub job_id: JobId,
    pub stage: PipelineStage,
    pub kind: ErrorKind,
    /// Status the job was in when the stage failed
    pub status: JobStatus,
    #[source]
    pub source: PipelineError,
}

impl PipelineFailure {
    /// Single opaque message for the submitter; detail stays in the logs
    pub fn user_message(&self) -> &'static str {
        GENERIC_FAILURE_MESSAGE
    }
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
