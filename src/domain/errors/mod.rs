// Domain errors - Error taxonomy for the cartoonization pipeline

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Kind of a pipeline error, independent of its message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Missing or invalid submitted file
    Validation,
    /// Probe or transcode step failed
    Transcode,
    /// Audio track could not be demuxed
    AudioExtraction,
    /// Local model fault or remote inference API fault
    Inference,
    /// Object storage upload/download/delete fault
    Storage,
    /// Final audio/video remux failed
    Mux,
    /// Broken pipeline invariant
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Transcode => "TranscodeError",
            ErrorKind::AudioExtraction => "AudioExtractionError",
            ErrorKind::Inference => "InferenceError",
            ErrorKind::Storage => "StorageError",
            ErrorKind::Mux => "MuxError",
            ErrorKind::Internal => "InternalError",
        };
        f.write_str(name)
    }
}

/// Errors raised by pipeline stages and the adapters behind them
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Invalid submission: {0}")]
    Validation(String),

    #[error("Transcoding failed: {0}")]
    Transcode(String),

    #[error("Audio extraction failed: {0}")]
    AudioExtraction(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Object storage failure: {0}")]
    Storage(String),

    #[error("Remux failed: {0}")]
    Mux(String),

    #[error("Internal pipeline error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Get the taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Validation(_) => ErrorKind::Validation,
            PipelineError::Transcode(_) => ErrorKind::Transcode,
            PipelineError::AudioExtraction(_) => ErrorKind::AudioExtraction,
            PipelineError::Inference(_) => ErrorKind::Inference,
            PipelineError::Storage(_) => ErrorKind::Storage,
            PipelineError::Mux(_) => ErrorKind::Mux,
            PipelineError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Rejected job status transition
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid job transition from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: crate::domain::model::JobStatus,
    pub to: crate::domain::model::JobStatus,
}

impl From<InvalidTransition> for PipelineError {
    fn from(err: InvalidTransition) -> Self {
        PipelineError::Internal(err.to_string())
    }
}
