//! Video cartoonization pipeline
//!
//! Takes a submitted video, normalizes it with ffmpeg, runs a neural
//! cartoonization model on this host or on a remote accelerator, and restores
//! the original audio onto the stylized result. Every temporary file a job
//! creates is namespaced by its job id and removed when the job ends.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{AppContainer, DefaultAppContainer, PipelineController};
pub use config::PipelineConfig;
pub use domain::errors::{ErrorKind, PipelineError};
pub use domain::model::{ArtifactRef, CompletedJob, ExecutionStrategy, JobId, JobStatus};
pub use error::{ConfigError, PipelineFailure};
