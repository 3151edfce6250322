//! Command-line argument definitions

use clap::Args;
use std::path::PathBuf;

/// Pipeline settings shared by `video` and `plan`; unset flags keep the configured value
#[derive(Args, Debug, Clone, Default)]
pub struct JobOverrides {
    /// Run inference on this host
    #[arg(long, conflicts_with = "remote")]
    pub local: bool,

    /// Delegate inference to the remote service
    #[arg(long)]
    pub remote: bool,

    /// Keep only the first N seconds
    #[arg(long, value_name = "SECS", conflicts_with = "no_trim")]
    pub trim: Option<u32>,

    /// Process the full length
    #[arg(long)]
    pub no_trim: bool,

    /// Resize to this width, preserving aspect ratio
    #[arg(long, conflicts_with = "original_resolution")]
    pub width: Option<u32>,

    /// Keep the source resolution
    #[arg(long)]
    pub original_resolution: bool,

    /// Keep the source frame rate when it can be read
    #[arg(long)]
    pub original_frame_rate: bool,

    /// Default frame rate, `num/den` or an integer
    #[arg(long, value_name = "RATE")]
    pub frame_rate: Option<String>,

    /// Directory for per-job files
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
}

/// Arguments for the video command
#[derive(Args, Debug)]
pub struct VideoArgs {
    /// Video file to cartoonize
    pub input: PathBuf,

    #[command(flatten)]
    pub overrides: JobOverrides,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Video file to inspect
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Video file to plan for
    pub input: PathBuf,

    #[command(flatten)]
    pub overrides: JobOverrides,
}
