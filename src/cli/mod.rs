//! CLI module for the cartoonizer
//!
//! This module handles command-line argument parsing and command execution.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod args;
pub mod commands;

pub use args::{JobOverrides, PlanArgs, ProbeArgs, VideoArgs};

/// Video cartoonization pipeline
///
/// Transcodes a submitted video, runs it through the cartoonization model locally
/// or on a remote accelerator, and restores the original audio.
#[derive(Parser, Debug)]
#[command(name = "cartoonizer")]
#[command(about = "Cartoonize videos with a neural style-transfer model")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true, env = "CARTOONIZER_LOG_LEVEL")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file (.yaml, .yml or .toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cartoonize a video file
    Video(args::VideoArgs),
    /// Print stream metadata of a video file
    Probe(args::ProbeArgs),
    /// Show what a job would run for a video file without running it
    Plan(args::PlanArgs),
    /// Print the effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_video_command() {
        let cli = Cli::parse_from([
            "cartoonizer",
            "video",
            "clip.mp4",
            "--remote",
            "--trim",
            "3",
            "--width",
            "480",
        ]);
        match cli.command {
            Commands::Video(args) => {
                assert_eq!(args.input, PathBuf::from("clip.mp4"));
                assert!(args.overrides.remote);
                assert_eq!(args.overrides.trim, Some(3));
                assert_eq!(args.overrides.width, Some(480));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_conflicting_flags_are_rejected() {
        assert!(Cli::try_parse_from(["cartoonizer", "video", "a.mp4", "--local", "--remote"]).is_err());
        assert!(Cli::try_parse_from(["cartoonizer", "video", "a.mp4", "--trim", "3", "--no-trim"]).is_err());
    }
}
