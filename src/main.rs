//! Cartoonizer CLI
//!
//! Turns a video into a cartoon-styled video with its original audio.
//!
//! # Usage
//!
//! ```bash
//! cartoonizer video clip.mp4 --trim 10 --width 640
//! cartoonizer video clip.mp4 --remote
//! cartoonizer probe clip.mp4 --json
//! cartoonizer plan clip.mp4
//! cartoonizer config
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cartoonizer::adapters::{init_tracing, LogLevel};
use cartoonizer::cli::{commands, Cli, Commands};
use cartoonizer::config_initialization::initialize_configuration;
use cartoonizer::DefaultAppContainer;

/// Main entry point for the cartoonizer CLI
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = LogLevel::parse(&cli.log_level)?;
    init_tracing(level, cli.json_logs);

    let overrides = match &cli.command {
        Commands::Video(args) => Some(&args.overrides),
        Commands::Plan(args) => Some(&args.overrides),
        Commands::Probe(_) | Commands::Config => None,
    };
    let config = initialize_configuration(cli.config.as_deref(), overrides)?;

    if let Commands::Config = cli.command {
        return commands::config(&config);
    }

    let container = DefaultAppContainer::new(config)?;
    match &cli.command {
        Commands::Video(args) => {
            info!("Executing video command");
            commands::video(&container, args).await?;
        }
        Commands::Probe(args) => {
            info!("Executing probe command");
            commands::probe(&container, args).await?;
        }
        Commands::Plan(args) => {
            info!("Executing plan command");
            commands::plan(&container, args).await?;
        }
        Commands::Config => {}
    }

    Ok(())
}
