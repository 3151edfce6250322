//! Configuration initialization and hierarchy management

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::adapters::FileConfigAdapter;
use crate::cli::JobOverrides;
use crate::config::PipelineConfig;
use crate::error::ConfigError;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "CARTOONIZER_";

/// Build the configuration following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration(
    config_path: Option<&Path>,
    overrides: Option<&JobOverrides>,
) -> Result<PipelineConfig> {
    let mut config = match config_file(config_path) {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration file");
            FileConfigAdapter::load(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => {
            debug!("No configuration file found, using defaults");
            PipelineConfig::default()
        }
    };

    let applied = apply_environment(&mut config, |key| std::env::var(key).ok())?;
    if applied > 0 {
        info!(count = applied, "Applied environment overrides");
    }

    if let Some(overrides) = overrides {
        let applied = apply_cli_overrides(&mut config, overrides);
        if applied > 0 {
            info!(count = applied, "Applied command-line overrides");
        }
    }

    Ok(config)
}

/// An explicit path must exist; otherwise the first well-known file in the current directory is used
fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => FileConfigAdapter::discover(),
    }
}

/// Apply `CARTOONIZER_*` variables through `lookup`; returns how many were set
pub fn apply_environment(
    config: &mut PipelineConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<usize, ConfigError> {
    let mut env = EnvReader {
        lookup,
        applied: 0,
    };

    env.parse("RUN_LOCAL", &mut config.run_local)?;
    env.parse("GPU", &mut config.gpu)?;
    env.parse("ORIGINAL_FRAME_RATE", &mut config.original_frame_rate)?;
    env.parse("OUTPUT_FRAME_RATE", &mut config.output_frame_rate)?;
    env.parse("RESIZE_WIDTH", &mut config.resize_width)?;
    env.parse("ORIGINAL_RESOLUTION", &mut config.original_resolution)?;
    env.parse("TRIM_VIDEO", &mut config.trim_video)?;
    env.parse("TRIM_LENGTH_SECS", &mut config.trim_length_secs)?;

    env.parse("WORK_DIR", &mut config.work_dir)?;
    env.parse("FFMPEG_PATH", &mut config.ffmpeg_path)?;
    env.parse("FFPROBE_PATH", &mut config.ffprobe_path)?;
    env.parse("CARTOONIZER_PROGRAM", &mut config.cartoonizer_program)?;
    env.parse("MODEL_DIR", &mut config.model_dir)?;

    env.optional("STORAGE_ENDPOINT", &mut config.storage_endpoint);
    env.optional("INFERENCE_ENDPOINT", &mut config.inference_endpoint);
    env.optional("API_KEY", &mut config.api_key);
    env.parse("INPUTS_BUCKET", &mut config.inputs_bucket)?;
    env.parse("RESULTS_BUCKET", &mut config.results_bucket)?;
    env.parse("PUBLISHED_BUCKET", &mut config.published_bucket)?;
    env.parse("PUBLISH_RESULTS", &mut config.publish_results)?;
    env.parse("SIGNED_URL_TTL_SECS", &mut config.signed_url_ttl_secs)?;

    env.parse("PROCESS_TIMEOUT_SECS", &mut config.process_timeout_secs)?;
    env.parse("REQUEST_TIMEOUT_SECS", &mut config.request_timeout_secs)?;

    Ok(env.applied)
}

struct EnvReader<F> {
    lookup: F,
    applied: usize,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn get(&mut self, name: &str) -> Option<String> {
        let key = format!("{}{}", ENV_PREFIX, name);
        let value = (self.lookup)(&key)?;
        debug!(key = %key, "Environment override");
        self.applied += 1;
        Some(value)
    }

    fn parse<T: FromStr>(&mut self, name: &str, target: &mut T) -> Result<(), ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        if let Some(raw) = self.get(name) {
            *target = raw.trim().parse().map_err(|e: T::Err| {
                ConfigError::invalid(&format!("{}{}", ENV_PREFIX, name), e.to_string())
            })?;
        }
        Ok(())
    }

    /// Empty values clear the setting
    fn optional(&mut self, name: &str, target: &mut Option<String>) {
        if let Some(raw) = self.get(name) {
            let raw = raw.trim();
            *target = (!raw.is_empty()).then(|| raw.to_string());
        }
    }
}

/// Apply command-line flags; returns how many were set
pub fn apply_cli_overrides(config: &mut PipelineConfig, overrides: &JobOverrides) -> usize {
    let mut applied = 0;

    if overrides.local {
        config.run_local = true;
        applied += 1;
    }
    if overrides.remote {
        config.run_local = false;
        applied += 1;
    }
    if let Some(secs) = overrides.trim {
        config.trim_video = true;
        config.trim_length_secs = secs;
        applied += 1;
    }
    if overrides.no_trim {
        config.trim_video = false;
        applied += 1;
    }
    if let Some(width) = overrides.width {
        config.original_resolution = false;
        config.resize_width = width;
        applied += 1;
    }
    if overrides.original_resolution {
        config.original_resolution = true;
        applied += 1;
    }
    if overrides.original_frame_rate {
        config.original_frame_rate = true;
        applied += 1;
    }
    if let Some(rate) = &overrides.frame_rate {
        config.output_frame_rate = rate.clone();
        applied += 1;
    }
    if let Some(dir) = &overrides.work_dir {
        config.work_dir = dir.clone();
        applied += 1;
    }

    applied
}
