//! Pipeline configuration
//!
//! A single immutable value built once at startup (defaults, then file, then
//! environment, then command line) and shared by every stage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::model::{FrameRate, ResolutionPolicy, TrimPolicy};
use crate::error::ConfigError;

/// Read-only configuration for the cartoonization pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run inference on this host instead of delegating to the remote service
    pub run_local: bool,
    /// Let the local model use the GPU
    pub gpu: bool,

    /// Keep the probed source frame rate when available
    pub original_frame_rate: bool,
    /// Fallback frame rate, `num/den` or an integer
    #[serde(deserialize_with = "string_or_number")]
    pub output_frame_rate: String,
    /// Target width when resizing
    #[serde(alias = "resize-dim")]
    pub resize_width: u32,
    /// Keep the source resolution instead of resizing
    pub original_resolution: bool,
    #[serde(alias = "trim-video")]
    pub trim_video: bool,
    #[serde(alias = "trim-video-length")]
    pub trim_length_secs: u32,

    /// Directory holding every per-job file
    pub work_dir: PathBuf,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Local cartoonizer executable
    pub cartoonizer_program: String,
    pub model_dir: PathBuf,

    /// Object storage base address (`http(s)://` gateway or `file://` directory)
    pub storage_endpoint: Option<String>,
    /// Remote inference API address
    pub inference_endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub inputs_bucket: String,
    pub results_bucket: String,
    pub published_bucket: String,
    /// Upload the final video and hand out a signed URL; needs `storage_endpoint`
    pub publish_results: bool,
    pub signed_url_ttl_secs: u64,

    /// Bound on each external process; 0 disables
    pub process_timeout_secs: u64,
    /// Bound on each HTTP request; 0 disables
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            run_local: true,
            gpu: false,
            original_frame_rate: false,
            output_frame_rate: "24".to_string(),
            resize_width: 640,
            original_resolution: false,
            trim_video: true,
            trim_length_secs: 15,
            work_dir: PathBuf::from("static/uploaded_videos"),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            cartoonizer_program: "cartoonize-video".to_string(),
            model_dir: PathBuf::from("white_box_cartoonizer/saved_models"),
            storage_endpoint: None,
            inference_endpoint: None,
            api_key: None,
            inputs_bucket: "processed_videos_cartoonize".to_string(),
            results_bucket: "cartoonized_videos".to_string(),
            published_bucket: "cartoonized_videos_published".to_string(),
            publish_results: false,
            signed_url_ttl_secs: 900,
            process_timeout_secs: 900,
            request_timeout_secs: 600,
        }
    }
}

impl PipelineConfig {
    /// Check cross-field consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.default_frame_rate()?;

        if !self.original_resolution {
            if self.resize_width == 0 {
                return Err(ConfigError::invalid("resize_width", "must be greater than zero"));
            }
            if self.resize_width % 2 != 0 {
                return Err(ConfigError::invalid(
                    "resize_width",
                    format!("{} is odd; the encoder needs even dimensions", self.resize_width),
                ));
            }
        }

        if self.trim_video && self.trim_length_secs == 0 {
            return Err(ConfigError::invalid(
                "trim_length_secs",
                "must be greater than zero when trimming",
            ));
        }

        if !self.run_local {
            if self.storage_endpoint.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::invalid(
                    "storage_endpoint",
                    "required when run_local is false",
                ));
            }
            if self.inference_endpoint.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::invalid(
                    "inference_endpoint",
                    "required when run_local is false",
                ));
            }
        }

        if self.publish_results && self.storage_endpoint.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::invalid(
                "publish_results",
                "requires storage_endpoint",
            ));
        }

        Ok(())
    }

    /// Configured fallback frame rate
    pub fn default_frame_rate(&self) -> Result<FrameRate, ConfigError> {
        FrameRate::parse(&self.output_frame_rate)
            .map_err(|e| ConfigError::invalid("output_frame_rate", e.to_string()))
    }

    pub fn resolution_policy(&self) -> ResolutionPolicy {
        if self.original_resolution {
            ResolutionPolicy::PreserveOriginal
        } else {
            ResolutionPolicy::ResizeToWidth(self.resize_width)
        }
    }

    pub fn trim_policy(&self) -> TrimPolicy {
        if self.trim_video {
            TrimPolicy::FirstSeconds(self.trim_length_secs)
        } else {
            TrimPolicy::FullLength
        }
    }

    pub fn process_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.process_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.request_timeout_secs)
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }
}

/// Accept `output_frame_rate: 24` as well as `output_frame_rate: "24000/1001"`
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_config() -> PipelineConfig {
        PipelineConfig {
            run_local: false,
            storage_endpoint: Some("https://storage.internal".to_string()),
            inference_endpoint: Some("https://gpu.internal/infer".to_string()),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
        remote_config().validate().unwrap();
    }

    #[test]
    fn test_policies_follow_flags() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.resolution_policy(), ResolutionPolicy::ResizeToWidth(640));
        assert_eq!(config.trim_policy(), TrimPolicy::FirstSeconds(15));

        config.original_resolution = true;
        config.trim_video = false;
        assert_eq!(config.resolution_policy(), ResolutionPolicy::PreserveOriginal);
        assert_eq!(config.trim_policy(), TrimPolicy::FullLength);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            PipelineConfig {
                output_frame_rate: "0/1".to_string(),
                ..PipelineConfig::default()
            },
            PipelineConfig {
                resize_width: 641,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                resize_width: 0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                trim_length_secs: 0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                run_local: false,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                inference_endpoint: None,
                ..remote_config()
            },
            PipelineConfig {
                publish_results: true,
                ..PipelineConfig::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn test_local_publishing_with_storage_is_valid() {
        let config = PipelineConfig {
            publish_results: true,
            storage_endpoint: Some("file:///srv/objects".to_string()),
            ..PipelineConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_odd_width_allowed_when_preserving_resolution() {
        let config = PipelineConfig {
            resize_width: 641,
            original_resolution: true,
            ..PipelineConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_zero_timeouts_disable_bounds() {
        let config = PipelineConfig {
            process_timeout_secs: 0,
            request_timeout_secs: 30,
            ..PipelineConfig::default()
        };
        assert_eq!(config.process_timeout(), None);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }
}
