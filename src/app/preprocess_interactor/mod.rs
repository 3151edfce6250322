// Preprocess interactor - Probe, transcode and audio extraction for a job

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::error::ConfigError;
use crate::ports::*;

/// Everything decided about a source before it is transcoded
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessPlan {
    pub metadata: VideoMetadata,
    /// Rate handed to inference
    pub frame_rate: FrameRate,
    pub spec: TranscodeSpec,
}

/// Interactor for the preprocessing stages
pub struct VideoPreprocessor {
    probe_port: Arc<dyn ProbePort>,
    media_port: Arc<dyn MediaToolPort>,
    keep_original_rate: bool,
    default_rate: FrameRate,
}

impl VideoPreprocessor {
    /// Create new preprocessor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        media_port: Arc<dyn MediaToolPort>,
        config: &PipelineConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            probe_port,
            media_port,
            keep_original_rate: config.original_frame_rate,
            default_rate: config.default_frame_rate()?,
        })
    }

    /// Probe the source and derive frame rate and transcode spec
    pub async fn plan(
        &self,
        source: &Path,
        resolution: ResolutionPolicy,
        trim: TrimPolicy,
    ) -> Result<PreprocessPlan, PipelineError> {
        let metadata = self.probe_port.probe(source).await?;

        if self.keep_original_rate && metadata.frame_rate.is_none() {
            warn!(
                default_rate = %self.default_rate,
                "Source has no frame rate; falling back to configured default"
            );
        }
        let frame_rate =
            FrameRateResolver::resolve(metadata.frame_rate, self.keep_original_rate, self.default_rate);

        let spec = TranscodeSpec::builder()
            .trim(trim)
            .resolution(resolution)
            .frame_rate(frame_rate)
            .build()?;

        info!(
            width = metadata.width,
            height = metadata.height,
            frame_rate = %frame_rate,
            transcode_rate = spec.frame_rate,
            trim_secs = ?spec.trim_secs,
            target_width = ?spec.width,
            "Planned preprocessing"
        );
        Ok(PreprocessPlan {
            metadata,
            frame_rate,
            spec,
        })
    }

    /// Produce the intermediate audio+video file
    pub async fn transcode(
        &self,
        source: &Path,
        plan: &PreprocessPlan,
        output: &Path,
    ) -> Result<(), PipelineError> {
        self.media_port.transcode(source, &plan.spec, output).await
    }

    /// Demux the audio of the transcoded file so it lines up with the cartoonized stream.
    ///
    /// Returns `None` for sources without an audio track.
    pub async fn extract_audio(
        &self,
        plan: &PreprocessPlan,
        transcoded: &Path,
        output: &Path,
    ) -> Result<Option<PathBuf>, PipelineError> {
        if !plan.metadata.has_audio {
            info!("Source has no audio track; skipping extraction");
            return Ok(None);
        }
        self.media_port.extract_audio(transcoded, output).await?;
        Ok(Some(output.to_path_buf()))
    }
}
