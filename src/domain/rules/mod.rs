// Domain rules - Business logic and policies

use crate::config::PipelineConfig;
use crate::domain::errors::*;
use crate::domain::model::*;

/// Business rules for choosing where inference runs
pub struct StrategySelector;

impl StrategySelector {
    /// Pure decision based on the execution-mode flag
    pub fn select(config: &PipelineConfig) -> ExecutionStrategy {
        if config.run_local {
            ExecutionStrategy::Local
        } else {
            ExecutionStrategy::Remote
        }
    }
}

/// Business rules for the output frame rate
pub struct FrameRateResolver;

impl FrameRateResolver {
    /// Pick the probed rate when enabled and present, otherwise the configured default
    pub fn resolve(
        probed: Option<FrameRate>,
        keep_original: bool,
        default_rate: FrameRate,
    ) -> FrameRate {
        match probed {
            Some(rate) if keep_original => rate,
            _ => default_rate,
        }
    }
}

/// Builder for [`TranscodeSpec`]
#[derive(Debug, Clone)]
pub struct TranscodeSpecBuilder {
    trim: TrimPolicy,
    resolution: ResolutionPolicy,
    frame_rate: Option<FrameRate>,
}

impl TranscodeSpec {
    pub fn builder() -> TranscodeSpecBuilder {
        TranscodeSpecBuilder {
            trim: TrimPolicy::FullLength,
            resolution: ResolutionPolicy::PreserveOriginal,
            frame_rate: None,
        }
    }

    /// Scale filter expression: width (or `-1` to keep it) with an even, aspect-derived height
    pub fn scale_filter(&self) -> String {
        match self.width {
            Some(width) => format!("scale={}:-2", width),
            None => "scale=-1:-2".to_string(),
        }
    }

    /// Dimensions the transcoder will produce for a source of the given size
    pub fn output_dimensions(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        match self.width {
            Some(width) => (width, even_height_for_width(source_width, source_height, width)),
            None => (source_width, source_height),
        }
    }
}

impl TranscodeSpecBuilder {
    pub fn trim(mut self, trim: TrimPolicy) -> Self {
        self.trim = trim;
        self
    }

    pub fn resolution(mut self, resolution: ResolutionPolicy) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn frame_rate(mut self, frame_rate: FrameRate) -> Self {
        self.frame_rate = Some(frame_rate);
        self
    }

    pub fn build(self) -> Result<TranscodeSpec, PipelineError> {
        let frame_rate = self.frame_rate.ok_or_else(|| {
            PipelineError::Internal("Transcode spec built without a frame rate".to_string())
        })?;

        let trim_secs = match self.trim {
            TrimPolicy::FullLength => None,
            TrimPolicy::FirstSeconds(0) => {
                return Err(PipelineError::Validation(
                    "Trim length must be greater than zero".to_string(),
                ))
            }
            TrimPolicy::FirstSeconds(secs) => Some(secs),
        };

        let width = match self.resolution {
            ResolutionPolicy::PreserveOriginal => None,
            ResolutionPolicy::ResizeToWidth(0) => {
                return Err(PipelineError::Validation(
                    "Resize width must be greater than zero".to_string(),
                ))
            }
            ResolutionPolicy::ResizeToWidth(width) => Some(width),
        };

        Ok(TranscodeSpec {
            trim_secs,
            width,
            frame_rate: frame_rate.integer_rate(),
        })
    }
}

/// Height that keeps the source aspect ratio at `target_width`, rounded to an even number
pub fn even_height_for_width(source_width: u32, source_height: u32, target_width: u32) -> u32 {
    if source_width == 0 {
        return 0;
    }
    let exact = source_height as f64 * target_width as f64 / source_width as f64;
    round_to_even(exact)
}

fn round_to_even(value: f64) -> u32 {
    let halved = (value / 2.0).round() as u32;
    (halved * 2).max(2)
}
