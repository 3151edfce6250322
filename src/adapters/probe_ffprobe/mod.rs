//! FFprobe adapter for media file probing
//!
//! Runs `ffprobe` with JSON output and maps the first video stream (and the
//! presence of any audio stream) onto [`VideoMetadata`].

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::process::run_tool;

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    program: String,
    timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn probe_args(file_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(file_path.as_os_str().to_owned());
        args
    }

    /// Map ffprobe JSON onto metadata
    fn parse_output(json: &[u8]) -> Result<VideoMetadata, PipelineError> {
        let output: ProbeOutput = serde_json::from_slice(json)
            .map_err(|e| PipelineError::Transcode(format!("Unreadable probe output: {}", e)))?;

        let video = output
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| {
                PipelineError::Validation("Submitted file has no video stream".to_string())
            })?;

        let has_audio = output
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio"));

        // "0/0" is how ffprobe reports an unknown rate
        let frame_rate = video
            .r_frame_rate
            .as_deref()
            .and_then(|r| FrameRate::parse(r).ok());

        let duration_secs = video
            .duration
            .as_deref()
            .or_else(|| output.format.as_ref().and_then(|f| f.duration.as_deref()))
            .and_then(|d| d.parse::<f64>().ok());

        let width = video.width.unwrap_or(0);
        let height = video.height.unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(PipelineError::Transcode(
                "Probe reported a video stream without dimensions".to_string(),
            ));
        }

        Ok(VideoMetadata {
            width,
            height,
            frame_rate,
            duration_secs,
            video_codec: video.codec_name.clone().unwrap_or_else(|| "unknown".to_string()),
            has_audio,
        })
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe(&self, file_path: &Path) -> Result<VideoMetadata, PipelineError> {
        let output = run_tool(&self.program, &Self::probe_args(file_path), self.timeout)
            .await
            .map_err(|e| PipelineError::Transcode(format!("Probe failed: {}", e)))?;

        let metadata = Self::parse_output(&output.stdout)?;
        debug!(
            path = %file_path.display(),
            width = metadata.width,
            height = metadata.height,
            frame_rate = ?metadata.frame_rate,
            has_audio = metadata.has_audio,
            "Probed media file"
        );
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_name": "h264", "codec_type": "video", "width": 1920,
             "height": 1080, "r_frame_rate": "30000/1001", "duration": "10.010000"},
            {"index": 1, "codec_name": "aac", "codec_type": "audio", "r_frame_rate": "0/0"}
        ],
        "format": {"duration": "10.026667"}
    }"#;

    #[test]
    fn test_parse_video_with_audio() {
        let metadata = FFprobeAdapter::parse_output(SAMPLE.as_bytes()).unwrap();
        assert_eq!(metadata.width, 1920);
        assert_eq!(metadata.height, 1080);
        assert_eq!(metadata.frame_rate, Some(FrameRate::new(30000, 1001).unwrap()));
        assert_eq!(metadata.duration_secs, Some(10.01));
        assert_eq!(metadata.video_codec, "h264");
        assert!(metadata.has_audio);
    }

    #[test]
    fn test_missing_frame_rate_is_not_an_error() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 640, "height": 360,
                       "r_frame_rate": "0/0"}], "format": {"duration": "3.0"}}"#;
        let metadata = FFprobeAdapter::parse_output(json.as_bytes()).unwrap();
        assert_eq!(metadata.frame_rate, None);
        assert_eq!(metadata.duration_secs, Some(3.0));
        assert!(!metadata.has_audio);

        let json = r#"{"streams": [{"codec_type": "video", "width": 640, "height": 360}]}"#;
        let metadata = FFprobeAdapter::parse_output(json.as_bytes()).unwrap();
        assert_eq!(metadata.frame_rate, None);
        assert_eq!(metadata.duration_secs, None);
    }

    #[test]
    fn test_audio_only_file_is_validation_error() {
        let json = r#"{"streams": [{"codec_type": "audio"}]}"#;
        let err = FFprobeAdapter::parse_output(json.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_garbage_output_is_transcode_error() {
        let err = FFprobeAdapter::parse_output(b"not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transcode);
    }

    #[test]
    fn test_probe_args_end_with_path() {
        let args = FFprobeAdapter::probe_args(Path::new("/tmp/it's a file.mp4"));
        assert_eq!(args.last().unwrap(), "/tmp/it's a file.mp4");
        assert!(args.contains(&OsString::from("-show_streams")));
    }
}
