//! FFmpeg execution adapter
//!
//! Builds argument vectors for the three ffmpeg invocations the pipeline needs
//! (transcode, audio demux, final remux) and runs them without a shell.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::process::run_tool;

/// FFmpeg-based execution adapter
pub struct FFmpegAdapter {
    program: String,
    timeout: Option<Duration>,
}

/// Small helper for building argument vectors
#[derive(Debug, Default)]
struct ArgList(Vec<OsString>);

impl ArgList {
    fn flag(mut self, flag: &str) -> Self {
        self.0.push(OsString::from(flag));
        self
    }

    fn opt(mut self, flag: &str, value: impl Into<OsString>) -> Self {
        self.0.push(OsString::from(flag));
        self.0.push(value.into());
        self
    }

    fn path(mut self, path: &Path) -> Self {
        self.0.push(path.as_os_str().to_owned());
        self
    }

    fn common() -> Self {
        Self::default()
            .flag("-hide_banner")
            .opt("-loglevel", "warning")
            .flag("-nostdin")
    }
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Trim from zero, scale, re-rate and copy audio unmodified
    pub fn transcode_args(input: &Path, spec: &TranscodeSpec, output: &Path) -> Vec<OsString> {
        let mut args = ArgList::common().opt("-ss", "0").opt("-i", input.as_os_str());
        if let Some(secs) = spec.trim_secs {
            args = args.opt("-t", secs.to_string());
        }
        args.opt("-filter:v", spec.scale_filter())
            .opt("-r", spec.frame_rate.to_string())
            .opt("-c:a", "copy")
            .path(output)
            .0
    }

    /// Audio-only demux with stream copy
    pub fn extract_audio_args(input: &Path, output: &Path) -> Vec<OsString> {
        ArgList::common()
            .opt("-i", input.as_os_str())
            .opt("-map", "0:a:0")
            .flag("-vn")
            .opt("-acodec", "copy")
            .opt("-strict", "-2")
            .path(output)
            .0
    }

    /// Combine video and audio with copy codecs, stopping at the shorter stream
    pub fn remux_args(video: &Path, audio: Option<&Path>, output: &Path) -> Vec<OsString> {
        let args = ArgList::common().opt("-i", video.as_os_str());
        let args = match audio {
            Some(audio) => args
                .opt("-i", audio.as_os_str())
                .opt("-map", "0:v:0")
                .opt("-map", "1:a:0")
                .opt("-codec", "copy")
                .flag("-shortest"),
            None => args.opt("-map", "0:v:0").opt("-codec", "copy"),
        };
        args.path(output).0
    }

    async fn run(
        &self,
        args: Vec<OsString>,
        wrap: fn(String) -> PipelineError,
    ) -> Result<(), PipelineError> {
        let output = run_tool(&self.program, &args, self.timeout)
            .await
            .map_err(|e| wrap(e.to_string()))?;
        if !output.stderr.is_empty() {
            debug!(stderr = %output.stderr, "ffmpeg warnings");
        }
        debug!(elapsed_ms = output.elapsed.as_millis() as u64, "ffmpeg finished");
        Ok(())
    }
}

#[async_trait]
impl MediaToolPort for FFmpegAdapter {
    async fn transcode(
        &self,
        input: &Path,
        spec: &TranscodeSpec,
        output: &Path,
    ) -> Result<(), PipelineError> {
        self.run(
            Self::transcode_args(input, spec, output),
            PipelineError::Transcode,
        )
        .await
    }

    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
        self.run(
            Self::extract_audio_args(input, output),
            PipelineError::AudioExtraction,
        )
        .await
    }

    async fn remux(
        &self,
        video: &Path,
        audio: Option<&Path>,
        output: &Path,
    ) -> Result<(), PipelineError> {
        self.run(Self::remux_args(video, audio, output), PipelineError::Mux)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn spec(trim_secs: Option<u32>, width: Option<u32>) -> TranscodeSpec {
        TranscodeSpec {
            trim_secs,
            width,
            frame_rate: 30,
        }
    }

    const PREFIX: [&str; 6] = ["-hide_banner", "-loglevel", "warning", "-nostdin", "-ss", "0"];

    #[test]
    fn test_transcode_trim_resize() {
        let args = strings(&FFmpegAdapter::transcode_args(
            Path::new("in.mp4"),
            &spec(Some(3), Some(640)),
            Path::new("out.mp4"),
        ));
        let mut expected: Vec<&str> = PREFIX.to_vec();
        expected.extend([
            "-i", "in.mp4", "-t", "3", "-filter:v", "scale=640:-2", "-r", "30", "-c:a", "copy",
            "out.mp4",
        ]);
        assert_eq!(args, expected);
    }

    #[test]
    fn test_transcode_trim_preserve() {
        let args = strings(&FFmpegAdapter::transcode_args(
            Path::new("in.mp4"),
            &spec(Some(10), None),
            Path::new("out.mp4"),
        ));
        assert!(args.windows(2).any(|w| w == ["-t", "10"]));
        assert!(args.windows(2).any(|w| w == ["-filter:v", "scale=-1:-2"]));
    }

    #[test]
    fn test_transcode_full_resize() {
        let args = strings(&FFmpegAdapter::transcode_args(
            Path::new("in.mp4"),
            &spec(None, Some(1280)),
            Path::new("out.mp4"),
        ));
        assert!(!args.contains(&"-t".to_string()));
        assert!(args.windows(2).any(|w| w == ["-filter:v", "scale=1280:-2"]));
    }

    #[test]
    fn test_transcode_full_preserve() {
        let args = strings(&FFmpegAdapter::transcode_args(
            Path::new("in.mp4"),
            &spec(None, None),
            Path::new("out.mp4"),
        ));
        assert!(!args.contains(&"-t".to_string()));
        assert!(args.windows(2).any(|w| w == ["-filter:v", "scale=-1:-2"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "copy"]));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_paths_are_single_arguments() {
        let input = Path::new("/tmp/a b'; rm -rf ~.mp4");
        let args = FFmpegAdapter::transcode_args(input, &spec(None, None), Path::new("o.mp4"));
        assert!(args.iter().any(|a| a.as_os_str() == input.as_os_str()));
    }

    #[test]
    fn test_extract_audio_args() {
        let args = strings(&FFmpegAdapter::extract_audio_args(
            Path::new("t.mp4"),
            Path::new("a.mp4"),
        ));
        assert!(args.windows(2).any(|w| w == ["-i", "t.mp4"]));
        assert!(args.windows(2).any(|w| w == ["-acodec", "copy"]));
        assert!(args.contains(&"-vn".to_string()));
        assert_eq!(args.last().unwrap(), "a.mp4");
    }

    #[test]
    fn test_remux_args_with_audio() {
        let args = strings(&FFmpegAdapter::remux_args(
            Path::new("c.mp4"),
            Some(Path::new("a.mp4")),
            Path::new("f.mp4"),
        ));
        assert!(args.windows(2).any(|w| w == ["-i", "c.mp4"]));
        assert!(args.windows(2).any(|w| w == ["-i", "a.mp4"]));
        assert!(args.windows(2).any(|w| w == ["-codec", "copy"]));
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn test_remux_args_without_audio() {
        let args = strings(&FFmpegAdapter::remux_args(
            Path::new("c.mp4"),
            None,
            Path::new("f.mp4"),
        ));
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 1);
        assert!(!args.contains(&"-shortest".to_string()));
    }
}
