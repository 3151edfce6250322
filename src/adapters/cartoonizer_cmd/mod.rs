// Cartoonizer command adapter - Runs the local cartoonization model as an external program

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::process::run_tool;

/// Invokes the model runner with `--input/--output/--fps/--model-dir [--gpu]`
pub struct CommandCartoonizerAdapter {
    program: String,
    model_dir: PathBuf,
    gpu: bool,
    timeout: Option<Duration>,
}

impl CommandCartoonizerAdapter {
    pub fn new(
        program: impl Into<String>,
        model_dir: impl Into<PathBuf>,
        gpu: bool,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            program: program.into(),
            model_dir: model_dir.into(),
            gpu,
            timeout,
        }
    }

    fn args(&self, input: &Path, frame_rate: &FrameRate, output: &Path) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("--input"),
            input.as_os_str().to_owned(),
            OsString::from("--output"),
            output.as_os_str().to_owned(),
            OsString::from("--fps"),
            OsString::from(frame_rate.to_string()),
            OsString::from("--model-dir"),
            self.model_dir.as_os_str().to_owned(),
        ];
        if self.gpu {
            args.push(OsString::from("--gpu"));
        }
        args
    }
}

#[async_trait]
impl CartoonizerPort for CommandCartoonizerAdapter {
    async fn process_video(
        &self,
        input: &Path,
        frame_rate: &FrameRate,
        output: &Path,
    ) -> Result<(), PipelineError> {
        let result = run_tool(&self.program, &self.args(input, frame_rate, output), self.timeout)
            .await
            .map_err(|e| PipelineError::Inference(format!("Local cartoonizer failed: {}", e)))?;

        if !output.exists() {
            return Err(PipelineError::Inference(format!(
                "Local cartoonizer exited cleanly but wrote no output at {}",
                output.display()
            )));
        }

        info!(
            elapsed_ms = result.elapsed.as_millis() as u64,
            gpu = self.gpu,
            "Local cartoonizer finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_carry_full_rational_rate() {
        let adapter = CommandCartoonizerAdapter::new("cartoonize-video", "models", false, None);
        let rate = FrameRate::new(30000, 1001).unwrap();
        let args = adapter.args(Path::new("in.mp4"), &rate, Path::new("out.mp4"));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert!(args.windows(2).any(|w| w == ["--fps", "30000/1001"]));
        assert!(args.windows(2).any(|w| w == ["--model-dir", "models"]));
        assert!(!args.contains(&"--gpu".to_string()));
    }

    #[test]
    fn test_gpu_flag_is_forwarded() {
        let adapter = CommandCartoonizerAdapter::new("cartoonize-video", "models", true, None);
        let rate = FrameRate::from_integer(24).unwrap();
        let args = adapter.args(Path::new("in.mp4"), &rate, Path::new("out.mp4"));
        assert_eq!(args.last().unwrap(), "--gpu");
    }

    #[tokio::test]
    async fn test_missing_program_is_inference_error() {
        let adapter = CommandCartoonizerAdapter::new("no-such-cartoonizer-xyz", "m", false, None);
        let rate = FrameRate::from_integer(24).unwrap();
        let err = adapter
            .process_video(Path::new("in.mp4"), &rate, Path::new("out.mp4"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);
    }
}
