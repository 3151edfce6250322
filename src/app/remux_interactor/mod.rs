// Remux interactor - Restores the original audio onto the cartoonized video

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::domain::errors::*;
use crate::ports::*;

/// Combines the silent cartoon stream with the extracted audio
pub struct AudioRemuxer {
    media_port: Arc<dyn MediaToolPort>,
}

impl AudioRemuxer {
    pub fn new(media_port: Arc<dyn MediaToolPort>) -> Self {
        Self { media_port }
    }

    /// Stream-copy both inputs into `final_path`, truncated to the shorter stream
    pub async fn remux(
        &self,
        cartoon: &Path,
        audio: Option<&Path>,
        final_path: &Path,
    ) -> Result<PathBuf, PipelineError> {
        if !cartoon.exists() {
            return Err(PipelineError::Mux(format!(
                "Cartoonized video {} does not exist",
                cartoon.display()
            )));
        }

        self.media_port.remux(cartoon, audio, final_path).await?;
        info!(
            output = %final_path.display(),
            with_audio = audio.is_some(),
            "Remuxed final video"
        );
        Ok(final_path.to_path_buf())
    }
}
