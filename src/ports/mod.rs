// Ports - Interface definitions (contracts)

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for reading stream metadata from a media file
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a file. A missing frame-rate field yields `frame_rate: None`, not an error.
    async fn probe(&self, file_path: &Path) -> Result<VideoMetadata, PipelineError>;
}

/// Port for the external transcoding/muxing tool
#[async_trait]
pub trait MediaToolPort: Send + Sync {
    /// Trim/resize/re-rate `input` into `output`, copying the audio stream unmodified
    async fn transcode(
        &self,
        input: &Path,
        spec: &TranscodeSpec,
        output: &Path,
    ) -> Result<(), PipelineError>;

    /// Demux the audio-only stream of `input` into `output` without re-encoding samples
    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<(), PipelineError>;

    /// Stream-copy the video of `video` and the audio of `audio` into `output`,
    /// truncated to the shorter stream. Without audio the video is copied alone.
    async fn remux(
        &self,
        video: &Path,
        audio: Option<&Path>,
        output: &Path,
    ) -> Result<(), PipelineError>;
}

/// Port for the opaque local cartoonization engine
#[async_trait]
pub trait CartoonizerPort: Send + Sync {
    /// Cartoonize every frame of `input` and encode `output` at `frame_rate` with no audio
    async fn process_video(
        &self,
        input: &Path,
        frame_rate: &FrameRate,
        output: &Path,
    ) -> Result<(), PipelineError>;
}

/// Port for the object storage service
#[async_trait]
pub trait ObjectStoragePort: Send + Sync {
    /// Upload a local file and return a reference to the stored object
    async fn upload(
        &self,
        bucket: &str,
        local_path: &Path,
        object_name: &str,
        content_type: &str,
    ) -> Result<ObjectRef, PipelineError>;

    /// Time-limited URL granting read access to an object
    async fn generate_signed_url(
        &self,
        object: &ObjectRef,
        ttl: Duration,
    ) -> Result<String, PipelineError>;

    /// Remove an object
    async fn delete(&self, bucket: &str, object_name: &str) -> Result<(), PipelineError>;

    /// Download an object to `local_dest` and return the written path
    async fn download(
        &self,
        bucket: &str,
        object_name: &str,
        local_dest: &Path,
    ) -> Result<PathBuf, PipelineError>;
}

/// Port for the remote inference API
#[async_trait]
pub trait RemoteInferencePort: Send + Sync {
    /// Single synchronous round trip; returns where the output object lives
    async fn infer(&self, input_uri: &str) -> Result<RemoteInferenceResponse, PipelineError>;
}

/// Inference capability shared by the local and remote execution strategies
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    fn strategy(&self) -> ExecutionStrategy;

    /// Produce the job's cartoonized, audio-less video at `job.paths.cartoon`
    async fn run(&self, job: &VideoJob) -> Result<InferenceResult, PipelineError>;
}
