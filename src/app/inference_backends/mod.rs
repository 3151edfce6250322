// Inference backends - Local and remote implementations of the inference capability

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Content type of every video object the pipeline stores
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Runs the cartoonization model on this host
pub struct LocalInferenceBackend {
    cartoonizer: Arc<dyn CartoonizerPort>,
}

impl LocalInferenceBackend {
    pub fn new(cartoonizer: Arc<dyn CartoonizerPort>) -> Self {
        Self { cartoonizer }
    }
}

#[async_trait]
impl InferenceBackend for LocalInferenceBackend {
    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::Local
    }

    async fn run(&self, job: &VideoJob) -> Result<InferenceResult, PipelineError> {
        let frame_rate = job.require_frame_rate()?;
        let started = Instant::now();

        self.cartoonizer
            .process_video(&job.paths.transcoded, &frame_rate, &job.paths.cartoon)
            .await?;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Local inference finished"
        );
        Ok(InferenceResult {
            cartoon_path: job.paths.cartoon.clone(),
        })
    }
}

/// Buckets used for the object-storage hand-off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBuckets {
    /// Where transcoded inputs are uploaded
    pub inputs: String,
    /// Where the inference service writes its outputs
    pub results: String,
}

/// Delegates inference to the remote accelerator service
pub struct RemoteInferenceBackend {
    storage: Arc<dyn ObjectStoragePort>,
    inference: Arc<dyn RemoteInferencePort>,
    buckets: RemoteBuckets,
}

impl RemoteInferenceBackend {
    pub fn new(
        storage: Arc<dyn ObjectStoragePort>,
        inference: Arc<dyn RemoteInferencePort>,
        buckets: RemoteBuckets,
    ) -> Self {
        Self {
            storage,
            inference,
            buckets,
        }
    }

    /// Deterministic object name of a job's uploaded input
    pub fn input_object_name(job_id: &JobId) -> String {
        format!("{}.mp4", job_id)
    }
}

#[async_trait]
impl InferenceBackend for RemoteInferenceBackend {
    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::Remote
    }

    async fn run(&self, job: &VideoJob) -> Result<InferenceResult, PipelineError> {
        let started = Instant::now();
        let object_name = Self::input_object_name(&job.id);

        let input = self
            .storage
            .upload(
                &self.buckets.inputs,
                &job.paths.transcoded,
                &object_name,
                VIDEO_CONTENT_TYPE,
            )
            .await?;
        info!(uri = %input.uri, "Uploaded transcoded video");

        let response = self.inference.infer(&input.uri).await;

        // The remote copy of the input is no longer needed whatever the API answered
        if let Err(e) = self.storage.delete(&self.buckets.inputs, &object_name).await {
            warn!(
                bucket = %self.buckets.inputs,
                object = %object_name,
                error = %e,
                "Failed to delete remote input"
            );
        }

        let response = response?;
        let output_name = ObjectRef::object_name_from_uri(&response.output_uri).ok_or_else(|| {
            PipelineError::Inference(format!(
                "Inference output URI has no object name: '{}'",
                response.output_uri
            ))
        })?;

        let cartoon_path = self
            .storage
            .download(&self.buckets.results, output_name, &job.paths.cartoon)
            .await?;

        info!(
            output_uri = %response.output_uri,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Remote inference finished"
        );
        Ok(InferenceResult { cartoon_path })
    }
}
