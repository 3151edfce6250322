// Publish interactor - Hands the final video out as a time-limited signed URL

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::app::inference_backends::VIDEO_CONTENT_TYPE;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Uploads final artifacts and signs a URL for them
pub struct ResultPublisher {
    storage: Arc<dyn ObjectStoragePort>,
    bucket: String,
    ttl: Duration,
}

impl ResultPublisher {
    pub fn new(storage: Arc<dyn ObjectStoragePort>, bucket: impl Into<String>, ttl: Duration) -> Self {
        Self {
            storage,
            bucket: bucket.into(),
            ttl,
        }
    }

    /// Upload `final_path` and return the stored object with its signed URL filled in
    pub async fn publish(&self, job_id: &JobId, final_path: &Path) -> Result<ObjectRef, PipelineError> {
        let object_name = final_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}_cartoon_audio.mp4", job_id));

        let mut object = self
            .storage
            .upload(&self.bucket, final_path, &object_name, VIDEO_CONTENT_TYPE)
            .await?;
        object.signed_url = Some(self.storage.generate_signed_url(&object, self.ttl).await?);

        info!(
            bucket = %object.bucket,
            object = %object.object_key,
            ttl_secs = self.ttl.as_secs(),
            "Published final video"
        );
        Ok(object)
    }
}
