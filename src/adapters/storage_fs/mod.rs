// Filesystem object storage adapter - Buckets as directories, for development and tests

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Directory-backed object storage
pub struct FsObjectStorageAdapter {
    root: PathBuf,
}

impl FsObjectStorageAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Build from a `file:///path` endpoint
    pub fn from_endpoint(endpoint: &str) -> Option<Self> {
        endpoint
            .strip_prefix("file://")
            .filter(|path| !path.is_empty())
            .map(Self::new)
    }

    fn object_path(&self, bucket: &str, object_name: &str) -> PathBuf {
        self.root.join(bucket).join(object_name)
    }
}

#[async_trait]
impl ObjectStoragePort for FsObjectStorageAdapter {
    async fn upload(
        &self,
        bucket: &str,
        local_path: &Path,
        object_name: &str,
        content_type: &str,
    ) -> Result<ObjectRef, PipelineError> {
        let dest = self.object_path(bucket, object_name);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::Storage(format!("Failed to create bucket: {}", e)))?;
        }
        tokio::fs::copy(local_path, &dest).await.map_err(|e| {
            PipelineError::Storage(format!("Upload of {} failed: {}", local_path.display(), e))
        })?;

        Ok(ObjectRef {
            bucket: bucket.to_string(),
            object_key: object_name.to_string(),
            content_type: content_type.to_string(),
            uri: format!("file://{}", dest.display()),
            signed_url: None,
        })
    }

    async fn generate_signed_url(
        &self,
        object: &ObjectRef,
        ttl: Duration,
    ) -> Result<String, PipelineError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| PipelineError::Storage(format!("Invalid signed URL ttl: {}", e)))?;
        let expires = (Utc::now() + ttl).timestamp();
        Ok(format!("{}?expires={}", object.uri, expires))
    }

    async fn delete(&self, bucket: &str, object_name: &str) -> Result<(), PipelineError> {
        let path = self.object_path(bucket, object_name);
        tokio::fs::remove_file(&path).await.map_err(|e| {
            PipelineError::Storage(format!("Delete of {} failed: {}", path.display(), e))
        })
    }

    async fn download(
        &self,
        bucket: &str,
        object_name: &str,
        local_dest: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let source = self.object_path(bucket, object_name);
        tokio::fs::copy(&source, local_dest).await.map_err(|e| {
            PipelineError::Storage(format!("Download of {} failed: {}", source.display(), e))
        })?;
        Ok(local_dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_endpoint() {
        assert!(FsObjectStorageAdapter::from_endpoint("file:///srv/buckets").is_some());
        assert!(FsObjectStorageAdapter::from_endpoint("file://").is_none());
        assert!(FsObjectStorageAdapter::from_endpoint("https://x").is_none());
    }

    #[tokio::test]
    async fn test_upload_download_delete() {
        let store_dir = TempDir::new().unwrap();
        let work_dir = TempDir::new().unwrap();
        let storage = FsObjectStorageAdapter::new(store_dir.path());

        let local = work_dir.path().join("input.mp4");
        std::fs::write(&local, b"video bytes").unwrap();

        let object = storage
            .upload("inputs", &local, "job.mp4", "video/mp4")
            .await
            .unwrap();
        assert_eq!(object.bucket, "inputs");
        assert_eq!(object.object_key, "job.mp4");
        assert!(object.uri.starts_with("file://"));
        assert_eq!(ObjectRef::object_name_from_uri(&object.uri), Some("job.mp4"));

        let dest = work_dir.path().join("copy.mp4");
        let written = storage.download("inputs", "job.mp4", &dest).await.unwrap();
        assert_eq!(std::fs::read(written).unwrap(), b"video bytes");

        storage.delete("inputs", "job.mp4").await.unwrap();
        assert!(storage.delete("inputs", "job.mp4").await.is_err());
        assert_eq!(
            storage
                .download("inputs", "job.mp4", &dest)
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::Storage
        );
    }

    #[tokio::test]
    async fn test_signed_url_carries_expiry() {
        let storage = FsObjectStorageAdapter::new("/srv");
        let object = ObjectRef {
            bucket: "b".to_string(),
            object_key: "k.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            uri: "file:///srv/b/k.mp4".to_string(),
            signed_url: None,
        };
        let url = storage
            .generate_signed_url(&object, Duration::from_secs(60))
            .await
            .unwrap();
        let expires: i64 = url.split("expires=").nth(1).unwrap().parse().unwrap();
        assert!(expires > Utc::now().timestamp());
    }
}
