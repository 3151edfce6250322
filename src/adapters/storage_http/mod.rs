//! HTTP object storage adapter
//!
//! Talks to an object storage gateway that exposes buckets as
//! `{endpoint}/{bucket}/{object}` (PUT/GET/DELETE) and issues signed URLs
//! through `POST {endpoint}/sign`.

use async_trait::async_trait;
use reqwest::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    Body, Client, RequestBuilder, StatusCode,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Object storage reached over HTTP
pub struct HttpObjectStorageAdapter {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    bucket: &'a str,
    object: &'a str,
    ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    url: String,
}

fn storage_err(context: &str, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::Storage(format!("{}: {}", context, err))
}

impl HttpObjectStorageAdapter {
    /// Create new adapter; `timeout` bounds every request
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, PipelineError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| storage_err("Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn object_url(&self, bucket: &str, object_name: &str) -> String {
        format!("{}/{}/{}", self.endpoint, bucket, object_name)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl ObjectStoragePort for HttpObjectStorageAdapter {
    async fn upload(
        &self,
        bucket: &str,
        local_path: &Path,
        object_name: &str,
        content_type: &str,
    ) -> Result<ObjectRef, PipelineError> {
        let read_err =
            |e: std::io::Error| storage_err(&format!("Failed to read {}", local_path.display()), e);
        let file = tokio::fs::File::open(local_path).await.map_err(read_err)?;
        let len = file.metadata().await.map_err(read_err)?.len();
        let url = self.object_url(bucket, object_name);

        debug!(%url, bytes = len, "Uploading object");
        self.authorized(self.client.put(&url))
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, len)
            .body(Body::from(file))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| storage_err(&format!("Upload to {} failed", url), e))?;

        Ok(ObjectRef {
            bucket: bucket.to_string(),
            object_key: object_name.to_string(),
            content_type: content_type.to_string(),
            uri: url,
            signed_url: None,
        })
    }

    async fn generate_signed_url(
        &self,
        object: &ObjectRef,
        ttl: Duration,
    ) -> Result<String, PipelineError> {
        let request = SignRequest {
            bucket: &object.bucket,
            object: &object.object_key,
            ttl_secs: ttl.as_secs(),
        };
        let response: SignResponse = self
            .authorized(self.client.post(format!("{}/sign", self.endpoint)))
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| storage_err("Signing request failed", e))?
            .json()
            .await
            .map_err(|e| storage_err("Malformed signing response", e))?;
        Ok(response.url)
    }

    async fn delete(&self, bucket: &str, object_name: &str) -> Result<(), PipelineError> {
        let url = self.object_url(bucket, object_name);
        let response = self
            .authorized(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| storage_err(&format!("Delete of {} failed", url), e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PipelineError::Storage(format!("Object {} does not exist", url)));
        }
        response
            .error_for_status()
            .map_err(|e| storage_err(&format!("Delete of {} failed", url), e))?;
        Ok(())
    }

    async fn download(
        &self,
        bucket: &str,
        object_name: &str,
        local_dest: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let url = self.object_url(bucket, object_name);
        let mut response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| storage_err(&format!("Download of {} failed", url), e))?;

        let mut file = tokio::fs::File::create(local_dest)
            .await
            .map_err(|e| storage_err(&format!("Failed to create {}", local_dest.display()), e))?;
        let mut written = 0usize;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| storage_err(&format!("Download of {} interrupted", url), e))?
        {
            written += chunk.len();
            file.write_all(&chunk)
                .await
                .map_err(|e| storage_err("Failed to write downloaded object", e))?;
        }
        file.flush()
            .await
            .map_err(|e| storage_err("Failed to write downloaded object", e))?;

        debug!(%url, bytes = written, dest = %local_dest.display(), "Downloaded object");
        Ok(local_dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_trims_trailing_slash() {
        let adapter =
            HttpObjectStorageAdapter::new("https://storage.internal/", None, None).unwrap();
        assert_eq!(
            adapter.object_url("processed_videos_cartoonize", "abc.mp4"),
            "https://storage.internal/processed_videos_cartoonize/abc.mp4"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_storage_error() {
        let adapter = HttpObjectStorageAdapter::new(
            "http://127.0.0.1:1",
            Some("key".to_string()),
            Some(Duration::from_secs(2)),
        )
        .unwrap();
        let err = adapter.delete("bucket", "abc.mp4").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    /// Accepts one request, answers 200 and hands back the raw bytes received
    async fn capture_one_request(listener: tokio::net::TcpListener) -> String {
        use tokio::io::AsyncReadExt;

        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            received.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&received).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let l = l.to_ascii_lowercase();
                        l.strip_prefix("content-length:").map(|v| v.trim().to_string())
                    })
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(0);
                if received.len() >= end + 4 + length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
            .await
            .unwrap();
        String::from_utf8_lossy(&received).to_string()
    }

    #[tokio::test]
    async fn test_upload_streams_file_with_content_length() {
        let dir = tempfile::TempDir::new().unwrap();
        let local = dir.path().join("abc.mp4");
        std::fs::write(&local, b"transcoded video bytes").unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(capture_one_request(listener));

        let adapter =
            HttpObjectStorageAdapter::new(endpoint, None, Some(Duration::from_secs(5))).unwrap();
        let object = adapter
            .upload("processed_videos_cartoonize", &local, "abc.mp4", "video/mp4")
            .await
            .unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("PUT /processed_videos_cartoonize/abc.mp4 "));
        assert!(request.to_ascii_lowercase().contains("content-length: 22"));
        assert!(!request.to_ascii_lowercase().contains("transfer-encoding: chunked"));
        assert!(request.ends_with("transcoded video bytes"));
        assert_eq!(object.object_key, "abc.mp4");
    }

    #[tokio::test]
    async fn test_upload_of_missing_file_is_storage_error() {
        let adapter = HttpObjectStorageAdapter::new("http://127.0.0.1:1", None, None).unwrap();
        let err = adapter
            .upload("bucket", Path::new("/nonexistent/x.mp4"), "x.mp4", "video/mp4")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
