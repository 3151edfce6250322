// Remote inference adapter - Synchronous call to the GPU inference API

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// HTTP client for the remote inference API
pub struct HttpInferenceAdapter {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct InferRequest<'a> {
    input_uri: &'a str,
}

impl HttpInferenceAdapter {
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
            .map_err(|e| PipelineError::Inference(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    fn parse_response(body: &str) -> Result<RemoteInferenceResponse, PipelineError> {
        let response: RemoteInferenceResponse = serde_json::from_str(body).map_err(|e| {
            PipelineError::Inference(format!("Malformed inference response: {}", e))
        })?;
        if ObjectRef::object_name_from_uri(&response.output_uri).is_none() {
            return Err(PipelineError::Inference(format!(
                "Inference response has no usable output_uri: '{}'",
                response.output_uri
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteInferencePort for HttpInferenceAdapter {
    async fn infer(&self, input_uri: &str) -> Result<RemoteInferenceResponse, PipelineError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&InferRequest { input_uri });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            let reason = if e.is_timeout() { "timed out" } else { "failed" };
            PipelineError::Inference(format!("Inference request {}: {}", reason, e))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::Inference(format!("Failed to read inference response: {}", e)))?;
        if !status.is_success() {
            return Err(PipelineError::Inference(format!(
                "Inference API returned {}: {}",
                status, body
            )));
        }

        debug!(%input_uri, "Remote inference completed");
        Self::parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_response() {
        let response = HttpInferenceAdapter::parse_response(
            r#"{"output_uri": "data://cartoonized_videos/abc_cartoon.mp4", "elapsed": 12}"#,
        )
        .unwrap();
        assert_eq!(response.output_uri, "data://cartoonized_videos/abc_cartoon.mp4");
    }

    #[test]
    fn test_parse_malformed_response() {
        for body in ["", "{}", r#"{"output_uri": 5}"#, r#"{"output_uri": "gs://bucket/"}"#] {
            let err = HttpInferenceAdapter::parse_response(body).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Inference, "{}", body);
        }
    }

    #[tokio::test]
    async fn test_unreachable_api_is_inference_error() {
        let adapter = HttpInferenceAdapter::new(
            "http://127.0.0.1:1/infer",
            None,
            Some(Duration::from_secs(2)),
        )
        .unwrap();
        let err = adapter.infer("file:///x.mp4").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);
    }
}
