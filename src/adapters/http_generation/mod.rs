// HTTP generation adapter - Video generation API client over reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::ports::*;

/// Video generation API client
pub struct HttpGenerationAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGenerationAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn generate_endpoint(&self, segment_id: &str) -> String {
        format!("{}/segment/{}/generate", self.base_url, segment_id)
    }

    pub fn frames_endpoint(&self, segment_id: &str) -> String {
        format!("{}/segment/{}/frames", self.base_url, segment_id)
    }

    /// POST a JSON body, mapping 429 to `RateLimited` and other failures to `ServiceUnavailable`
    async fn post_json<B, R>(&self, endpoint: &str, segment_id: &str, body: &B) -> Result<R, DomainError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::ServiceUnavailable(format!("generation request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(
                response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok()),
            );
            warn!(segment = %segment_id, ?retry_after, "Generation API rate limited");
            return Err(DomainError::RateLimited {
                retry_after_secs: retry_after,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::ServiceUnavailable(format!(
                "generation API answered {}: {}",
                status,
                body.trim()
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| DomainError::ServiceUnavailable(format!("invalid generation response: {}", e)))
    }
}

/// Parse a `Retry-After` header given in whole seconds
pub fn parse_retry_after(value: Option<&str>) -> Option<u64> {
    value.and_then(|v| v.trim().parse::<u64>().ok())
}

#[async_trait]
impl GenerationPort for HttpGenerationAdapter {
    async fn generate_video(&self, request: &GenerationRequest) -> Result<GeneratedAsset, DomainError> {
        let endpoint = self.generate_endpoint(&request.segment_id);
        debug!(endpoint = %endpoint, "Requesting video generation");
        self.post_json(&endpoint, &request.segment_id, request).await
    }

    async fn generate_frames(&self, request: &FrameRequest) -> Result<GeneratedFrames, DomainError> {
        let endpoint = self.frames_endpoint(&request.segment_id);
        debug!(endpoint = %endpoint, frame_type = ?request.frame_type, "Requesting keyframes");
        self.post_json(&endpoint, &request.segment_id, request).await
    }
}
