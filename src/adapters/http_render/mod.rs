// HTTP render adapter - Render service client over reqwest

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::ports::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    job_id: String,
}

/// Render service client
pub struct HttpRenderAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRenderAdapter {
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

    pub fn submit_endpoint(&self, scene_id: &str) -> String {
        format!("{}/scene/{}/render", self.base_url, scene_id)
    }

    pub fn status_endpoint(&self) -> String {
        format!("{}/render/status", self.base_url)
    }
}

#[async_trait]
impl RenderServicePort for HttpRenderAdapter {
    async fn submit_render(&self, scene_id: &str, request: &RenderRequest) -> Result<String, DomainError> {
        let endpoint = self.submit_endpoint(scene_id);
        info!(endpoint = %endpoint, segments = request.segments.len(), "Submitting render job");

        let response = self
            .client
            .post(&endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| DomainError::ServiceUnavailable(format!("render submit failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::RenderFailed(format!(
                "render service answered {}: {}",
                status,
                body.trim()
            )));
        }

        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| DomainError::RenderFailed(format!("invalid submit response: {}", e)))?;
        debug!(job_id = %submitted.job_id, "Render job accepted");
        Ok(submitted.job_id)
    }

    async fn poll_render(&self, job_id: &str) -> Result<RenderPollResponse, DomainError> {
        let response = self
            .client
            .get(self.status_endpoint())
            .query(&[("jobId", job_id)])
            .send()
            .await
            .map_err(|e| DomainError::ServiceUnavailable(format!("render poll failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::ServiceUnavailable(format!(
                "render status answered {}",
                status
            )));
        }

        response
            .json::<RenderPollResponse>()
            .await
            .map_err(|e| DomainError::ServiceUnavailable(format!("invalid status response: {}", e)))
    }
}
