//! REST client for job creation.
//!
//! Wraps `POST /api/generate` using [`reqwest`].

use jobwatch_core::types::JobId;
use jobwatch_core::{JobStatus, JobType};
use serde::{Deserialize, Serialize};

use crate::client::endpoint;

/// Path of the job-creation endpoint.
pub const GENERATE_PATH: &str = "/api/generate";

/// HTTP client for the job API of one server.
#[derive(Debug, Clone)]
pub struct JobsApi {
    client: reqwest::Client,
    generate_url: String,
}

/// Body sent to `/api/generate`.
#[derive(Debug, Serialize)]
struct CreateJobRequest<'a> {
    #[serde(rename = "type")]
    job_type: JobType,
    data: &'a serde_json::Value,
}

/// Response returned after the server accepted a job.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    /// Server-assigned identifier for the new job.
    pub job_id: JobId,
    /// Initial status, usually `pending`.
    pub status: JobStatus,
}

/// Errors from the job API.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The request could not be sent or the response body not decoded.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("HTTP error! status: {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl RequestError {
    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            RequestError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

impl JobsApi {
    /// Create an API client for the server at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            generate_url: endpoint(base_url, GENERATE_PATH),
        }
    }

    /// Enqueue a job of the given type with an empty payload.
    pub async fn create_job(&self, job_type: JobType) -> Result<CreateJobResponse, RequestError> {
        let empty = serde_json::Value::Object(serde_json::Map::new());
        let body = CreateJobRequest {
            job_type,
            data: &empty,
        };

        let response = self
            .client
            .post(&self.generate_url)
            .json(&body)
            .send()
            .await?;

        let created: CreateJobResponse = Self::parse_response(response).await?;
        tracing::info!(
            job_id = %created.job_id,
            job_type = %job_type,
            status = %created.status,
            "Job created",
        );
        Ok(created)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`RequestError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RequestError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RequestError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RequestError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
