use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("transcription is not configured")]
    Unconfigured,
    #[error("transcript request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("transcript service returned HTTP {0}")]
    Status(u16),
    #[error("transcript job failed: {0}")]
    JobFailed(String),
    #[error("transcript was empty")]
    Empty,
    #[error("transcript did not complete in time")]
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptJob {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[async_trait]
pub trait TranscriptService: Send + Sync {
    /// Starts a job for the media at `media_url` and returns its id.
    async fn submit(&self, media_url: &str) -> Result<String, TranscriptError>;

    async fn status(&self, job_id: &str) -> Result<TranscriptJob, TranscriptError>;
}

#[derive(Serialize)]
struct CreateJob<'a> {
    audio_url: &'a str,
}

#[derive(Deserialize)]
struct CreatedJob {
    id: String,
}

/// AssemblyAI v2 transcript API.
pub struct AssemblyAi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AssemblyAi {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, TranscriptError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl TranscriptService for AssemblyAi {
    async fn submit(&self, media_url: &str) -> Result<String, TranscriptError> {
        let response = self
            .http
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&CreateJob { audio_url: media_url })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TranscriptError::Status(response.status().as_u16()));
        }

        let created: CreatedJob = response.json().await?;
        Ok(created.id)
    }

    async fn status(&self, job_id: &str) -> Result<TranscriptJob, TranscriptError> {
        let response = self
            .http
            .get(format!("{}/transcript/{}", self.base_url, job_id))
            .header("authorization", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TranscriptError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}
