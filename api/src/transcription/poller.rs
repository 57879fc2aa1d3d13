use std::{sync::Arc, time::Duration};

use tokio::time::{self, Instant};

use super::client::{AssemblyAi, JobStatus, TranscriptError, TranscriptService};
use crate::config::TranscriptConfig;

pub const FALLBACK_LABEL: &str = "Video Ask";
const LABEL_WORDS: usize = 7;

/// Derives a short label for a video from its transcript.
///
/// Best effort: every failure ends in [`FALLBACK_LABEL`].
#[derive(Clone)]
pub struct TranscriptionPoller {
    service: Option<Arc<dyn TranscriptService>>,
    poll_interval: Duration,
    timeout: Duration,
}

impl TranscriptionPoller {
    pub fn new(
        service: Option<Arc<dyn TranscriptService>>,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            poll_interval,
            timeout,
        }
    }

    /// Uses AssemblyAI when an API key is configured, otherwise always falls back.
    pub fn from_config(config: &TranscriptConfig) -> Self {
        let service = config.api_key.as_ref().and_then(|key| {
            match AssemblyAi::new(config.base_url.clone(), key.clone()) {
                Ok(client) => Some(Arc::new(client) as Arc<dyn TranscriptService>),
                Err(e) => {
                    tracing::warn!("Transcription disabled, client setup failed: {}", e);
                    None
                }
            }
        });
        Self::new(service, config.poll_interval, config.timeout)
    }

    pub async fn derive_label(&self, media_url: &str) -> String {
        match self.try_derive_label(media_url).await {
            Ok(label) => label,
            Err(TranscriptError::Unconfigured) => FALLBACK_LABEL.to_string(),
            Err(e) => {
                tracing::warn!("Falling back to default label: {}", e);
                FALLBACK_LABEL.to_string()
            }
        }
    }

    async fn try_derive_label(&self, media_url: &str) -> Result<String, TranscriptError> {
        let service = self.service.as_deref().ok_or(TranscriptError::Unconfigured)?;
        let deadline = Instant::now() + self.timeout;

        time::timeout_at(deadline, self.run(service, media_url))
            .await
            .map_err(|_| TranscriptError::TimedOut)?
    }

    async fn run(
        &self,
        service: &dyn TranscriptService,
        media_url: &str,
    ) -> Result<String, TranscriptError> {
        let job_id = service.submit(media_url).await?;
        tracing::debug!(job_id = %job_id, "Transcript job submitted");

        loop {
            time::sleep(self.poll_interval).await;

            let job = match service.status(&job_id).await {
                Ok(job) => job,
                Err(e) => {
                    tracing::debug!(job_id = %job_id, "Transcript status check failed: {}", e);
                    continue;
                }
            };

            match job.status {
                JobStatus::Completed => {
                    let text = job.text.unwrap_or_default();
                    return label_from_transcript(&text).ok_or(TranscriptError::Empty);
                }
                JobStatus::Error => {
                    return Err(TranscriptError::JobFailed(
                        job.error.unwrap_or_else(|| "unknown error".to_string()),
                    ));
                }
                JobStatus::Queued | JobStatus::Processing | JobStatus::Unknown => {}
            }
        }
    }
}

/// The first few words of the transcript, or `None` when it has no words.
pub fn label_from_transcript(text: &str) -> Option<String> {
    let label = text
        .split_whitespace()
        .take(LABEL_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    (!label.is_empty()).then_some(label)
}
