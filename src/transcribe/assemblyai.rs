use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::TranscribeError;

const DEFAULT_BASE_URL: &str = "https://api.assemblyai.com/v2";

/// Lifecycle of a transcription job as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

/// A paragraph-level segment of the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub end: u64,
}

/// A diarized utterance attributed to one speaker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: String,
    pub text: String,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub end: u64,
}

/// One poll of a transcription job.
///
/// `text`, `paragraphs`, and `utterances` are only populated once the job is
/// completed; `error` only when it failed.
#[derive(Debug, Clone, Deserialize)]
pub struct JobUpdate {
    pub status: JobStatus,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub utterances: Vec<Utterance>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: Option<String>,
}

/// Trait for the speech-to-text service (upload / submit-job / poll-job)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Upload local audio bytes; returns the opaque upload reference
    async fn upload_audio(&self, audio_path: &Path) -> Result<String, TranscribeError>;

    /// Submit a transcription job with speaker diarization; returns the job id
    async fn submit_job(&self, upload_url: &str) -> Result<String, TranscribeError>;

    /// Fetch the current state of a job
    async fn job_status(&self, job_id: &str) -> Result<JobUpdate, TranscribeError>;
}

/// AssemblyAI REST client
pub struct AssemblyAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AssemblyAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different ingestion endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SpeechToText for AssemblyAiClient {
    async fn upload_audio(&self, audio_path: &Path) -> Result<String, TranscribeError> {
        let bytes = fs_err::read(audio_path)
            .map_err(|e| TranscribeError::Upload(format!("failed to read audio file: {e}")))?;

        tracing::debug!(
            path = %audio_path.display(),
            size = bytes.len(),
            "Uploading audio to transcription service"
        );

        let response: UploadResponse = self
            .http
            .post(format!("{}/upload", self.base_url))
            .header("authorization", &self.api_key)
            .body(bytes)
            .send()
            .await
            .map_err(|e| TranscribeError::Upload(e.to_string()))?
            .error_for_status()
            .map_err(|e| TranscribeError::Upload(e.to_string()))?
            .json()
            .await
            .map_err(|e| TranscribeError::Upload(e.to_string()))?;

        response
            .upload_url
            .ok_or_else(|| TranscribeError::Upload("no upload_url in response".to_string()))
    }

    async fn submit_job(&self, upload_url: &str) -> Result<String, TranscribeError> {
        let response: SubmitResponse = self
            .http
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&serde_json::json!({
                "audio_url": upload_url,
                "speaker_labels": true,
            }))
            .send()
            .await
            .map_err(|e| TranscribeError::Submission(e.to_string()))?
            .error_for_status()
            .map_err(|e| TranscribeError::Submission(e.to_string()))?
            .json()
            .await
            .map_err(|e| TranscribeError::Submission(e.to_string()))?;

        response
            .id
            .ok_or_else(|| TranscribeError::Submission("no job id in response".to_string()))
    }

    async fn job_status(&self, job_id: &str) -> Result<JobUpdate, TranscribeError> {
        self.http
            .get(format!("{}/transcript/{job_id}", self.base_url))
            .header("authorization", &self.api_key)
            .send()
            .await
            .map_err(|e| TranscribeError::TranscriptionFailed(format!("status check failed: {e}")))?
            .error_for_status()
            .map_err(|e| TranscribeError::TranscriptionFailed(format!("status check failed: {e}")))?
            .json()
            .await
            .map_err(|e| TranscribeError::TranscriptionFailed(format!("status check failed: {e}")))
    }
}
