use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, Instant};

use crate::captions::{join_segments, CaptionSource};
use crate::extractors::AudioExtractor;
use crate::TranscribeError;

pub mod assemblyai;

pub use assemblyai::{AssemblyAiClient, JobStatus, JobUpdate, Paragraph, SpeechToText, Utterance};

/// Which path produced a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptSource {
    AudioTranscription,
    CaptionFallback,
}

impl std::fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptSource::AudioTranscription => write!(f, "audio_transcription"),
            TranscriptSource::CaptionFallback => write!(f, "caption_fallback"),
        }
    }
}

/// The pipeline's sole output, immutable once returned.
///
/// Fields the producing path cannot supply are empty, never absent.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResult {
    pub transcript: String,
    pub paragraphs: Vec<Paragraph>,
    pub speaker_labels: Vec<Utterance>,
    pub source: TranscriptSource,
}

/// Bounds on the job status polling loop
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Wait between status checks
    pub interval: Duration,

    /// Upper bound on total waiting; exceeding it abandons the job
    pub timeout: Duration,
}

/// Transcription pipeline with caption fallback.
///
/// The primary path downloads the audio stream, uploads it to the
/// speech-to-text service, and polls the resulting job. Any failure along that
/// path, including the poll timeout, triggers one attempt at retrieving
/// published captions instead. Only when both paths fail does `transcribe`
/// return an error, and that error carries both causes.
pub struct TranscriptionPipeline {
    extractor: Arc<dyn AudioExtractor>,
    speech: Arc<dyn SpeechToText>,
    captions: Arc<dyn CaptionSource>,
    poll: PollSettings,
}

impl TranscriptionPipeline {
    pub fn new(
        extractor: Arc<dyn AudioExtractor>,
        speech: Arc<dyn SpeechToText>,
        captions: Arc<dyn CaptionSource>,
        poll: PollSettings,
    ) -> Self {
        Self {
            extractor,
            speech,
            captions,
            poll,
        }
    }

    /// Produce a transcript for `video_id` via either path
    pub async fn transcribe(&self, video_id: &str) -> Result<TranscriptResult, TranscribeError> {
        match self.transcribe_audio(video_id).await {
            Ok(result) => Ok(result),
            Err(primary) => {
                tracing::warn!(
                    video_id,
                    error = %primary,
                    "Audio transcription failed, falling back to captions"
                );

                match self.transcribe_captions(video_id).await {
                    Ok(result) => Ok(result),
                    Err(fallback) => Err(TranscribeError::AllMethodsFailed {
                        primary: Box::new(primary),
                        fallback: Box::new(fallback),
                    }),
                }
            }
        }
    }

    /// Primary path: audio extraction, upload, job submission, bounded polling
    async fn transcribe_audio(&self, video_id: &str) -> Result<TranscriptResult, TranscribeError> {
        // Scoped per invocation; dropping it removes the audio file on every
        // exit path.
        let workdir = TempDir::new()
            .map_err(|e| TranscribeError::Download(format!("failed to create temp dir: {e}")))?;

        let artifact = self.extractor.fetch_audio(video_id, workdir.path()).await?;
        let upload_url = self.speech.upload_audio(&artifact.path).await?;
        let job_id = self.speech.submit_job(&upload_url).await?;

        tracing::info!(video_id, job_id, "Transcription job submitted");

        let update = self.wait_for_completion(&job_id).await?;

        Ok(TranscriptResult {
            transcript: update.text.unwrap_or_default(),
            paragraphs: update.paragraphs,
            speaker_labels: update.utterances,
            source: TranscriptSource::AudioTranscription,
        })
    }

    /// Poll the job at a fixed interval until it reaches a terminal status or
    /// the configured timeout elapses
    async fn wait_for_completion(&self, job_id: &str) -> Result<JobUpdate, TranscribeError> {
        let deadline = Instant::now() + self.poll.timeout;

        loop {
            let update = self.speech.job_status(job_id).await?;

            match update.status {
                JobStatus::Completed => return Ok(update),
                JobStatus::Error => {
                    return Err(TranscribeError::TranscriptionFailed(
                        update
                            .error
                            .unwrap_or_else(|| "no failure reason reported".to_string()),
                    ));
                }
                JobStatus::Queued | JobStatus::Processing => {
                    if Instant::now() + self.poll.interval > deadline {
                        return Err(TranscribeError::PollTimeout(self.poll.timeout.as_secs()));
                    }
                    sleep(self.poll.interval).await;
                }
            }
        }
    }

    /// Fallback path: published captions joined into a flat transcript
    async fn transcribe_captions(
        &self,
        video_id: &str,
    ) -> Result<TranscriptResult, TranscribeError> {
        let segments = self.captions.fetch_captions(video_id).await?;

        Ok(TranscriptResult {
            transcript: join_segments(&segments),
            paragraphs: Vec::new(),
            speaker_labels: Vec::new(),
            source: TranscriptSource::CaptionFallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::{CaptionSegment, MockCaptionSource};
    use crate::extractors::{AudioArtifact, AudioFormat, MockAudioExtractor};
    use super::assemblyai::MockSpeechToText;
    use mockall::Sequence;

    fn fast_poll() -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
        }
    }

    fn pipeline(
        extractor: MockAudioExtractor,
        speech: MockSpeechToText,
        captions: MockCaptionSource,
        poll: PollSettings,
    ) -> TranscriptionPipeline {
        TranscriptionPipeline::new(
            Arc::new(extractor),
            Arc::new(speech),
            Arc::new(captions),
            poll,
        )
    }

    fn stub_artifact() -> AudioArtifact {
        AudioArtifact {
            path: std::env::temp_dir().join("audio_stub.m4a"),
            format: AudioFormat::M4a,
        }
    }

    fn processing_update() -> JobUpdate {
        JobUpdate {
            status: JobStatus::Processing,
            text: None,
            paragraphs: Vec::new(),
            utterances: Vec::new(),
            error: None,
        }
    }

    fn completed_update(text: &str) -> JobUpdate {
        JobUpdate {
            status: JobStatus::Completed,
            text: Some(text.to_string()),
            paragraphs: Vec::new(),
            utterances: vec![Utterance {
                speaker: "A".to_string(),
                text: text.to_string(),
                start: 0,
                end: 900,
            }],
            error: None,
        }
    }

    fn happy_extractor() -> MockAudioExtractor {
        let mut extractor = MockAudioExtractor::new();
        extractor
            .expect_fetch_audio()
            .returning(|_, _| Ok(stub_artifact()));
        extractor
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_path_polls_until_completed() {
        let mut speech = MockSpeechToText::new();
        speech
            .expect_upload_audio()
            .returning(|_| Ok("https://cdn.example/upload/1".to_string()));
        speech
            .expect_submit_job()
            .withf(|url| url == "https://cdn.example/upload/1")
            .returning(|_| Ok("job-1".to_string()));

        let mut seq = Sequence::new();
        for _ in 0..2 {
            speech
                .expect_job_status()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(processing_update()));
        }
        speech
            .expect_job_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(completed_update("Hi there")));

        let mut captions = MockCaptionSource::new();
        captions.expect_fetch_captions().never();

        let pipeline = pipeline(happy_extractor(), speech, captions, fast_poll());
        let result = pipeline.transcribe("abc123").await.unwrap();

        assert_eq!(result.transcript, "Hi there");
        assert_eq!(result.source, TranscriptSource::AudioTranscription);
        assert_eq!(result.speaker_labels.len(), 1);
    }

    #[tokio::test]
    async fn test_download_failure_falls_back_to_captions() {
        let mut extractor = MockAudioExtractor::new();
        extractor
            .expect_fetch_audio()
            .returning(|_, _| Err(TranscribeError::Download("geo restricted".to_string())));

        let mut speech = MockSpeechToText::new();
        speech.expect_upload_audio().never();

        let mut captions = MockCaptionSource::new();
        captions.expect_fetch_captions().returning(|_| {
            Ok(vec![
                CaptionSegment {
                    text: "Hello".to_string(),
                    start: 0.0,
                    duration: 1.0,
                },
                CaptionSegment {
                    text: "world".to_string(),
                    start: 1.0,
                    duration: 1.0,
                },
            ])
        });

        let pipeline = pipeline(extractor, speech, captions, fast_poll());
        let result = pipeline.transcribe("abc123").await.unwrap();

        assert_eq!(result.transcript, "Hello world");
        assert_eq!(result.source, TranscriptSource::CaptionFallback);
        assert!(result.paragraphs.is_empty());
        assert!(result.speaker_labels.is_empty());
    }

    #[tokio::test]
    async fn test_missing_upload_reference_falls_back() {
        let mut speech = MockSpeechToText::new();
        speech
            .expect_upload_audio()
            .returning(|_| Err(TranscribeError::Upload("no upload_url in response".to_string())));
        speech.expect_submit_job().never();

        let mut captions = MockCaptionSource::new();
        captions.expect_fetch_captions().returning(|_| {
            Ok(vec![CaptionSegment {
                text: "fallback".to_string(),
                start: 0.0,
                duration: 2.0,
            }])
        });

        let pipeline = pipeline(happy_extractor(), speech, captions, fast_poll());
        let result = pipeline.transcribe("abc123").await.unwrap();

        assert_eq!(result.source, TranscriptSource::CaptionFallback);
        assert_eq!(result.transcript, "fallback");
    }

    #[tokio::test]
    async fn test_job_error_status_falls_back() {
        let mut speech = MockSpeechToText::new();
        speech
            .expect_upload_audio()
            .returning(|_| Ok("https://cdn.example/upload/2".to_string()));
        speech
            .expect_submit_job()
            .returning(|_| Ok("job-2".to_string()));
        speech.expect_job_status().returning(|_| {
            Ok(JobUpdate {
                status: JobStatus::Error,
                text: None,
                paragraphs: Vec::new(),
                utterances: Vec::new(),
                error: Some("unsupported audio".to_string()),
            })
        });

        let mut captions = MockCaptionSource::new();
        captions.expect_fetch_captions().returning(|_| {
            Ok(vec![CaptionSegment {
                text: "fallback".to_string(),
                start: 0.0,
                duration: 2.0,
            }])
        });

        let pipeline = pipeline(happy_extractor(), speech, captions, fast_poll());
        let result = pipeline.transcribe("abc123").await.unwrap();

        assert_eq!(result.source, TranscriptSource::CaptionFallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_terminates_when_job_never_finishes() {
        let mut speech = MockSpeechToText::new();
        speech
            .expect_upload_audio()
            .returning(|_| Ok("https://cdn.example/upload/3".to_string()));
        speech
            .expect_submit_job()
            .returning(|_| Ok("job-3".to_string()));
        speech
            .expect_job_status()
            .returning(|_| Ok(processing_update()));

        let mut captions = MockCaptionSource::new();
        captions
            .expect_fetch_captions()
            .returning(|_| Err(TranscribeError::CaptionUnavailable("none published".to_string())));

        let pipeline = pipeline(happy_extractor(), speech, captions, fast_poll());
        let err = pipeline.transcribe("abc123").await.unwrap_err();

        match err {
            TranscribeError::AllMethodsFailed { primary, fallback } => {
                assert!(matches!(*primary, TranscribeError::PollTimeout(30)));
                assert!(matches!(*fallback, TranscribeError::CaptionUnavailable(_)));
            }
            other => panic!("expected AllMethodsFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_both_paths_failing_reports_both_causes() {
        let mut extractor = MockAudioExtractor::new();
        extractor
            .expect_fetch_audio()
            .returning(|_, _| Err(TranscribeError::Download("removed video".to_string())));

        let speech = MockSpeechToText::new();

        let mut captions = MockCaptionSource::new();
        captions
            .expect_fetch_captions()
            .returning(|_| Err(TranscribeError::CaptionUnavailable("none published".to_string())));

        let pipeline = pipeline(extractor, speech, captions, fast_poll());
        let err = pipeline.transcribe("abc123").await.unwrap_err();

        match err {
            TranscribeError::AllMethodsFailed { primary, fallback } => {
                assert!(matches!(*primary, TranscribeError::Download(_)));
                assert!(matches!(*fallback, TranscribeError::CaptionUnavailable(_)));
            }
            other => panic!("expected AllMethodsFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_completed_without_optional_fields_yields_empty_sequences() {
        let mut speech = MockSpeechToText::new();
        speech
            .expect_upload_audio()
            .returning(|_| Ok("https://cdn.example/upload/4".to_string()));
        speech
            .expect_submit_job()
            .returning(|_| Ok("job-4".to_string()));
        speech.expect_job_status().returning(|_| {
            Ok(JobUpdate {
                status: JobStatus::Completed,
                text: Some("plain".to_string()),
                paragraphs: Vec::new(),
                utterances: Vec::new(),
                error: None,
            })
        });

        let captions = MockCaptionSource::new();

        let pipeline = pipeline(happy_extractor(), speech, captions, fast_poll());
        let result = pipeline.transcribe("abc123").await.unwrap();

        assert_eq!(result.transcript, "plain");
        assert!(result.paragraphs.is_empty());
        assert!(result.speaker_labels.is_empty());
    }
}
