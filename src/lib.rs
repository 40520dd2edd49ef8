//! ClipDigest - an HTTP service that assembles YouTube video inputs for summarization
//!
//! This library orchestrates three external collaborators: yt-dlp for audio
//! extraction, AssemblyAI for speech-to-text, and YouTube's published captions
//! as a fallback transcript source. Metadata lookup and video-ID extraction
//! are thin passthroughs; the final summarization step is delegated to an
//! external caller.

pub mod captions;
pub mod config;
pub mod extractors;
pub mod metadata;
pub mod server;
pub mod transcribe;
pub mod utils;

pub use captions::CaptionSegment;
pub use config::Config;
pub use extractors::{AudioArtifact, AudioExtractor};
pub use transcribe::{TranscriptResult, TranscriptSource, TranscriptionPipeline};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Failures of the transcription pipeline and its collaborators.
///
/// Every variant except `AllMethodsFailed` triggers the caption fallback;
/// `AllMethodsFailed` is the only error a caller of the pipeline ever sees.
#[derive(thiserror::Error, Debug)]
pub enum TranscribeError {
    #[error("Audio download failed: {0}")]
    Download(String),

    #[error("Audio upload failed: {0}")]
    Upload(String),

    #[error("Transcription job submission failed: {0}")]
    Submission(String),

    #[error("Transcription job failed: {0}")]
    TranscriptionFailed(String),

    #[error("Transcription job did not finish within {0} seconds")]
    PollTimeout(u64),

    #[error("Captions unavailable: {0}")]
    CaptionUnavailable(String),

    #[error("All transcription methods failed (primary: {primary}; fallback: {fallback})")]
    AllMethodsFailed {
        primary: Box<TranscribeError>,
        fallback: Box<TranscribeError>,
    },
}
