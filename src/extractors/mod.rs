use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod youtube;

use crate::TranscribeError;

/// A downloaded audio file, private to one pipeline invocation.
///
/// The file lives inside a scoped temporary directory owned by the invocation,
/// so it is removed on every exit path including fallback and error.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    /// Location of the audio file on local disk
    pub path: PathBuf,

    /// Container the audio was downloaded in
    pub format: AudioFormat,
}

/// Supported audio containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFormat {
    M4a,
    Mp3,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::M4a => "m4a",
            AudioFormat::Mp3 => "mp3",
        }
    }

    /// Get MIME type for the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }
}

/// Trait for acquiring a local audio artifact for a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Download the audio-only stream for `video_id` into `dest_dir`
    async fn fetch_audio(
        &self,
        video_id: &str,
        dest_dir: &Path,
    ) -> Result<AudioArtifact, TranscribeError>;
}
