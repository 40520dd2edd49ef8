use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use uuid::Uuid;

use super::{AudioArtifact, AudioExtractor, AudioFormat};
use crate::utils::watch_url;
use crate::TranscribeError;

/// YouTube audio extractor using yt-dlp.
///
/// Downloads the best audio-only stream in its native m4a container; no
/// transcode step, so ffmpeg is not required.
pub struct YtDlpExtractor {
    yt_dlp_path: String,
}

impl YtDlpExtractor {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl AudioExtractor for YtDlpExtractor {
    async fn fetch_audio(
        &self,
        video_id: &str,
        dest_dir: &Path,
    ) -> Result<AudioArtifact, TranscribeError> {
        let format = AudioFormat::M4a;
        let filename = format!(
            "audio_{}.{}",
            &Uuid::new_v4().to_string()[..8],
            format.as_str()
        );
        let output_path = dest_dir.join(filename);
        let url = watch_url(video_id);

        tracing::debug!(video_id, path = %output_path.display(), "Downloading audio stream");

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "-f",
                "bestaudio[ext=m4a]",
                "--no-playlist",
                "-o",
                &output_path.to_string_lossy(),
                &url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscribeError::Download(format!("failed to run yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::Download(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        if !output_path.exists() {
            return Err(TranscribeError::Download(format!(
                "yt-dlp did not produce expected file: {}",
                output_path.display()
            )));
        }

        Ok(AudioArtifact {
            path: output_path,
            format,
        })
    }
}
