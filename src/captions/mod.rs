use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;

use crate::utils::watch_url;
use crate::TranscribeError;

/// A single captioned segment, ordered by start time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Concatenate segment texts with single spaces, preserving order
pub fn join_segments(segments: &[CaptionSegment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trait for retrieving published captions for a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch the caption track for `video_id`, ordered by time
    async fn fetch_captions(&self, video_id: &str) -> Result<Vec<CaptionSegment>, TranscribeError>;
}

/// Caption retrieval via yt-dlp subtitle download.
///
/// Downloads the published (or auto-generated) English caption track as VTT
/// without touching the media stream, then parses the cues into timed
/// segments.
pub struct YtDlpCaptionClient {
    yt_dlp_path: String,
}

impl YtDlpCaptionClient {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }
}

#[async_trait]
impl CaptionSource for YtDlpCaptionClient {
    async fn fetch_captions(&self, video_id: &str) -> Result<Vec<CaptionSegment>, TranscribeError> {
        let workdir = TempDir::new().map_err(|e| {
            TranscribeError::CaptionUnavailable(format!("failed to create temp dir: {e}"))
        })?;
        let output_template = workdir.path().join("%(id)s");
        let url = watch_url(video_id);

        tracing::debug!(video_id, "Downloading caption track");

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--write-sub",
                "--write-auto-sub",
                "--sub-lang",
                "en,en-US,en-GB",
                "--sub-format",
                "vtt",
                "--skip-download",
                "-o",
                &output_template.to_string_lossy(),
                &url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                TranscribeError::CaptionUnavailable(format!("failed to run yt-dlp: {e}"))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::CaptionUnavailable(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let vtt_path = find_vtt_file(workdir.path())?;
        let content = fs_err::read_to_string(&vtt_path).map_err(|e| {
            TranscribeError::CaptionUnavailable(format!("failed to read caption file: {e}"))
        })?;

        let segments = parse_vtt(&content);
        if segments.is_empty() {
            return Err(TranscribeError::CaptionUnavailable(
                "caption track contained no cues".to_string(),
            ));
        }

        Ok(segments)
    }
}

/// Pick a downloaded VTT file, preferring English tracks
fn find_vtt_file(dir: &std::path::Path) -> Result<PathBuf, TranscribeError> {
    let mut vtt_files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| TranscribeError::CaptionUnavailable(format!("failed to read temp dir: {e}")))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("vtt"))
        .collect();

    if vtt_files.is_empty() {
        return Err(TranscribeError::CaptionUnavailable(
            "no captions published for this video".to_string(),
        ));
    }

    vtt_files.sort_by_key(|path| {
        let name = path.file_name().map(|n| n.to_string_lossy().to_string());
        match name {
            Some(name) if name.contains(".en") => 0,
            _ => 1,
        }
    });

    Ok(vtt_files.remove(0))
}

/// Parse VTT cues into timed segments.
///
/// Strips markup tags, skips numeric cue identifiers, and drops the repeated
/// lines that auto-generated rolling captions produce.
pub fn parse_vtt(content: &str) -> Vec<CaptionSegment> {
    let timing = Regex::new(
        r"^((?:\d{2}:)?\d{2}:\d{2}\.\d{3})\s+-->\s+((?:\d{2}:)?\d{2}:\d{2}\.\d{3})",
    )
    .unwrap();
    let tag = Regex::new(r"<[^>]+>").unwrap();

    let mut segments: Vec<CaptionSegment> = Vec::new();
    let mut current: Option<(f64, f64)> = None;
    let mut last_text = String::new();

    for raw_line in content.lines() {
        let line = tag.replace_all(raw_line.trim(), "").to_string();

        if line.is_empty() || line.eq_ignore_ascii_case("webvtt") {
            continue;
        }

        if let Some(caps) = timing.captures(&line) {
            let start = parse_timestamp(&caps[1]);
            let end = parse_timestamp(&caps[2]);
            current = Some((start, end));
            continue;
        }

        // numeric cue identifiers
        if line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let Some((start, end)) = current else {
            continue;
        };

        if line == last_text {
            continue;
        }

        last_text = line.clone();
        segments.push(CaptionSegment {
            text: line,
            start,
            duration: (end - start).max(0.0),
        });
    }

    segments
}

/// Convert `HH:MM:SS.mmm` or `MM:SS.mmm` into seconds
fn parse_timestamp(raw: &str) -> f64 {
    let mut seconds = 0.0;
    for part in raw.split(':') {
        seconds = seconds * 60.0 + part.parse::<f64>().unwrap_or(0.0);
    }
    seconds
}
