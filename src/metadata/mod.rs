use serde::{Deserialize, Serialize};

const VIDEOS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";

/// Video metadata as served by the YouTube Data API v3
#[derive(Debug, Clone, Serialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// ISO 8601 duration, passed through untouched
    pub duration: String,
    pub stats: serde_json::Value,
}

/// Metadata lookup failures, mapped onto HTTP statuses by the server
#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    #[error("YOUTUBE_API_KEY not set")]
    MissingApiKey,

    #[error("Video not found")]
    NotFound,

    #[error("YouTube API error: {detail}")]
    Upstream { status: u16, detail: String },

    #[error("YouTube API request failed: {0}")]
    Request(String),
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Snippet,
    #[serde(rename = "contentDetails")]
    content_details: ContentDetails,
    #[serde(default)]
    statistics: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    description: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

/// Single-call passthrough to the YouTube Data API
pub struct YouTubeMetadataClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl YouTubeMetadataClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            endpoint: VIDEOS_ENDPOINT.to_string(),
        }
    }

    /// Point the client at a different videos endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Fetch title, description, tags, duration, and statistics for a video
    pub async fn fetch(&self, video_id: &str) -> Result<VideoMetadata, MetadataError> {
        let api_key = self.api_key.as_deref().ok_or(MetadataError::MissingApiKey)?;

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("part", "snippet,contentDetails,statistics"),
                ("id", video_id),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|e| MetadataError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MetadataError::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        let body: VideosResponse = response
            .json()
            .await
            .map_err(|e| MetadataError::Request(e.to_string()))?;

        let item = body.items.into_iter().next().ok_or(MetadataError::NotFound)?;

        Ok(VideoMetadata {
            title: item.snippet.title,
            description: item.snippet.description,
            tags: item.snippet.tags,
            duration: item.content_details.duration,
            stats: item.statistics,
        })
    }
}
