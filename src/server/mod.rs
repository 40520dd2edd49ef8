use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::captions::{join_segments, CaptionSegment, CaptionSource};
use crate::metadata::{MetadataError, VideoMetadata, YouTubeMetadataClient};
use crate::transcribe::{TranscriptResult, TranscriptionPipeline};
use crate::utils::extract_video_id;

/// Shared handler state; read-only after startup
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TranscriptionPipeline>,
    pub metadata: Arc<YouTubeMetadataClient>,
    pub captions: Arc<dyn CaptionSource>,
}

/// Error response carrying an HTTP status and a human-readable detail string
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "detail": self.detail }));
        (self.status, body).into_response()
    }
}

impl From<crate::TranscribeError> for ApiError {
    fn from(err: crate::TranscribeError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<MetadataError> for ApiError {
    fn from(err: MetadataError) -> Self {
        let status = match &err {
            MetadataError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            MetadataError::NotFound => StatusCode::NOT_FOUND,
            MetadataError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            MetadataError::Request(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ExtractVideoIdRequest {
    video_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExtractVideoIdResponse {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct TranscribeRequest {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoIdQuery {
    video_id: String,
}

#[derive(Debug, Serialize)]
struct CaptionsResponse {
    captions: String,
    segments: Vec<CaptionSegment>,
}

/// Assemble the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/extract_video_id", post(extract_video_id_handler))
        .route("/metadata", get(metadata_handler))
        .route("/transcribe", post(transcribe_handler))
        .route("/captions", get(captions_handler))
        .route("/summarize", post(summarize_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn run(state: AppState, listen_address: SocketAddr) -> crate::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(listen_address).await?;
    tracing::info!("Listening on {listen_address}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn extract_video_id_handler(
    Json(payload): Json<ExtractVideoIdRequest>,
) -> Result<Json<ExtractVideoIdResponse>, ApiError> {
    let video_url = payload
        .video_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing 'video_url' in request body"))?;

    let video_id = extract_video_id(&video_url)
        .ok_or_else(|| ApiError::bad_request("Invalid YouTube URL"))?;

    Ok(Json(ExtractVideoIdResponse { video_id }))
}

async fn metadata_handler(
    State(state): State<AppState>,
    Query(query): Query<VideoIdQuery>,
) -> Result<Json<VideoMetadata>, ApiError> {
    let metadata = state.metadata.fetch(&query.video_id).await?;
    Ok(Json(metadata))
}

async fn transcribe_handler(
    State(state): State<AppState>,
    Json(payload): Json<TranscribeRequest>,
) -> Result<Json<TranscriptResult>, ApiError> {
    let video_id = payload
        .video_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing 'video_id' in request body"))?;

    let result = state.pipeline.transcribe(&video_id).await?;
    Ok(Json(result))
}

async fn captions_handler(
    State(state): State<AppState>,
    Query(query): Query<VideoIdQuery>,
) -> Result<Json<CaptionsResponse>, ApiError> {
    let segments = state.captions.fetch_captions(&query.video_id).await?;

    Ok(Json(CaptionsResponse {
        captions: join_segments(&segments),
        segments,
    }))
}

/// Echo endpoint; the caller feeds the gathered data to an external LLM
async fn summarize_handler(Json(payload): Json<serde_json::Value>) -> Json<serde_json::Value> {
    Json(payload)
}
