use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipdigest::captions::{CaptionSource, YtDlpCaptionClient};
use clipdigest::config::Config;
use clipdigest::extractors::youtube::YtDlpExtractor;
use clipdigest::metadata::YouTubeMetadataClient;
use clipdigest::server::{self, AppState};
use clipdigest::transcribe::{AssemblyAiClient, PollSettings, TranscriptionPipeline};

#[derive(Parser)]
#[command(
    name = "clipdigest",
    about = "HTTP service that gathers YouTube transcripts and metadata for summarization",
    version
)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clipdigest=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Fails here if the transcription credential is missing, before any
    // request can reach the network.
    let config = Config::from_env()?;

    let extractor = YtDlpExtractor::new(&config.yt_dlp_path);
    if !extractor.check_availability().await {
        tracing::warn!(
            path = %config.yt_dlp_path,
            "yt-dlp not found; audio extraction and caption retrieval will fail"
        );
    }

    let captions: Arc<dyn CaptionSource> = Arc::new(YtDlpCaptionClient::new(&config.yt_dlp_path));

    let pipeline = TranscriptionPipeline::new(
        Arc::new(extractor),
        Arc::new(AssemblyAiClient::new(config.assemblyai.api_key.clone())),
        captions.clone(),
        PollSettings {
            interval: config.assemblyai.poll_interval,
            timeout: config.assemblyai.poll_timeout,
        },
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
        metadata: Arc::new(YouTubeMetadataClient::new(config.youtube_api_key.clone())),
        captions,
    };

    server::run(state, cli.listen).await
}
