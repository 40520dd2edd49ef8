use anyhow::{Context, Result};
use std::time::Duration;

/// Process-wide configuration, read once at startup and immutable afterwards.
///
/// Every consumer receives this struct (or a piece of it) explicitly; nothing
/// reads the environment after `from_env` returns.
#[derive(Debug, Clone)]
pub struct Config {
    /// AssemblyAI settings
    pub assemblyai: AssemblyAiConfig,

    /// YouTube Data API key, only needed by the metadata endpoint
    pub youtube_api_key: Option<String>,

    /// Path to the yt-dlp binary
    pub yt_dlp_path: String,
}

#[derive(Debug, Clone)]
pub struct AssemblyAiConfig {
    /// API key sent in the `authorization` header
    pub api_key: String,

    /// Wait between job status checks
    pub poll_interval: Duration,

    /// Upper bound on total polling time for one job
    pub poll_timeout: Duration,
}

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 600;

impl Config {
    /// Load configuration from the environment and validate it.
    ///
    /// Fails fast when `ASSEMBLYAI_API_KEY` is missing so that no request can
    /// reach the transcription path without a credential. `YOUTUBE_API_KEY`
    /// is optional; the metadata endpoint reports its absence per request.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ASSEMBLYAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .context("ASSEMBLYAI_API_KEY not set")?;

        let youtube_api_key = std::env::var("YOUTUBE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let poll_interval = env_secs("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let poll_timeout = env_secs("POLL_TIMEOUT_SECS", DEFAULT_POLL_TIMEOUT_SECS)?;

        let yt_dlp_path = std::env::var("YT_DLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string());

        let config = Self {
            assemblyai: AssemblyAiConfig {
                api_key,
                poll_interval,
                poll_timeout,
            },
            youtube_api_key,
            yt_dlp_path,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.assemblyai.poll_interval.is_zero() {
            anyhow::bail!("POLL_INTERVAL_SECS must be greater than zero");
        }

        if self.assemblyai.poll_timeout < self.assemblyai.poll_interval {
            anyhow::bail!("POLL_TIMEOUT_SECS must be at least POLL_INTERVAL_SECS");
        }

        Ok(())
    }
}

fn env_secs(name: &str, default: u64) -> Result<Duration> {
    let secs = match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{name} must be a whole number of seconds"))?,
        Err(_) => default,
    };

    Ok(Duration::from_secs(secs))
}
