use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Listing endpoint; also answers the album info lookup (page 0, size 1).
pub const DEFAULT_LISTING_URL: &str = "https://www.ximalaya.com/revision/album/v1/getTracksList";
/// Per-track metadata endpoint (title + playback URL).
pub const DEFAULT_TRACK_URL: &str = "http://mobile.ximalaya.com/v1/track/baseInfo";
/// Browser-like user agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Retry policy parameters (optional section in config.toml).
///
/// Absent by default: failed requests are surfaced, not retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 10,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// What the metadata stage does when a single track lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataPolicy {
    /// Abort the whole album on the first failed lookup.
    #[default]
    Strict,
    /// Log failed lookups and continue with the tracks that resolved.
    Tolerant,
}

/// Global configuration loaded from `~/.config/albumdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlbumdlConfig {
    /// Listing / album info endpoint.
    pub listing_url: String,
    /// Track metadata endpoint.
    pub track_url: String,
    /// Tracks per listing page.
    pub page_size: u32,
    /// Maximum simultaneous HTTP requests within one pipeline stage.
    pub max_in_flight: usize,
    /// Timeout for listing and metadata requests.
    pub request_timeout_secs: u64,
    /// Connect timeout applied to every request.
    pub connect_timeout_secs: u64,
    /// Per-track download timeout; the batch budget is this times the track count.
    pub download_timeout_secs: u64,
    /// Root directory; one subdirectory per album is created inside it.
    pub output_dir: PathBuf,
    /// Overrides the built-in browser user agent.
    pub user_agent: Option<String>,
    /// "strict" (default) or "tolerant".
    pub metadata_policy: Option<MetadataPolicy>,
    /// Optional retry policy; if missing, requests are not retried.
    pub retry: Option<RetryConfig>,
}

impl Default for AlbumdlConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            track_url: DEFAULT_TRACK_URL.to_string(),
            page_size: 30,
            max_in_flight: 8,
            request_timeout_secs: 30,
            connect_timeout_secs: 15,
            download_timeout_secs: 300,
            output_dir: PathBuf::from("output"),
            user_agent: None,
            metadata_policy: None,
            retry: None,
        }
    }
}

impl AlbumdlConfig {
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn metadata_policy(&self) -> MetadataPolicy {
        self.metadata_policy.unwrap_or_default()
    }

    pub fn retry_policy(&self) -> Option<RetryPolicy> {
        self.retry.as_ref().map(RetryConfig::to_policy)
    }

    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            anyhow::bail!("page_size must be at least 1");
        }
        if self.max_in_flight == 0 {
            anyhow::bail!("max_in_flight must be at least 1");
        }
        url::Url::parse(&self.listing_url)
            .map_err(|e| anyhow::anyhow!("invalid listing_url {:?}: {}", self.listing_url, e))?;
        url::Url::parse(&self.track_url)
            .map_err(|e| anyhow::anyhow!("invalid track_url {:?}: {}", self.track_url, e))?;
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("albumdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AlbumdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = AlbumdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: AlbumdlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
