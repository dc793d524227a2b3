//! Endpoint URLs, shared headers and timeouts, injected into every stage.
//!
//! Builds the four request kinds the pipeline issues: album info, listing
//! page, track metadata, and track audio.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::AlbumdlConfig;
use crate::http::{FetchError, HttpRequest};
use crate::model::AlbumId;

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub listing_url: String,
    pub track_url: String,
    pub page_size: u32,
    /// Sent with every request (user agent).
    pub headers: HashMap<String, String>,
    /// Timeout for JSON requests.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl ApiSettings {
    pub fn from_config(cfg: &AlbumdlConfig) -> Self {
        let mut headers = HashMap::new();
        headers.insert("User-Agent".to_string(), cfg.user_agent().to_string());
        Self {
            listing_url: cfg.listing_url.clone(),
            track_url: cfg.track_url.clone(),
            page_size: cfg.page_size.max(1),
            headers,
            request_timeout: Duration::from_secs(cfg.request_timeout_secs),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
        }
    }

    fn request(&self, base: &str, params: &[(&str, String)]) -> Result<HttpRequest, FetchError> {
        let url = url::Url::parse_with_params(base, params)?;
        Ok(HttpRequest::get(url.as_str())
            .with_headers(&self.headers)
            .with_timeout(self.request_timeout)
            .with_connect_timeout(self.connect_timeout))
    }

    /// Album lookup: page 0 with a single item, used for the track count.
    pub fn info_request(&self, album: &AlbumId) -> Result<HttpRequest, FetchError> {
        self.request(
            &self.listing_url,
            &[
                ("albumId", album.to_string()),
                ("pageNum", "0".to_string()),
                ("pageSize", "1".to_string()),
            ],
        )
    }

    pub fn page_request(&self, album_id: u64, page: u64) -> Result<HttpRequest, FetchError> {
        self.request(
            &self.listing_url,
            &[
                ("albumId", album_id.to_string()),
                ("pageNum", page.to_string()),
                ("pageSize", self.page_size.to_string()),
            ],
        )
    }

    pub fn track_request(&self, track_id: u64) -> Result<HttpRequest, FetchError> {
        self.request(
            &self.track_url,
            &[
                ("device", "iPhone".to_string()),
                ("trackId", track_id.to_string()),
            ],
        )
    }

    /// Audio download: URL used verbatim, with its own timeout.
    pub fn audio_request(&self, url: &str, timeout: Duration) -> HttpRequest {
        HttpRequest::get(url)
            .with_headers(&self.headers)
            .with_timeout(timeout)
            .with_connect_timeout(self.connect_timeout)
    }
}
