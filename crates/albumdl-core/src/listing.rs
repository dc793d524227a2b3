//! Album info lookup and concurrent listing retrieval.
//!
//! All pages of an album are requested at once (bounded by the in-flight
//! limit) and reassembled in page order. Any failed page fails the listing.

use std::sync::Arc;
use thiserror::Error;

use crate::api::ApiSettings;
use crate::control::AbortFlag;
use crate::http::{FetchError, HttpClient};
use crate::model::{AlbumId, AlbumInfo, Envelope, ListingPage, TrackRecord, TrackRef};
use crate::scheduler::{run_strict, GroupError};

/// A listing page could not be fetched; the whole listing is void.
#[derive(Debug, Error)]
#[error("listing page {page} failed: {source}")]
pub struct PageError {
    pub page: u64,
    #[source]
    pub source: FetchError,
}

const MAX_PREALLOC_PAGES: u64 = 1024;

pub struct ListingFetcher {
    client: Arc<dyn HttpClient>,
    api: Arc<ApiSettings>,
    max_in_flight: usize,
}

impl ListingFetcher {
    pub fn new(client: Arc<dyn HttpClient>, api: Arc<ApiSettings>, max_in_flight: usize) -> Self {
        Self {
            client,
            api,
            max_in_flight,
        }
    }

    /// Single lookup (page 0, size 1) for the album's track count.
    /// A non-200 status or a missing `data` object is an error.
    pub async fn fetch_album_info(&self, album: &AlbumId) -> Result<AlbumInfo, FetchError> {
        let request = self.api.info_request(album)?;
        let client = Arc::clone(&self.client);
        let response = tokio::task::spawn_blocking(move || client.get(&request))
            .await
            .map_err(|e| FetchError::Worker(e.to_string()))??;
        if !response.is_ok() {
            tracing::error!(album = %album, status = response.status, "album info request failed");
            return Err(FetchError::Http(response.status));
        }
        let envelope: Envelope<AlbumInfo> = response.json()?;
        let info = envelope
            .data
            .ok_or_else(|| FetchError::Malformed("album info has no data".to_string()))?;
        if info.album_id.to_string() != album.as_str() {
            tracing::warn!(album = %album, returned = info.album_id, "album info id mismatch");
        }
        Ok(info)
    }

    /// Fetches pages `0..page_count` concurrently and concatenates their
    /// tracks in page order. Fails on the first page that fails; pages still
    /// in flight are cancelled.
    pub async fn fetch_all_tracks(
        &self,
        album_id: u64,
        page_count: u64,
    ) -> Result<Vec<TrackRecord>, PageError> {
        // The count comes from the server; only preallocate a sane amount.
        let mut jobs = Vec::with_capacity(page_count.min(MAX_PREALLOC_PAGES) as usize);
        for page in 0..page_count {
            let request = self
                .api
                .page_request(album_id, page)
                .map_err(|source| PageError { page, source })?;
            let client = Arc::clone(&self.client);
            jobs.push(move |abort: AbortFlag| {
                let response = client.get(&request.with_abort(abort))?;
                if !response.is_ok() {
                    tracing::error!(
                        album_id,
                        page,
                        status = response.status,
                        "listing page request failed"
                    );
                    return Err(FetchError::Http(response.status));
                }
                let envelope: Envelope<ListingPage> = response.json()?;
                let listing = envelope.data.ok_or_else(|| {
                    FetchError::Malformed(format!("listing page {} has no data", page))
                })?;
                tracing::debug!(
                    album_id,
                    page,
                    tracks = listing.tracks.len(),
                    "listing page fetched"
                );
                Ok(listing.tracks)
            });
        }

        let pages = run_strict(jobs, self.max_in_flight)
            .await
            .map_err(|GroupError { index, source }| PageError {
                page: index as u64,
                source,
            })?;
        Ok(pages.into_iter().flatten().collect())
    }
}

/// Track identifiers in listing order.
pub fn track_refs(records: &[TrackRecord]) -> Vec<TrackRef> {
    records.iter().map(TrackRef::from).collect()
}

/// Album title as carried by the first listed track.
pub fn album_title(records: &[TrackRecord]) -> Option<&str> {
    records.first().and_then(|r| r.album_title.as_deref())
}
