//! Turns track identifiers into direct download targets.
//!
//! One metadata request per track, run concurrently under the in-flight limit.
//! Results keep the input order. Whether one failed lookup sinks the whole
//! album is decided by [`MetadataPolicy`].

use std::sync::Arc;
use thiserror::Error;

use crate::api::ApiSettings;
use crate::config::MetadataPolicy;
use crate::control::AbortFlag;
use crate::http::{get_json, FetchError, HttpClient, HttpRequest};
use crate::model::{TrackInfoBody, TrackMetadata, TrackRef};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::scheduler::{run_strict, run_tolerant, GroupError};

/// Metadata for one track could not be resolved (strict policy).
#[derive(Debug, Error)]
#[error("metadata for track {track_id} failed: {source}")]
pub struct MetadataError {
    pub track_id: u64,
    #[source]
    pub source: FetchError,
}

pub struct MetadataResolver {
    client: Arc<dyn HttpClient>,
    api: Arc<ApiSettings>,
    max_in_flight: usize,
    policy: MetadataPolicy,
    retry: Option<RetryPolicy>,
}

impl MetadataResolver {
    pub fn new(client: Arc<dyn HttpClient>, api: Arc<ApiSettings>, max_in_flight: usize) -> Self {
        Self {
            client,
            api,
            max_in_flight,
            policy: MetadataPolicy::Strict,
            retry: None,
        }
    }

    pub fn with_policy(mut self, policy: MetadataPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_retry(mut self, retry: Option<RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    /// Resolves every track. Output order matches `tracks`.
    ///
    /// Strict: the first failure cancels outstanding lookups and is returned.
    /// Tolerant: failures are logged and left out of the result.
    pub async fn resolve_all(
        &self,
        tracks: &[TrackRef],
    ) -> Result<Vec<TrackMetadata>, MetadataError> {
        let mut requests = Vec::with_capacity(tracks.len());
        for track in tracks {
            let request = self
                .api
                .track_request(track.track_id)
                .map_err(|source| MetadataError {
                    track_id: track.track_id,
                    source,
                })?;
            requests.push((track.track_id, request));
        }

        match self.policy {
            MetadataPolicy::Strict => {
                let jobs: Vec<_> = requests
                    .into_iter()
                    .map(|(track_id, request)| {
                        let client = Arc::clone(&self.client);
                        let retry = self.retry;
                        move |abort: AbortFlag| {
                            let request = request.with_abort(abort);
                            resolve_one(client.as_ref(), track_id, &request, retry.as_ref())
                        }
                    })
                    .collect();
                run_strict(jobs, self.max_in_flight)
                    .await
                    .map_err(|GroupError { index, source }| MetadataError {
                        track_id: tracks[index].track_id,
                        source,
                    })
            }
            MetadataPolicy::Tolerant => {
                let jobs: Vec<_> = requests
                    .into_iter()
                    .map(|(track_id, request)| {
                        let client = Arc::clone(&self.client);
                        let retry = self.retry;
                        move || resolve_one(client.as_ref(), track_id, &request, retry.as_ref())
                    })
                    .collect();
                let results = run_tolerant(jobs, self.max_in_flight, |_, _| {}).await;
                let mut resolved = Vec::with_capacity(results.len());
                for (track, result) in tracks.iter().zip(results) {
                    match result {
                        Ok(meta) => resolved.push(meta),
                        Err(e) => {
                            tracing::warn!(track_id = track.track_id, "skipping track: {}", e)
                        }
                    }
                }
                Ok(resolved)
            }
        }
    }
}

fn resolve_one(
    client: &dyn HttpClient,
    track_id: u64,
    request: &HttpRequest,
    retry: Option<&RetryPolicy>,
) -> Result<TrackMetadata, FetchError> {
    let fetch = || {
        let body: TrackInfoBody = get_json(client, request)?;
        into_metadata(track_id, body)
    };
    let result = match retry {
        Some(policy) => run_with_retry(policy, fetch),
        None => fetch(),
    };
    if let Err(ref e) = result {
        if !matches!(e, FetchError::Cancelled) {
            tracing::error!(track_id, "track metadata request failed: {}", e);
        }
    }
    result
}

fn into_metadata(track_id: u64, body: TrackInfoBody) -> Result<TrackMetadata, FetchError> {
    let title = body
        .title
        .ok_or_else(|| FetchError::Malformed(format!("track {} has no title", track_id)))?;
    let url = body
        .play_url_64
        .filter(|u| !u.is_empty())
        .ok_or_else(|| FetchError::Malformed(format!("track {} has no playUrl64", track_id)))?;
    Ok(TrackMetadata {
        track_id,
        title,
        url,
    })
}
