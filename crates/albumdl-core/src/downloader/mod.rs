//! Album track downloader.
//!
//! Downloads every resolved track of an album into one directory as a single
//! concurrent batch (bounded by the in-flight limit). Failures stay local to
//! their track: siblings keep going and the progress sink is still ticked.

mod budget;

pub use budget::DownloadBudget;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::api::ApiSettings;
use crate::http::{FetchError, HttpClient};
use crate::model::TrackMetadata;
use crate::naming;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::scheduler::{run_tolerant, ItemEvent, ItemStatus, ProgressSink};

/// One track that could not be downloaded.
#[derive(Debug)]
pub struct DownloadFailure {
    pub track_id: u64,
    pub title: String,
    pub error: FetchError,
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Files written, in input order.
    pub written: Vec<PathBuf>,
    pub failures: Vec<DownloadFailure>,
    pub bytes: u64,
}

impl DownloadReport {
    pub fn attempted(&self) -> usize {
        self.written.len() + self.failures.len()
    }
}

pub struct Downloader {
    client: Arc<dyn HttpClient>,
    api: Arc<ApiSettings>,
    max_in_flight: usize,
    /// Per-track timeout unit of the batch budget.
    item_timeout: Duration,
    retry: Option<RetryPolicy>,
}

impl Downloader {
    pub fn new(
        client: Arc<dyn HttpClient>,
        api: Arc<ApiSettings>,
        max_in_flight: usize,
        item_timeout: Duration,
    ) -> Self {
        Self {
            client,
            api,
            max_in_flight,
            item_timeout,
            retry: None,
        }
    }

    pub fn with_retry(mut self, retry: Option<RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    /// Downloads `tracks` into `target_dir` (which the caller has created).
    ///
    /// Each track goes to `<title>.mp3`; a non-200 response writes nothing.
    /// `progress.item_finished` is called exactly once per track.
    pub async fn download_all(
        &self,
        target_dir: &Path,
        tracks: &[TrackMetadata],
        progress: &dyn ProgressSink,
    ) -> DownloadReport {
        let budget = DownloadBudget::for_batch(tracks.len(), self.item_timeout);
        let names = naming::plan_track_filenames(tracks);
        let destinations: Vec<PathBuf> = names.iter().map(|n| target_dir.join(n)).collect();
        tracing::debug!(
            dir = %target_dir.display(),
            tracks = tracks.len(),
            per_item_secs = budget.per_item.as_secs(),
            total_secs = budget.total.as_secs(),
            "starting download batch"
        );

        let jobs: Vec<_> = tracks
            .iter()
            .zip(&destinations)
            .map(|(track, dest)| {
                let client = Arc::clone(&self.client);
                let request = self.api.audio_request(&track.url, budget.per_item);
                let dest = dest.clone();
                let retry = self.retry;
                move || {
                    let fetch = || client.download_to(&request, &dest);
                    match retry.as_ref() {
                        Some(policy) => run_with_retry(policy, fetch),
                        None => fetch(),
                    }
                }
            })
            .collect();

        let results = run_tolerant(jobs, self.max_in_flight, |index, result| {
            let track = &tracks[index];
            let status = match result {
                Ok(bytes) => ItemStatus::Succeeded { bytes: *bytes },
                Err(e) => {
                    match e.status() {
                        Some(code) => tracing::error!(
                            track_id = track.track_id,
                            status = code,
                            "download track error: HTTP {}",
                            code
                        ),
                        None => tracing::error!(
                            track_id = track.track_id,
                            "download track error: {}",
                            e
                        ),
                    }
                    ItemStatus::Failed(e)
                }
            };
            progress.item_finished(&ItemEvent {
                index,
                label: &track.title,
                status,
            });
        })
        .await;

        let mut report = DownloadReport::default();
        for ((track, dest), result) in tracks.iter().zip(destinations).zip(results) {
            match result {
                Ok(bytes) => {
                    report.bytes += bytes;
                    report.written.push(dest);
                }
                Err(error) => report.failures.push(DownloadFailure {
                    track_id: track.track_id,
                    title: track.title.clone(),
                    error,
                }),
            }
        }
        tracing::info!(
            dir = %target_dir.display(),
            written = report.written.len(),
            failed = report.failures.len(),
            bytes = report.bytes,
            "download batch finished"
        );
        report
    }
}
