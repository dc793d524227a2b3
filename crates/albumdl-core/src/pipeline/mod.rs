//! Per-album orchestration: info → listing → metadata → downloads.
//!
//! Albums run one after another in the order given. Each album walks the
//! stages of [`AlbumStage`]; a failure aborts that album only and the run
//! moves on to the next id.

mod error;
mod stage;

pub use error::AlbumError;
pub use stage::AlbumStage;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::api::ApiSettings;
use crate::config::AlbumdlConfig;
use crate::downloader::{DownloadFailure, Downloader};
use crate::http::HttpClient;
use crate::listing::{self, ListingFetcher};
use crate::model::AlbumId;
use crate::naming;
use crate::paginator::Paginator;
use crate::resolver::MetadataResolver;
use crate::scheduler::ProgressSink;

/// What a finished album produced.
#[derive(Debug)]
pub struct AlbumSummary {
    pub title: Option<String>,
    /// Album directory; `None` when the album had nothing to download.
    pub dir: Option<PathBuf>,
    /// Tracks handed to the downloader.
    pub track_count: usize,
    pub downloaded: usize,
    pub failures: Vec<DownloadFailure>,
}

/// Result of one requested album.
#[derive(Debug)]
pub struct AlbumOutcome {
    pub album: AlbumId,
    pub result: Result<AlbumSummary, AlbumError>,
}

impl AlbumOutcome {
    /// `Done` or `Aborted`.
    pub fn stage(&self) -> AlbumStage {
        match self.result {
            Ok(_) => AlbumStage::Done,
            Err(_) => AlbumStage::Aborted,
        }
    }

    pub fn is_done(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct AlbumPipeline {
    listing: ListingFetcher,
    resolver: MetadataResolver,
    downloader: Downloader,
    paginator: Paginator,
    output_root: PathBuf,
}

impl AlbumPipeline {
    /// Wires every stage to `client` with the endpoints, limits and policies
    /// from `cfg`. Album directories are created under `cfg.output_dir`.
    pub fn new(client: Arc<dyn HttpClient>, cfg: &AlbumdlConfig) -> Self {
        let api = Arc::new(ApiSettings::from_config(cfg));
        let max_in_flight = cfg.max_in_flight.max(1);
        let retry = cfg.retry_policy();
        Self {
            listing: ListingFetcher::new(Arc::clone(&client), Arc::clone(&api), max_in_flight),
            resolver: MetadataResolver::new(Arc::clone(&client), Arc::clone(&api), max_in_flight)
                .with_policy(cfg.metadata_policy())
                .with_retry(retry),
            downloader: Downloader::new(
                client,
                Arc::clone(&api),
                max_in_flight,
                Duration::from_secs(cfg.download_timeout_secs),
            )
            .with_retry(retry),
            paginator: Paginator::new(cfg.page_size),
            output_root: cfg.output_dir.clone(),
        }
    }

    /// Processes `albums` in order; one outcome per id, aborted albums included.
    pub async fn run(&self, albums: &[AlbumId], progress: &dyn ProgressSink) -> Vec<AlbumOutcome> {
        let mut outcomes = Vec::with_capacity(albums.len());
        for album in albums {
            let result = self.run_album(album, progress).await;
            match &result {
                Ok(summary) => tracing::info!(
                    album = %album,
                    title = summary.title.as_deref().unwrap_or(""),
                    downloaded = summary.downloaded,
                    failed = summary.failures.len(),
                    "album {}",
                    AlbumStage::Done
                ),
                Err(e) => {
                    tracing::error!(album = %album, stage = %e.stage(), "album aborted: {}", e)
                }
            }
            outcomes.push(AlbumOutcome {
                album: album.clone(),
                result,
            });
        }
        outcomes
    }

    /// Runs every stage for one album.
    pub async fn run_album(
        &self,
        album: &AlbumId,
        progress: &dyn ProgressSink,
    ) -> Result<AlbumSummary, AlbumError> {
        enter(album, AlbumStage::FetchingInfo);
        let mut info = self
            .listing
            .fetch_album_info(album)
            .await
            .map_err(|source| AlbumError::InfoFetch {
                album: album.clone(),
                source,
            })?;

        enter(album, AlbumStage::FetchingListing);
        let page_count = self.paginator.page_count(info.track_total_count);
        tracing::debug!(
            album = %album,
            total = info.track_total_count,
            pages = page_count,
            page_size = self.paginator.page_size(),
            "listing plan"
        );
        let records = self
            .listing
            .fetch_all_tracks(info.album_id, page_count)
            .await
            .map_err(|source| AlbumError::ListingFetch {
                album: album.clone(),
                source,
            })?;
        info.album_title = listing::album_title(&records).map(str::to_owned);

        enter(album, AlbumStage::ResolvingMetadata);
        let metadata = self
            .resolver
            .resolve_all(&listing::track_refs(&records))
            .await
            .map_err(|source| AlbumError::MetadataFetch {
                album: album.clone(),
                source,
            })?;

        if metadata.is_empty() {
            tracing::info!(album = %album, "album has no tracks to download");
            return Ok(AlbumSummary {
                title: info.album_title,
                dir: None,
                track_count: 0,
                downloaded: 0,
                failures: Vec::new(),
            });
        }

        enter(album, AlbumStage::Downloading);
        let dir = self
            .output_root
            .join(naming::album_dir_name(info.album_title.as_deref(), album));
        std::fs::create_dir_all(&self.output_root)
            .and_then(|_| std::fs::create_dir(&dir))
            .map_err(|source| AlbumError::OutputDir {
                album: album.clone(),
                path: dir.clone(),
                source,
            })?;

        let label = info.album_title.as_deref().unwrap_or(album.as_str());
        progress.begin(label, metadata.len());
        let report = self.downloader.download_all(&dir, &metadata, progress).await;
        progress.finish();

        Ok(AlbumSummary {
            title: info.album_title,
            dir: Some(dir),
            track_count: metadata.len(),
            downloaded: report.written.len(),
            failures: report.failures,
        })
    }
}

fn enter(album: &AlbumId, stage: AlbumStage) {
    tracing::info!(album = %album, stage = %stage, "album stage");
}
