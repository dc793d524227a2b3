use std::path::PathBuf;
use thiserror::Error;

use super::AlbumStage;
use crate::http::FetchError;
use crate::listing::PageError;
use crate::model::AlbumId;
use crate::resolver::MetadataError;

/// Why an album was aborted. Never affects other albums of the run.
#[derive(Debug, Error)]
pub enum AlbumError {
    #[error("album {album}: info lookup failed: {source}")]
    InfoFetch {
        album: AlbumId,
        #[source]
        source: FetchError,
    },
    #[error("album {album}: {source}")]
    ListingFetch {
        album: AlbumId,
        #[source]
        source: PageError,
    },
    #[error("album {album}: {source}")]
    MetadataFetch {
        album: AlbumId,
        #[source]
        source: MetadataError,
    },
    #[error("album {album}: cannot create {}: {source}", path.display())]
    OutputDir {
        album: AlbumId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AlbumError {
    pub fn album(&self) -> &AlbumId {
        match self {
            AlbumError::InfoFetch { album, .. }
            | AlbumError::ListingFetch { album, .. }
            | AlbumError::MetadataFetch { album, .. }
            | AlbumError::OutputDir { album, .. } => album,
        }
    }

    /// Stage that was running when the album was aborted.
    pub fn stage(&self) -> AlbumStage {
        match self {
            AlbumError::InfoFetch { .. } => AlbumStage::FetchingInfo,
            AlbumError::ListingFetch { .. } => AlbumStage::FetchingListing,
            AlbumError::MetadataFetch { .. } => AlbumStage::ResolvingMetadata,
            AlbumError::OutputDir { .. } => AlbumStage::Downloading,
        }
    }
}
