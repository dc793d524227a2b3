use std::fmt;

/// Where an album is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumStage {
    FetchingInfo,
    FetchingListing,
    ResolvingMetadata,
    Downloading,
    Done,
    Aborted,
}

impl fmt::Display for AlbumStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlbumStage::FetchingInfo => "fetching info",
            AlbumStage::FetchingListing => "fetching listing",
            AlbumStage::ResolvingMetadata => "resolving metadata",
            AlbumStage::Downloading => "downloading",
            AlbumStage::Done => "done",
            AlbumStage::Aborted => "aborted",
        };
        f.write_str(s)
    }
}
