//! Album and track types, plus the JSON shapes the remote API returns.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when an album id is not all digits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("id: {0} is not valid album id")]
pub struct InvalidAlbumId(pub String);

/// Numeric album identifier, kept as the text the user supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlbumId(String);

impl AlbumId {
    /// Accepts a non-empty string of ASCII digits (surrounding whitespace ignored).
    pub fn parse(input: &str) -> Result<Self, InvalidAlbumId> {
        let id = input.trim();
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidAlbumId(id.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AlbumId {
    type Err = InvalidAlbumId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parses a comma-separated id list (`"100000, 1100200"`). Fails on the first
/// entry that is not a valid id, including empty entries.
pub fn parse_album_ids(input: &str) -> Result<Vec<AlbumId>, InvalidAlbumId> {
    input.split(',').map(AlbumId::parse).collect()
}

/// `data` of the album info lookup (page 0, size 1).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumInfo {
    pub album_id: u64,
    pub track_total_count: u64,
    /// Filled from the first listed track; the info lookup does not carry it.
    #[serde(skip)]
    pub album_title: Option<String>,
}

/// One entry of a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRecord {
    pub track_id: u64,
    #[serde(default)]
    pub album_title: Option<String>,
}

/// Identifier of one track to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackRef {
    pub track_id: u64,
}

impl From<&TrackRecord> for TrackRef {
    fn from(record: &TrackRecord) -> Self {
        Self {
            track_id: record.track_id,
        }
    }
}

/// Resolved download target for one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub track_id: u64,
    /// Display title, not yet sanitized for the filesystem.
    pub title: String,
    /// 64 kbps playback URL.
    pub url: String,
}

/// Top-level `{ "data": ... }` wrapper of the listing endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingPage {
    #[serde(default)]
    pub tracks: Vec<TrackRecord>,
}

/// Body of the track metadata endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TrackInfoBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "playUrl64")]
    pub play_url_64: Option<String>,
}
