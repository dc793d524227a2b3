//! Local names for album directories and track files.
//!
//! Titles come from the remote service and may contain path separators or
//! control characters; everything written to disk goes through here.

mod sanitize;

pub use sanitize::{sanitize_component, NAME_MAX};

use std::collections::HashSet;

use crate::model::{AlbumId, TrackMetadata};

/// Extension of downloaded tracks.
pub const TRACK_EXTENSION: &str = "mp3";

/// Directory name for an album: the sanitized title, or `album-<id>` when the
/// title is missing or sanitizes to nothing.
pub fn album_dir_name(title: Option<&str>, album: &AlbumId) -> String {
    title
        .map(|t| sanitize_component(t, NAME_MAX))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("album-{}", album))
}

/// File names for a batch of tracks, in input order.
///
/// Each is `<sanitized title>.mp3`. An empty title falls back to the track id.
/// Repeated names get ` (2)`, ` (3)`, ... so no two tracks share a file.
pub fn plan_track_filenames(tracks: &[TrackMetadata]) -> Vec<String> {
    let max_stem = NAME_MAX - TRACK_EXTENSION.len() - 1;
    let mut taken: HashSet<String> = HashSet::with_capacity(tracks.len());
    tracks
        .iter()
        .map(|track| {
            let mut stem = sanitize_component(&track.title, max_stem);
            if stem.is_empty() {
                stem = track.track_id.to_string();
            }
            let mut candidate = format!("{}.{}", stem, TRACK_EXTENSION);
            let mut n = 2u32;
            while taken.contains(&candidate) {
                let suffix = format!(" ({})", n);
                let base = sanitize_component(&stem, max_stem - suffix.len());
                candidate = format!("{}{}.{}", base, suffix, TRACK_EXTENSION);
                n += 1;
            }
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}
