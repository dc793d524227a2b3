//! End-of-run summary, one line per requested album.

use albumdl_core::pipeline::AlbumOutcome;
use std::io::{self, Write};

pub fn print_outcomes<W: Write>(out: &mut W, outcomes: &[AlbumOutcome]) -> io::Result<()> {
    for outcome in outcomes {
        match &outcome.result {
            Ok(summary) => {
                let title = summary.title.as_deref().unwrap_or("");
                match &summary.dir {
                    Some(dir) => writeln!(
                        out,
                        "album {} \"{}\": {}/{} tracks -> {}",
                        outcome.album,
                        title,
                        summary.downloaded,
                        summary.track_count,
                        dir.display()
                    )?,
                    None => writeln!(out, "album {}: no tracks", outcome.album)?,
                }
                for failure in &summary.failures {
                    writeln!(out, "  failed: {} ({})", failure.title, failure.error)?;
                }
            }
            Err(err) => writeln!(out, "{}: {}", outcome.stage(), err)?,
        }
    }
    Ok(())
}
