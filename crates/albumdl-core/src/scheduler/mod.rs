//! Concurrency building blocks shared by the pipeline stages.
//!
//! Bounded fan-out of blocking request jobs in two flavours (strict fail-fast
//! for listing/metadata, tolerant for downloads) and the progress sink that
//! receives one signal per finished download.

mod group;
mod progress;

pub use group::{run_strict, run_tolerant, GroupError};
pub use progress::{ItemEvent, ItemStatus, NoProgress, ProgressCounter, ProgressSink, ProgressStats};
