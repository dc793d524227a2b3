//! Per-album progress bar on stderr.

use albumdl_core::scheduler::{ItemEvent, ProgressCounter, ProgressSink, ProgressStats};
use std::io::Write;
use std::sync::Mutex;

const BAR_WIDTH: usize = 30;

/// Renders `[#####-----] done/total` for a snapshot.
pub fn render_bar(stats: &ProgressStats) -> String {
    let filled = (stats.fraction() * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    let mut line = format!(
        "[{}{}] {}/{}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        stats.done,
        stats.total
    );
    if stats.failed > 0 {
        line.push_str(&format!(" ({} failed)", stats.failed));
    }
    line
}

#[derive(Default)]
pub struct ConsoleProgress {
    counter: ProgressCounter,
    label: Mutex<String>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn draw(&self, stats: &ProgressStats) {
        let label = self.label.lock().map(|l| l.clone()).unwrap_or_default();
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{} {}", label, render_bar(stats));
        let _ = err.flush();
    }
}

impl ProgressSink for ConsoleProgress {
    fn begin(&self, label: &str, total: usize) {
        if let Ok(mut l) = self.label.lock() {
            *l = label.to_string();
        }
        self.counter.reset(total);
        self.draw(&self.counter.snapshot());
    }

    fn item_finished(&self, event: &ItemEvent<'_>) {
        let stats = self.counter.record(&event.status);
        self.draw(&stats);
    }

    fn finish(&self) {
        eprintln!();
    }
}
