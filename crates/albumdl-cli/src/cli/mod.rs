//! CLI for albumdl.

mod progress;
mod prompt;
mod report;

use albumdl_core::config::{self, AlbumdlConfig, MetadataPolicy};
use albumdl_core::http::CurlClient;
use albumdl_core::model::parse_album_ids;
use albumdl_core::pipeline::AlbumPipeline;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use progress::ConsoleProgress;

/// Download every track of one or more albums.
#[derive(Debug, Parser)]
#[command(name = "albumdl")]
#[command(about = "albumdl: concurrent album track downloader", long_about = None)]
pub struct Cli {
    /// Comma-separated album ids, e.g. 100000,1100200. Prompted for when omitted.
    pub ids: Option<String>,

    /// Output root; one directory per album is created inside it.
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Maximum simultaneous requests per stage.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_in_flight: Option<u64>,

    /// Skip tracks whose metadata cannot be fetched instead of aborting the album.
    #[arg(long)]
    pub tolerant_metadata: bool,
}

impl Cli {
    /// Command-line flags take precedence over the config file.
    pub fn apply(&self, cfg: &mut AlbumdlConfig) {
        if let Some(dir) = &self.output {
            cfg.output_dir = dir.clone();
        }
        if let Some(n) = self.max_in_flight {
            cfg.max_in_flight = usize::try_from(n).unwrap_or(usize::MAX);
        }
        if self.tolerant_metadata {
            cfg.metadata_policy = Some(MetadataPolicy::Tolerant);
        }
    }
}

/// Parses arguments, runs every album, and returns the process exit code:
/// success when every album finished, failure when any was aborted or an id
/// was invalid.
pub async fn run_from_args() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut cfg = config::load_or_init()?;
    cli.apply(&mut cfg);
    cfg.validate()?;
    tracing::debug!("loaded config: {:?}", cfg);

    let input = match &cli.ids {
        Some(ids) => ids.clone(),
        None => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            prompt::read_ids(&mut stdin.lock(), &mut stdout)?
        }
    };
    let albums = match parse_album_ids(&input) {
        Ok(albums) => albums,
        Err(err) => {
            eprintln!("{}", err);
            return Ok(ExitCode::FAILURE);
        }
    };

    ensure_output_root(&cfg.output_dir)?;
    let pipeline = AlbumPipeline::new(Arc::new(CurlClient::new()), &cfg);
    let progress = ConsoleProgress::new();
    let outcomes = pipeline.run(&albums, &progress).await;

    let mut stdout = io::stdout();
    report::print_outcomes(&mut stdout, &outcomes)?;
    stdout.flush()?;

    if outcomes.iter().all(|o| o.is_done()) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Creates the output root (and parents) if missing.
pub fn ensure_output_root(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)
        .with_context(|| format!("cannot create output directory {}", root.display()))
}
