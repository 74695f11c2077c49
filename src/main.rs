//! # albumcat - Album Merging CLI
//!
//! Merges every album folder of a music library into a single audio file with
//! FFmpeg, running one encoder per CPU core.
//!
//! ## Features
//!
//! - **Parallel Merging**: Albums are merged concurrently on a bounded worker pool
//! - **Failure Isolation**: A broken album is reported and never stops the others
//! - **Cover Art**: Tags and cover art are carried over from each album's first track
//! - **Configurable**: Codec, bitrate, profile and worker count via environment variables
//!
//! ## Usage
//!
//! ```bash
//! # Merge all albums under a library folder into <folder>/merged_tracks
//! albumcat --folder /path/to/music
//!
//! # Use the library configured in ALBUMCAT_MUSIC_DIR (or the current directory)
//! albumcat
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use albumcat::commands::merge::MergeCommand;
use albumcat::config::Config;

/// albumcat - Merge album folders into single audio files
#[derive(Parser)]
#[command(
    name = "albumcat",
    about = "Merge every album folder of a music library into a single audio file",
    long_about = "Concatenates the tracks of each subfolder into <folder>/merged_tracks/<album>.<ext> using FFmpeg, one album per CPU core.",
    version
)]
struct Cli {
    /// Parent music folder containing one subfolder per album [default: current directory]
    #[arg(long, short = 'f', env = "ALBUMCAT_MUSIC_DIR")]
    folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "albumcat=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let result = run(cli, config).await;

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let folder = match cli.folder {
        Some(folder) => folder,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };

    info!("Starting merge for folder: {:?}, config: {:?}", folder, config);
    let merge_cmd = MergeCommand::new(folder, config);
    let report = merge_cmd.execute().await?;
    merge_cmd.print_report(&report);
    Ok(())
}
