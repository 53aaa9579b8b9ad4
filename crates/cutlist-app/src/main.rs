//! Cutlist - cut a recording into sections and rebuild it from the kept ones
//!
//! Entry point: logging, configuration and the command loop.

mod repl;

use anyhow::{Context, Result};
use cutlist_core::CutlistConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Initialize logging (stderr, so command output stays readable)
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Cutlist starting...");

    let config = CutlistConfig::load(None).context("Failed to load configuration")?;
    cutlist_media::init(&config.tools);

    // Optional media file on the command line
    let media_path = std::env::args().nth(1).map(PathBuf::from);

    let mut repl = repl::Repl::new(config);
    if let Some(path) = media_path {
        if let Err(e) = repl.open(&path) {
            eprintln!("Failed to open {}: {e}", path.display());
        }
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    repl.run(stdin.lock(), stdout.lock())?;

    info!("Cutlist exiting");
    Ok(())
}
