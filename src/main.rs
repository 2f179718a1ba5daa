// Entrypoint for the uploader.
// - Keeps `main` small: read the configuration and hand it to the UI.
// - Returns `anyhow::Result` so setup failures print a readable chain.

use anyhow::Context;
use immich_bulk_uploader::{config::UploaderConfig, init_tracing, ui};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // IMMICH_API_KEY / IMMICH_BASE_URL / UPLOAD_WORKERS, optionally from .env.
    let config = UploaderConfig::from_env().context("Configuration error")?;
    tracing::debug!(base_url = %config.base_url, workers = config.workers, "configuration loaded");

    ui::run(&config)?;
    Ok(())
}
