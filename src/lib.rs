// Library root
// -----------
// Bulk uploader for Immich-style asset servers. The binary (`main.rs`)
// wires these modules into an interactive run.
//
// Module responsibilities:
// - `config`: explicit settings (API key, base URL, worker count).
// - `scanner`: finds media files under a directory.
// - `media`: per-file metadata and the device asset id.
// - `api`: single-file multipart upload and outcome classification.
// - `pool`: runs uploads on a fixed number of worker threads.
// - `ui`: prompt, progress and console report.
pub mod api;
pub mod config;
pub mod media;
pub mod pool;
pub mod scanner;
pub mod ui;

/// Initialize tracing. Logs go to stderr so they do not interleave with
/// the per-file report; default level is `warn`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
