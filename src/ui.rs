// UI layer: asks for the folder to upload, runs the scan and the upload
// pool, and prints one line per file as results come in.

use crate::api::{ApiClient, UploadOutcome, UploadReport};
use crate::config::UploaderConfig;
use crate::pool::{BatchSummary, UploaderPool};
use crate::scanner::scan_directory;
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Prompt for the root directory, then upload everything in it.
pub fn run(config: &UploaderConfig) -> Result<()> {
    let raw: String = Input::new()
        .with_prompt("Enter the path to your 'Photos' takeout directory")
        .interact_text()?;
    scan_and_upload(config, &clean_path_input(&raw))?;
    Ok(())
}

/// Terminals wrap dragged-in folders in quotes; strip them along with
/// surrounding whitespace.
fn clean_path_input(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed);
    PathBuf::from(unquoted)
}

/// Scan `root` and upload the media found. Returns `None` when nothing
/// was uploaded because the directory is missing or holds no media;
/// both cases are reported to the user and are not errors.
pub fn scan_and_upload(config: &UploaderConfig, root: &Path) -> Result<Option<BatchSummary>> {
    println!("Scanning for media files, please wait...");
    let files = match scan_directory(root) {
        Ok(files) => files,
        Err(e) => {
            println!("{}", format!("Error: {}", e).red());
            return Ok(None);
        }
    };
    if files.is_empty() {
        println!("No media files found to upload.");
        return Ok(None);
    }

    let api = ApiClient::new(config)?;
    let pool = UploaderPool::new(api, config.workers);
    println!(
        "Found {} media files. Starting upload with {} workers...",
        files.len(),
        pool.workers()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}",
    )?);

    let summary = pool.run(files, |report| {
        pb.println(styled_line(&report));
        pb.inc(1);
    });
    pb.finish_and_clear();

    println!(
        "\n{} uploaded, {} duplicates skipped, {} failed.",
        summary.uploaded, summary.duplicates, summary.failed
    );
    println!("Upload process complete.");
    Ok(Some(summary))
}

fn styled_line(report: &UploadReport) -> String {
    let line = report.to_string();
    match report.outcome {
        UploadOutcome::Success { .. } => line.green().to_string(),
        UploadOutcome::Duplicate => line.yellow().to_string(),
        _ => line.red().to_string(),
    }
}
