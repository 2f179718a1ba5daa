// Uploader pool: a fixed number of worker threads drain the scanned file
// list and hand each outcome back to the calling thread as it completes.

use crate::api::{ApiClient, UploadOutcome, UploadReport};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

/// Anything that can push a single file and classify the result.
pub trait Uploader: Sync {
    fn upload(&self, path: &Path) -> UploadOutcome;
}

impl Uploader for ApiClient {
    fn upload(&self, path: &Path) -> UploadOutcome {
        ApiClient::upload(self, path)
    }
}

/// Totals for a finished batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub uploaded: usize,
    pub duplicates: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &UploadOutcome) {
        match outcome {
            UploadOutcome::Success { .. } => self.uploaded += 1,
            UploadOutcome::Duplicate => self.duplicates += 1,
            _ => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.uploaded + self.duplicates + self.failed
    }
}

pub struct UploaderPool<U> {
    uploader: U,
    workers: usize,
}

impl<U: Uploader> UploaderPool<U> {
    /// `workers` is clamped to at least one.
    pub fn new(uploader: U, workers: usize) -> Self {
        UploaderPool {
            uploader,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Upload every file, at most `workers` at a time. `on_report` runs on
    /// the calling thread once per file, in completion order. Returns once
    /// every file has produced a report; there is no early exit.
    pub fn run<F>(&self, files: Vec<PathBuf>, mut on_report: F) -> BatchSummary
    where
        F: FnMut(UploadReport),
    {
        let mut summary = BatchSummary::default();
        if files.is_empty() {
            return summary;
        }

        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<UploadReport>();
        let workers = self.workers.min(files.len());
        tracing::info!(files = files.len(), workers, "starting upload batch");

        thread::scope(|scope| {
            for worker in 0..workers {
                let tx = tx.clone();
                let files = &files;
                let next = &next;
                let uploader = &self.uploader;
                scope.spawn(move || loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(path) = files.get(index) else {
                        break;
                    };
                    let outcome = uploader.upload(path);
                    if outcome.is_failure() {
                        tracing::warn!(worker, file = %path.display(), ?outcome, "upload failed");
                    } else {
                        tracing::debug!(worker, file = %path.display(), ?outcome, "upload finished");
                    }
                    let report = UploadReport {
                        path: path.clone(),
                        outcome,
                    };
                    if tx.send(report).is_err() {
                        break;
                    }
                });
            }
            // Only worker clones remain, so the loop below ends when they do.
            drop(tx);

            for report in rx {
                summary.record(&report.outcome);
                on_report(report);
            }
        });

        tracing::info!(?summary, "upload batch complete");
        summary
    }
}
