// Scanner: finds the media files under a root directory. It only lists
// directories and inspects names; file contents are never opened here.

use jwalk::WalkDir;
use std::fs;
use std::path::{Path, PathBuf};

/// Photo and video extensions accepted for upload (lowercase, no dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "heic", "heif", "mov", "mp4", "m4v", "3gp", "avi", "mkv",
    "wmv", "mpg",
];

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Directory not found at '{}'", .0.display())]
    NotFound(PathBuf),
}

/// Whether the file name carries one of the supported extensions,
/// compared case-insensitively.
pub fn is_supported_media(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Recursively collect every supported media file below `root`.
///
/// Fails only when `root` itself is not an existing directory. Entries
/// that cannot be read are logged and skipped so one bad folder does not
/// hide the rest of the tree. Directory symlinks are not descended into;
/// symlinks to regular files are kept. The result is sorted.
pub fn scan_directory(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotFound(root.to_path_buf()));
    }
    let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .skip_hidden(false);

    let mut found: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| {
            let file_type = entry.file_type();
            file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
        })
        .map(|entry| entry.path())
        .filter(|path| is_supported_media(path))
        .collect();

    found.sort();
    tracing::debug!(count = found.len(), "scan finished");
    Ok(found)
}
