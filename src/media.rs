// Per-file metadata read right before upload.

use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// A file about to be uploaded, with the metadata the server wants.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub path: PathBuf,
    pub file_name: String,
    pub created: SystemTime,
    pub modified: SystemTime,
    pub size: u64,
}

impl MediaFile {
    /// Read metadata for `path`. Fails if the file vanished or cannot be
    /// stat'ed. Creation time falls back to modification time where the
    /// platform does not record it.
    pub fn inspect(path: &Path) -> io::Result<MediaFile> {
        let meta = fs::metadata(path)?;
        if !meta.is_file() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"));
        }
        let modified = meta.modified()?;
        let created = meta.created().unwrap_or(modified);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Ok(MediaFile {
            path: path.to_path_buf(),
            file_name,
            created,
            modified,
            size: meta.len(),
        })
    }

    pub fn device_asset_id(&self) -> String {
        device_asset_id(&self.file_name, self.modified)
    }

    pub fn created_at(&self) -> String {
        iso_timestamp(self.created)
    }

    pub fn modified_at(&self) -> String {
        iso_timestamp(self.modified)
    }
}

/// `<name>-<mtime>` with the modification time in fractional Unix
/// seconds, always with a fractional part (`1700000000.0`,
/// `1700000000.25`).
pub fn device_asset_id(file_name: &str, modified: SystemTime) -> String {
    format!("{}-{}", file_name, epoch_seconds(modified))
}

fn epoch_seconds(t: SystemTime) -> String {
    let secs = match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    };
    let rendered = secs.to_string();
    if rendered.contains('.') {
        rendered
    } else {
        format!("{rendered}.0")
    }
}

/// RFC 3339 timestamp in local time, e.g. `2024-05-01T12:30:00.250+02:00`.
pub fn iso_timestamp(t: SystemTime) -> String {
    DateTime::<Local>::from(t).to_rfc3339()
}
