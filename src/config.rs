// Configuration: everything the uploader needs to talk to the server,
// gathered once at startup and then passed around by reference.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:2283/api";
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DEVICE_ID: &str = "rust-bulk-uploader";

/// File in the home directory holding the API key when `IMMICH_API_KEY`
/// is not set.
const API_KEY_FILE: &str = ".immich_api_key";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no API key: set IMMICH_API_KEY or write it to ~/.immich_api_key")]
    MissingApiKey,

    #[error("invalid value for {name}: {value:?} (expected a positive integer)")]
    InvalidNumber { name: &'static str, value: String },
}

/// Settings for one uploader run.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub api_key: String,
    /// Server API root, e.g. `http://photos.local:2283/api`, without a
    /// trailing slash.
    pub base_url: String,
    pub workers: usize,
    pub timeout: Duration,
    /// Sent as `deviceId` with every asset.
    pub device_id: String,
}

impl UploaderConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        UploaderConfig {
            api_key: api_key.into(),
            base_url: normalize_base_url(&base_url.into()),
            workers: DEFAULT_WORKERS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            device_id: DEFAULT_DEVICE_ID.to_string(),
        }
    }

    /// Build the configuration from the process environment (after
    /// loading a `.env` file if one exists).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok(), read_key_file)
    }

    /// Same as `from_env` but with injectable sources, so parsing can be
    /// tested without touching the real environment.
    fn from_lookup<F, K>(var: F, key_file: K) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
        K: FnOnce() -> Option<String>,
    {
        let api_key = var("IMMICH_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .or_else(key_file)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let base_url = var("IMMICH_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let mut config = UploaderConfig::new(api_key, base_url);

        if let Some(raw) = var("UPLOAD_WORKERS") {
            config.workers = parse_positive("UPLOAD_WORKERS", &raw)? as usize;
        }
        if let Some(raw) = var("UPLOAD_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_positive("UPLOAD_TIMEOUT_SECS", &raw)?);
        }
        if let Some(device_id) = var("UPLOAD_DEVICE_ID").filter(|d| !d.is_empty()) {
            config.device_id = device_id;
        }
        Ok(config)
    }

    /// Endpoint receiving new assets.
    pub fn assets_url(&self) -> String {
        format!("{}/assets", self.base_url)
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            name,
            value: raw.to_string(),
        }),
    }
}

fn key_file_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(API_KEY_FILE)
}

fn read_key_file() -> Option<String> {
    std::fs::read_to_string(key_file_path()).ok()
}
