// API client module: a small blocking HTTP client that pushes one asset
// per call to the server's `POST /assets` endpoint and turns whatever
// happens into an `UploadOutcome`.

use crate::config::UploaderConfig;
use crate::media::MediaFile;
use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Blocking client shared by all upload workers. `reqwest`'s client is
/// internally reference counted, so cloning is cheap.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    assets_url: String,
    device_id: String,
}

/// Response of `POST /assets`. Older servers flag duplicates with a
/// boolean, newer ones with `status: "duplicate"`.
#[derive(Deserialize, Debug)]
pub struct AssetUploadResponse {
    pub id: Option<String>,
    #[serde(default)]
    pub duplicate: bool,
    pub status: Option<String>,
}

impl AssetUploadResponse {
    pub fn is_duplicate(&self) -> bool {
        self.duplicate || self.status.as_deref() == Some("duplicate")
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success { asset_id: String },
    Duplicate,
    HttpError { status: u16, message: String, body: String },
    TransportError { message: String },
    IoError { message: String },
}

impl UploadOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self, UploadOutcome::Success { .. } | UploadOutcome::Duplicate)
    }
}

/// An outcome together with the file it belongs to. `Display` renders
/// the one-line console report.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub path: PathBuf,
    pub outcome: UploadOutcome,
}

impl fmt::Display for UploadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.path.to_string_lossy());
        match &self.outcome {
            UploadOutcome::Success { asset_id } => {
                write!(f, "SUCCESS: Uploaded {} (ID: {})", name, asset_id)
            }
            UploadOutcome::Duplicate => write!(f, "SKIPPED (Duplicate): {}", name),
            UploadOutcome::HttpError { message, body, .. } => {
                write!(f, "HTTP Error for {}: {} | Response: {}", name, message, body)
            }
            UploadOutcome::TransportError { message } => {
                write!(f, "Request Exception for {}: {}", name, message)
            }
            UploadOutcome::IoError { message } => {
                write!(f, "File Error for {}: {}", self.path.display(), message)
            }
        }
    }
}

impl ApiClient {
    /// Build a client with the API key and JSON accept header preset on
    /// every request and the per-request timeout from `config`.
    pub fn new(config: &UploaderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(&config.api_key)
            .context("API key is not a valid header value")?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            assets_url: config.assets_url(),
            device_id: config.device_id.clone(),
        })
    }

    /// Upload one file. Never fails: every error is classified into the
    /// returned outcome so sibling uploads are unaffected.
    pub fn upload(&self, path: &Path) -> UploadOutcome {
        let media = match MediaFile::inspect(path) {
            Ok(media) => media,
            Err(e) => return UploadOutcome::IoError { message: e.to_string() },
        };
        let file = match File::open(&media.path) {
            Ok(file) => file,
            Err(e) => return UploadOutcome::IoError { message: e.to_string() },
        };

        let part = multipart::Part::reader_with_length(file, media.size)
            .file_name(media.file_name.clone());
        let form = multipart::Form::new()
            .text("deviceAssetId", media.device_asset_id())
            .text("deviceId", self.device_id.clone())
            .text("fileCreatedAt", media.created_at())
            .text("fileModifiedAt", media.modified_at())
            .text("isFavorite", "false")
            .part("assetData", part);

        tracing::debug!(file = %media.path.display(), size = media.size, "uploading");
        let res = match self.client.post(&self.assets_url).multipart(form).send() {
            Ok(res) => res,
            Err(e) => return UploadOutcome::TransportError { message: e.to_string() },
        };

        let status = res.status();
        if !status.is_success() {
            let message = format!("{} for url: {}", status, res.url());
            let body = res.text().unwrap_or_else(|_| "".into());
            return UploadOutcome::HttpError {
                status: status.as_u16(),
                message,
                body,
            };
        }

        match res.json::<AssetUploadResponse>() {
            Ok(resp) if resp.is_duplicate() => UploadOutcome::Duplicate,
            Ok(resp) => UploadOutcome::Success {
                asset_id: resp.id.unwrap_or_else(|| "unknown".into()),
            },
            Err(e) => UploadOutcome::TransportError { message: e.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn client_for(server: &mockito::Server) -> ApiClient {
        let mut config = UploaderConfig::new("test-key", format!("{}/api", server.url()));
        config.timeout = Duration::from_secs(5);
        ApiClient::new(&config).unwrap()
    }

    fn media_fixture(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"not really a jpeg").unwrap();
        path
    }

    #[test]
    fn successful_upload_reports_asset_id() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/assets")
            .match_header("x-api-key", "test-key")
            .match_header("accept", "application/json")
            .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="deviceAssetId""#.into()),
                Matcher::Regex(r#"IMG_1\.jpg-\d+\.\d+"#.into()),
                Matcher::Regex(r#"name="deviceId""#.into()),
                Matcher::Regex(r#"name="fileCreatedAt""#.into()),
                Matcher::Regex(r#"name="fileModifiedAt""#.into()),
                Matcher::Regex(r#"name="isFavorite""#.into()),
                Matcher::Regex(r#"name="assetData"; filename="IMG_1\.jpg""#.into()),
                Matcher::Regex("not really a jpeg".into()),
            ]))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(json!({ "id": "abc123", "duplicate": false }).to_string())
            .create();

        let dir = tempfile::tempdir().unwrap();
        let path = media_fixture(dir.path(), "IMG_1.jpg");
        let outcome = client_for(&server).upload(&path);

        mock.assert();
        assert_eq!(outcome, UploadOutcome::Success { asset_id: "abc123".into() });
    }

    #[test]
    fn id_without_duplicate_flag_is_success() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/assets")
            .with_status(201)
            .with_body(json!({ "id": "abc123" }).to_string())
            .create();

        let dir = tempfile::tempdir().unwrap();
        let outcome = client_for(&server).upload(&media_fixture(dir.path(), "a.png"));
        assert_eq!(outcome, UploadOutcome::Success { asset_id: "abc123".into() });
    }

    #[test]
    fn duplicate_flag_is_reported_as_duplicate() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/assets")
            .with_status(200)
            .with_body(json!({ "id": "existing", "duplicate": true }).to_string())
            .create();

        let dir = tempfile::tempdir().unwrap();
        let outcome = client_for(&server).upload(&media_fixture(dir.path(), "a.png"));
        assert_eq!(outcome, UploadOutcome::Duplicate);
    }

    #[test]
    fn duplicate_status_is_reported_as_duplicate() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/assets")
            .with_status(200)
            .with_body(json!({ "id": "existing", "status": "duplicate" }).to_string())
            .create();

        let dir = tempfile::tempdir().unwrap();
        let outcome = client_for(&server).upload(&media_fixture(dir.path(), "a.png"));
        assert_eq!(outcome, UploadOutcome::Duplicate);
    }

    #[test]
    fn non_success_status_captures_code_and_body() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/assets")
            .with_status(401)
            .with_body(r#"{"message":"Invalid API key"}"#)
            .create();

        let dir = tempfile::tempdir().unwrap();
        let outcome = client_for(&server).upload(&media_fixture(dir.path(), "a.png"));
        match outcome {
            UploadOutcome::HttpError { status, message, body } => {
                assert_eq!(status, 401);
                assert!(message.contains("401"));
                assert_eq!(body, r#"{"message":"Invalid API key"}"#);
            }
            other => panic!("expected HttpError, got {:?}", other),
        }
    }

    #[test]
    fn malformed_json_is_a_transport_error() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/assets")
            .with_status(201)
            .with_body("<html>proxy page</html>")
            .create();

        let dir = tempfile::tempdir().unwrap();
        let outcome = client_for(&server).upload(&media_fixture(dir.path(), "a.png"));
        assert!(matches!(outcome, UploadOutcome::TransportError { .. }));
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        // Bind then drop a listener to get a local port nobody serves.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = UploaderConfig::new("k", format!("http://127.0.0.1:{}/api", port));
        let api = ApiClient::new(&config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let outcome = api.upload(&media_fixture(dir.path(), "a.png"));
        assert!(matches!(outcome, UploadOutcome::TransportError { .. }));
    }

    #[test]
    fn stalled_server_times_out_as_transport_error() {
        // Accepts connections but never answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let stalled = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            std::thread::sleep(Duration::from_secs(3));
            drop(stream);
        });

        let mut config = UploaderConfig::new("k", format!("http://127.0.0.1:{}/api", port));
        config.timeout = Duration::from_secs(1);
        let api = ApiClient::new(&config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let started = std::time::Instant::now();
        let outcome = api.upload(&media_fixture(dir.path(), "a.png"));

        assert!(
            matches!(outcome, UploadOutcome::TransportError { .. }),
            "expected TransportError, got {:?}",
            outcome
        );
        assert!(started.elapsed() < Duration::from_secs(3));
        stalled.join().unwrap();
    }

    #[test]
    fn vanished_file_is_an_io_error_without_request() {
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", "/api/assets").expect(0).create();

        let dir = tempfile::tempdir().unwrap();
        let outcome = client_for(&server).upload(&dir.path().join("gone.jpg"));

        mock.assert();
        assert!(matches!(outcome, UploadOutcome::IoError { .. }));
    }

    #[test]
    fn report_lines_name_the_file() {
        let report = |outcome| UploadReport {
            path: PathBuf::from("/photos/sub/c.PNG"),
            outcome,
        };
        assert_eq!(
            report(UploadOutcome::Success { asset_id: "abc123".into() }).to_string(),
            "SUCCESS: Uploaded c.PNG (ID: abc123)"
        );
        assert_eq!(
            report(UploadOutcome::Duplicate).to_string(),
            "SKIPPED (Duplicate): c.PNG"
        );
        assert_eq!(
            report(UploadOutcome::HttpError {
                status: 500,
                message: "500 Internal Server Error".into(),
                body: "boom".into(),
            })
            .to_string(),
            "HTTP Error for c.PNG: 500 Internal Server Error | Response: boom"
        );
        assert!(report(UploadOutcome::IoError { message: "gone".into() })
            .to_string()
            .starts_with("File Error for /photos/sub/c.PNG"));
    }
}
