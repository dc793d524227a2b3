//! HTTP capability used by every pipeline stage.
//!
//! Stages only see the [`HttpClient`] trait: `GET(url, headers) -> (status, body)`
//! with a timeout, plus a streaming variant for track downloads. [`CurlClient`]
//! is the libcurl implementation; tests substitute in-process fakes.

mod curl_client;
mod error;
#[cfg(test)]
pub(crate) mod fake;

pub use curl_client::CurlClient;
pub use error::FetchError;

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::control::AbortFlag;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// One GET request. The query string is already part of `url`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    /// Whole-transfer timeout.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// When set, the transfer stops once the flag is raised.
    pub abort: Option<AbortFlag>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            abort: None,
        }
    }

    pub fn with_headers(mut self, headers: &HashMap<String, String>) -> Self {
        self.headers
            .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_abort(mut self, abort: AbortFlag) -> Self {
        self.abort = Some(abort);
        self
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.as_ref().is_some_and(AbortFlag::is_set)
    }
}

/// Status and fully buffered body of a GET.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Blocking HTTP GET capability. Implementations are called from tokio's
/// blocking pool, so they may block the current thread.
pub trait HttpClient: Send + Sync {
    /// Performs a GET and buffers the whole body. Non-200 statuses are returned,
    /// not turned into errors.
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError>;

    /// Writes the body of a 200 response into a new file at `dest` and returns
    /// the number of bytes written. Any other status yields `FetchError::Http`
    /// and leaves no file behind. Fails if `dest` already exists.
    fn download_to(&self, request: &HttpRequest, dest: &Path) -> Result<u64, FetchError> {
        let response = self.get(request)?;
        if !response.is_ok() {
            return Err(FetchError::Http(response.status));
        }
        let mut file = create_new_file(dest)?;
        if let Err(e) = file.write_all(&response.body).and_then(|_| file.flush()) {
            drop(file);
            let _ = std::fs::remove_file(dest);
            return Err(FetchError::Io(e));
        }
        Ok(response.body.len() as u64)
    }
}

/// GET a JSON document; any status other than 200 is an error.
pub fn get_json<T: DeserializeOwned>(
    client: &dyn HttpClient,
    request: &HttpRequest,
) -> Result<T, FetchError> {
    let response = client.get(request)?;
    if !response.is_ok() {
        return Err(FetchError::Http(response.status));
    }
    response.json()
}

/// Opens `path` for writing, refusing to replace an existing file.
pub(crate) fn create_new_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fake::{FakeClient, FakeReply};

    #[test]
    fn request_builder_sets_fields() {
        let mut headers = HashMap::new();
        headers.insert("User-Agent".to_string(), "ua".to_string());
        let abort = AbortFlag::new();
        let req = HttpRequest::get("http://api.test/x")
            .with_headers(&headers)
            .with_timeout(Duration::from_secs(5))
            .with_abort(abort.clone());
        assert_eq!(req.headers.get("User-Agent").map(String::as_str), Some("ua"));
        assert_eq!(req.timeout, Duration::from_secs(5));
        assert!(!req.is_aborted());
        abort.request();
        assert!(req.is_aborted());
    }

    #[test]
    fn get_json_rejects_non_200() {
        let client = FakeClient::new(|_| FakeReply::status(503));
        let err = get_json::<serde_json::Value>(&client, &HttpRequest::get("http://api.test/"))
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn default_download_writes_new_file_only_on_200() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeClient::new(|url| {
            if url.path() == "/ok.mp3" {
                FakeReply::bytes(b"audio".to_vec())
            } else {
                FakeReply::status(404)
            }
        });

        let ok = dir.path().join("ok.mp3");
        let n = client
            .download_to(&HttpRequest::get("http://cdn.test/ok.mp3"), &ok)
            .unwrap();
        assert_eq!(n, 5);
        assert_eq!(std::fs::read(&ok).unwrap(), b"audio");

        let again = client.download_to(&HttpRequest::get("http://cdn.test/ok.mp3"), &ok);
        assert!(matches!(again, Err(FetchError::Io(_))));
        assert_eq!(std::fs::read(&ok).unwrap(), b"audio");

        let missing = dir.path().join("missing.mp3");
        let err = client
            .download_to(&HttpRequest::get("http://cdn.test/missing.mp3"), &missing)
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(!missing.exists());
    }
}
