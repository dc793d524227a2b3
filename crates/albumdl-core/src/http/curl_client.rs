//! libcurl-backed [`HttpClient`].
//!
//! Each call builds a fresh `Easy` handle, follows redirects, and applies the
//! request's timeouts and headers. Runs in the current thread; callers reach it
//! through `spawn_blocking`.

use curl::easy::{Easy, List};
use std::cell::Cell;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str;

use super::{create_new_file, FetchError, HttpClient, HttpRequest, HttpResponse};

/// Stateless libcurl client.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlClient;

impl CurlClient {
    pub fn new() -> Self {
        Self
    }
}

fn prepare(request: &HttpRequest) -> Result<Easy, FetchError> {
    let mut easy = Easy::new();
    easy.url(&request.url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(request.connect_timeout)?;
    easy.timeout(request.timeout)?;
    // Empty string: accept every encoding libcurl can decode.
    easy.accept_encoding("")?;

    let mut list = List::new();
    for (k, v) in &request.headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if !request.headers.is_empty() {
        easy.http_headers(list)?;
    }
    if request.abort.is_some() {
        easy.progress(true)?;
    }
    Ok(easy)
}

/// A perform error caused by the abort flag is reported as `Cancelled`.
fn perform_error(e: curl::Error, request: &HttpRequest) -> FetchError {
    if e.is_aborted_by_callback() && request.is_aborted() {
        FetchError::Cancelled
    } else {
        FetchError::Curl(e)
    }
}

/// Status code from an HTTP status line (`HTTP/1.1 404 Not Found`).
fn parse_status_line(data: &[u8]) -> Option<u32> {
    let line = str::from_utf8(data).ok()?.trim();
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

fn discard_partial(file: Option<File>, dest: &Path) {
    if let Some(file) = file {
        drop(file);
        if let Err(e) = std::fs::remove_file(dest) {
            tracing::warn!(path = %dest.display(), "could not remove partial file: {}", e);
        }
    }
}

impl HttpClient for CurlClient {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        let mut easy = prepare(request)?;
        let mut body = Vec::new();

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            if let Some(abort) = request.abort.as_ref() {
                transfer.progress_function(|_, _, _, _| !abort.is_set())?;
            }
            transfer
                .perform()
                .map_err(|e| perform_error(e, request))?;
        }

        let status = easy.response_code()?;
        tracing::debug!(url = %request.url, status, bytes = body.len(), "GET");
        Ok(HttpResponse { status, body })
    }

    /// Streams the body straight to disk. The file is created lazily on the
    /// first body chunk of a 200 response, so error pages never touch disk.
    fn download_to(&self, request: &HttpRequest, dest: &Path) -> Result<u64, FetchError> {
        let mut easy = prepare(request)?;
        let status = Cell::new(0u32);
        let mut file: Option<File> = None;
        let mut written = 0u64;
        let mut write_error: Option<std::io::Error> = None;

        let performed = {
            let mut transfer = easy.transfer();
            // With redirects several status lines arrive; the last one wins.
            transfer.header_function(|data| {
                if let Some(code) = parse_status_line(data) {
                    status.set(code);
                }
                true
            })?;
            transfer.write_function(|data| {
                if status.get() != 200 {
                    return Ok(data.len());
                }
                if file.is_none() {
                    match create_new_file(dest) {
                        Ok(f) => file = Some(f),
                        Err(e) => {
                            write_error = Some(e);
                            return Ok(0); // abort transfer
                        }
                    }
                }
                let Some(f) = file.as_mut() else {
                    return Ok(0);
                };
                match f.write_all(data) {
                    Ok(()) => {
                        written += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        write_error = Some(e);
                        Ok(0)
                    }
                }
            })?;
            if let Some(abort) = request.abort.as_ref() {
                transfer.progress_function(|_, _, _, _| !abort.is_set())?;
            }
            transfer.perform()
        };

        if let Some(e) = write_error {
            discard_partial(file, dest);
            return Err(FetchError::Io(e));
        }
        if let Err(e) = performed {
            discard_partial(file, dest);
            return Err(perform_error(e, request));
        }

        let code = easy.response_code()?;
        if code != 200 {
            discard_partial(file, dest);
            return Err(FetchError::Http(code));
        }

        // A 200 with an empty body still produces an (empty) file.
        let mut file = match file {
            Some(f) => f,
            None => create_new_file(dest)?,
        };
        if let Err(e) = file.flush() {
            discard_partial(Some(file), dest);
            return Err(FetchError::Io(e));
        }
        tracing::debug!(url = %request.url, path = %dest.display(), bytes = written, "downloaded");
        Ok(written)
    }
}
