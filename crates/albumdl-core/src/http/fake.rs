//! In-process `HttpClient` for unit tests: replies come from a routing closure.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{FetchError, HttpClient, HttpRequest, HttpResponse};

/// Canned reply for one request.
#[derive(Debug, Clone)]
pub(crate) struct FakeReply {
    pub status: u32,
    pub body: Vec<u8>,
    /// Sleep before answering (simulates a slow server).
    pub delay: Duration,
    /// Block until the request's abort flag is raised, then fail with `Cancelled`.
    pub hang_until_aborted: bool,
}

impl FakeReply {
    pub fn status(status: u32) -> Self {
        Self {
            status,
            body: Vec::new(),
            delay: Duration::ZERO,
            hang_until_aborted: false,
        }
    }

    pub fn bytes(body: Vec<u8>) -> Self {
        Self {
            body,
            ..Self::status(200)
        }
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self::bytes(value.to_string().into_bytes())
    }

    pub fn hang() -> Self {
        Self {
            hang_until_aborted: true,
            ..Self::status(200)
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Route = dyn Fn(&url::Url) -> FakeReply + Send + Sync;

pub(crate) struct FakeClient {
    route: Box<Route>,
    requests: Mutex<Vec<String>>,
    cancelled: AtomicUsize,
}

impl FakeClient {
    pub fn new(route: impl Fn(&url::Url) -> FakeReply + Send + Sync + 'static) -> Self {
        Self {
            route: Box::new(route),
            requests: Mutex::new(Vec::new()),
            cancelled: AtomicUsize::new(0),
        }
    }

    /// URLs requested so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Requests that observed their abort flag while hanging.
    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl HttpClient for FakeClient {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.url.clone());
        }
        let url = url::Url::parse(&request.url)?;
        let reply = (self.route)(&url);
        if reply.hang_until_aborted {
            let start = Instant::now();
            while start.elapsed() < Duration::from_secs(5) {
                if request.is_aborted() {
                    self.cancelled.fetch_add(1, Ordering::SeqCst);
                    return Err(FetchError::Cancelled);
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            return Err(FetchError::Worker("hang timed out".to_string()));
        }
        if !reply.delay.is_zero() {
            std::thread::sleep(reply.delay);
        }
        Ok(HttpResponse {
            status: reply.status,
            body: reply.body,
        })
    }
}

/// Value of query parameter `name`, if present.
pub(crate) fn query(url: &url::Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}
