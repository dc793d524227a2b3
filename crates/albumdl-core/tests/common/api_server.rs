//! Minimal HTTP/1.1 server that imitates the album API for integration tests.
//!
//! Serves album info and listing pages on `/list`, track metadata on
//! `/track`, and audio bodies on `/audio/<trackId>`. Every request target is
//! recorded so tests can count calls per endpoint.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::json;

#[derive(Debug, Clone)]
pub struct TrackFixture {
    pub id: u64,
    pub title: String,
    /// Status returned by `/track`; anything but 200 sends no body.
    pub metadata_status: u16,
    /// `/audio/<id>` reads the request and never answers.
    pub audio_stall: bool,
    /// Status returned by `/audio/<id>`; anything but 200 sends no body.
    pub audio_status: u16,
    pub audio: Vec<u8>,
}

impl TrackFixture {
    pub fn new(id: u64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            metadata_status: 200,
            audio_stall: false,
            audio_status: 200,
            audio: format!("audio of track {}", id).into_bytes(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlbumFixture {
    pub id: u64,
    pub title: String,
    pub tracks: Vec<TrackFixture>,
    /// Listing pages that answer 500.
    pub failing_pages: Vec<u64>,
}

impl AlbumFixture {
    /// Album with `count` tracks titled `Episode 1..=count`; track ids are
    /// `id * 1000 + n`.
    pub fn with_tracks(id: u64, title: &str, count: u64) -> Self {
        let tracks = (1..=count)
            .map(|n| TrackFixture::new(id * 1000 + n, &format!("Episode {}", n)))
            .collect();
        Self {
            id,
            title: title.to_string(),
            tracks,
            failing_pages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub query: HashMap<String, String>,
    pub user_agent: Option<String>,
}

struct State {
    albums: HashMap<u64, AlbumFixture>,
    tracks: HashMap<u64, TrackFixture>,
    base: String,
    log: Mutex<Vec<Recorded>>,
}

pub struct ApiServer {
    state: Arc<State>,
}

impl ApiServer {
    /// Starts a server in a background thread. It runs until the process exits.
    pub fn start(albums: Vec<AlbumFixture>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let tracks = albums
            .iter()
            .flat_map(|a| a.tracks.iter().cloned())
            .map(|t| (t.id, t))
            .collect();
        let state = Arc::new(State {
            albums: albums.into_iter().map(|a| (a.id, a)).collect(),
            tracks,
            base: format!("http://127.0.0.1:{}", port),
            log: Mutex::new(Vec::new()),
        });
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self { state }
    }

    pub fn listing_url(&self) -> String {
        format!("{}/list", self.state.base)
    }

    pub fn track_url(&self) -> String {
        format!("{}/track", self.state.base)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.log.lock().unwrap().clone()
    }

    /// Requests whose path starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .count()
    }
}

fn handle(mut stream: TcpStream, state: &State) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let Some(recorded) = parse_request(request) else {
        let _ = stream.write_all(b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n");
        return;
    };
    let stall = stalls(state, &recorded);
    let (status, body) = route(state, &recorded);
    state.log.lock().unwrap().push(recorded);
    if stall {
        // Hold the connection open without a response.
        thread::sleep(Duration::from_secs(30));
        return;
    }

    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Error",
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
}

fn stalls(state: &State, req: &Recorded) -> bool {
    req.path
        .strip_prefix("/audio/")
        .and_then(|id| id.parse::<u64>().ok())
        .and_then(|id| state.tracks.get(&id))
        .is_some_and(|t| t.audio_stall)
}

fn route(state: &State, req: &Recorded) -> (u16, Vec<u8>) {
    let num = |name: &str| req.query.get(name).and_then(|v| v.parse::<u64>().ok());
    match req.path.as_str() {
        "/list" => {
            let Some(album) = num("albumId").and_then(|id| state.albums.get(&id)) else {
                return (200, json!({"data": null}).to_string().into_bytes());
            };
            let page = num("pageNum").unwrap_or(0);
            let size = num("pageSize").unwrap_or(30).max(1);
            if size == 1 && page == 0 {
                let body = json!({"data": {
                    "albumId": album.id,
                    "trackTotalCount": album.tracks.len(),
                    "pageNum": 0,
                    "pageSize": 1,
                }});
                return (200, body.to_string().into_bytes());
            }
            if album.failing_pages.contains(&page) {
                return (500, b"upstream error".to_vec());
            }
            let tracks: Vec<_> = album
                .tracks
                .iter()
                .skip((page * size) as usize)
                .take(size as usize)
                .map(|t| json!({"trackId": t.id, "title": t.title, "albumTitle": album.title}))
                .collect();
            (200, json!({"data": {"tracks": tracks}}).to_string().into_bytes())
        }
        "/track" => match num("trackId").and_then(|id| state.tracks.get(&id)) {
            Some(track) if track.metadata_status != 200 => (track.metadata_status, Vec::new()),
            Some(track) => {
                let body = json!({
                    "title": track.title,
                    "playUrl64": format!("{}/audio/{}", state.base, track.id),
                });
                (200, body.to_string().into_bytes())
            }
            None => (404, Vec::new()),
        },
        path => {
            let track = path
                .strip_prefix("/audio/")
                .and_then(|id| id.parse::<u64>().ok())
                .and_then(|id| state.tracks.get(&id));
            match track {
                Some(t) if t.audio_status == 200 => (200, t.audio.clone()),
                Some(t) => (t.audio_status, Vec::new()),
                None => (404, Vec::new()),
            }
        }
    }
}

fn parse_request(request: &str) -> Option<Recorded> {
    let mut lines = request.lines();
    let target = lines.next()?.split_whitespace().nth(1)?;
    let url = url::Url::parse(&format!("http://localhost{}", target)).ok()?;
    let user_agent = lines
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("user-agent"))
        .map(|(_, value)| value.trim().to_string());
    Some(Recorded {
        path: url.path().to_string(),
        query: url.query_pairs().into_owned().collect(),
        user_agent,
    })
}
