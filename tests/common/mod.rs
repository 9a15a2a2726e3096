//! Common utilities for integration tests
//!
//! Provides the `tvr` binary lookup plus an in-process fake television that
//! records every request it receives.

#![allow(dead_code)] // Not every test file uses every helper

use assert_cmd::Command;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tv_remote::relay::{self, RelayState};

/// Get the path to the `tvr` binary
///
/// Checks `CARGO_BIN_EXE_tvr` first (custom target directories in CI) and
/// falls back to `cargo_bin()` for local runs.
#[allow(deprecated)] // cargo_bin() is deprecated but needed for fallback
pub fn tvr_binary() -> PathBuf {
    std::env::var("CARGO_BIN_EXE_tvr")
        .map(PathBuf::from)
        .unwrap_or_else(|_| assert_cmd::cargo::cargo_bin("tvr"))
}

/// Create a Command for `tvr` with its settings isolated under `home`
pub fn tvr_command(home: &Path) -> Command {
    let mut cmd = Command::new(tvr_binary());
    cmd.env("TV_REMOTE_HOME", home)
        .env("HOME", "/nonexistent")
        .env_remove("RUST_LOG");
    cmd
}

/// One request as seen by the fake television
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path_and_query: String,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct FakeTvState {
    status: StatusCode,
    reply: String,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

/// Fake television answering every request with a fixed status and body
pub struct FakeTv {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeTv {
    pub async fn start(status: u16, reply: &str) -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = FakeTvState {
            status: StatusCode::from_u16(status).unwrap(),
            reply: reply.to_string(),
            seen: seen.clone(),
        };
        let app = Router::new().fallback(record).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, seen }
    }

    pub fn port(&self) -> String {
        self.addr.port().to_string()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

async fn record(
    State(state): State<FakeTvState>,
    method: axum::http::Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state.seen.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path_and_query: uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default(),
        content_type: headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&body).to_string(),
    });

    (
        state.status,
        [("content-type", "application/json")],
        state.reply.clone(),
    )
}

/// Start a relay on an ephemeral port and return its base URL
pub async fn start_relay(static_root: &Path) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = RelayState::new(static_root.to_path_buf()).unwrap();
    tokio::spawn(async move {
        relay::server::serve(listener, state).await.unwrap();
    });
    format!("http://{}", addr)
}

/// An address nothing is listening on
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
