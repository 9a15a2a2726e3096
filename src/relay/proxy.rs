//! `/api/*` forwarding
//!
//! Request and response bodies are piped chunk by chunk; neither side is
//! buffered in full.

use super::server::RelayState;
use super::RelayError;
use crate::transport::{
    http_origin, DEFAULT_TV_PORT, RELAY_API_PREFIX, TV_IP_HEADER, TV_PORT_HEADER,
};
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use futures_util::StreamExt;
use tokio::sync::mpsc;

pub const ALLOW_METHODS: &str = "GET,POST,OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type,X-TV-IP,X-TV-PORT";

/// Chunks buffered between the inbound body and the upstream request
const BODY_CHANNEL_CAPACITY: usize = 8;

/// Entry point for every method under `/api`
pub async fn handle(State(state): State<RelayState>, req: Request) -> Response {
    if req.method() == Method::OPTIONS {
        return preflight();
    }

    match forward(&state, req).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Relay request failed: {:?}", e);
            e.into_response()
        },
    }
}

/// Answer CORS pre-flight locally
pub fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
        ],
    )
        .into_response()
}

async fn forward(state: &RelayState, req: Request) -> Result<Response, RelayError> {
    let target = upstream_url(req.headers(), req.uri())?;
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    let (parts, body) = req.into_parts();
    tracing::debug!(method = %parts.method, target = %target, "Forwarding to TV");

    let upstream = state
        .client
        .request(parts.method, &target)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCEPT, "application/json")
        .body(pipe_body(body))
        .send()
        .await
        .map_err(|e| RelayError::Upstream(e.to_string()))?;

    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    tracing::debug!(status = status.as_u16(), target = %target, "Upstream answered");

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    Ok(response)
}

/// Build `http://{ip}:{port}{path without /api}{?query}` from the routing
/// headers. A missing or blank `X-TV-IP` is rejected.
pub fn upstream_url(headers: &HeaderMap, uri: &Uri) -> Result<String, RelayError> {
    let target_ip = header_value(headers, TV_IP_HEADER).ok_or(RelayError::MissingTarget)?;
    let target_port = header_value(headers, TV_PORT_HEADER).unwrap_or(DEFAULT_TV_PORT);

    let path = uri.path();
    let path = path.strip_prefix(RELAY_API_PREFIX).unwrap_or(path);
    let path = if path.is_empty() { "/" } else { path };

    let mut url = format!("{}{}", http_origin(target_ip, target_port), path);
    if let Some(query) = uri.query() {
        url.push('?');
        url.push_str(query);
    }
    Ok(url)
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Hand the inbound body to reqwest as a stream.
///
/// axum's body is not `Sync`, so a task pumps it through a bounded channel;
/// the channel bound keeps the client's backpressure intact.
fn pipe_body(body: Body) -> reqwest::Body {
    let (tx, mut rx) = mpsc::channel::<Result<Bytes, axum::Error>>(BODY_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut stream = body.into_data_stream();
        while let Some(chunk) = stream.next().await {
            if tx.send(chunk).await.is_err() {
                break;
            }
        }
    });

    reqwest::Body::wrap_stream(futures_util::stream::poll_fn(move |cx| rx.poll_recv(cx)))
}
