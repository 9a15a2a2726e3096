//! Transport selection and the HTTP exchange with the television
//!
//! Every outbound call goes through [`resolve`], which turns the current
//! [`TransportConfig`] plus a logical API path into a concrete URL and a
//! [`FetchMode`]. The mode decides whether the caller may look at the
//! response at all:
//!
//! - `Cors`: direct request, status and body readable
//! - `NoCors`: direct request, response is opaque
//! - `SameOrigin`: through the relay, readable; the real target travels in
//!   the `X-TV-IP` / `X-TV-PORT` headers

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;

/// Default JointSpace API port
pub const DEFAULT_TV_PORT: &str = "1925";

/// Relay origin used when proxy mode is on and nothing else is configured
pub const DEFAULT_RELAY_BASE: &str = "http://localhost:8000";

/// Out-of-band routing header carrying the television's address
pub const TV_IP_HEADER: &str = "x-tv-ip";

/// Out-of-band routing header carrying the television's port
pub const TV_PORT_HEADER: &str = "x-tv-port";

/// Path prefix under which the relay forwards requests
pub const RELAY_API_PREFIX: &str = "/api";

/// Operator-supplied connection settings for a single call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportConfig {
    pub host: String,
    pub port: String,
    /// Bypass cross-origin checks with an opaque no-cors request
    pub cors_mode: bool,
    /// Route through the same-origin relay
    pub proxy_mode: bool,
}

impl TransportConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into().trim().to_string(),
            port: DEFAULT_TV_PORT.to_string(),
            cors_mode: false,
            proxy_mode: false,
        }
    }

    /// Blank ports fall back to [`DEFAULT_TV_PORT`]
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        let port = port.into();
        let port = port.trim();
        self.port = if port.is_empty() {
            DEFAULT_TV_PORT.to_string()
        } else {
            port.to_string()
        };
        self
    }

    pub fn with_cors_mode(mut self, enabled: bool) -> Self {
        self.cors_mode = enabled;
        self
    }

    pub fn with_proxy_mode(mut self, enabled: bool) -> Self {
        self.proxy_mode = enabled;
        self
    }
}

/// How the request is issued and whether its response can be inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMode {
    Cors,
    NoCors,
    SameOrigin,
}

impl FetchMode {
    pub fn is_readable(self) -> bool {
        !matches!(self, FetchMode::NoCors)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FetchMode::Cors => "cors",
            FetchMode::NoCors => "no-cors",
            FetchMode::SameOrigin => "same-origin",
        }
    }
}

/// Real target of a relayed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayRoute {
    pub host: String,
    pub port: String,
}

/// Result of transport selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    pub url: String,
    pub mode: FetchMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RelayRoute>,
}

/// `http://{host}:{port}` origin; IPv6 literals are bracketed
pub fn http_origin(host: &str, port: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("http://[{}]:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    }
}

/// Pick URL and fetch mode for `path`. Proxy mode wins over no-cors.
pub fn resolve(config: &TransportConfig, relay_base: &str, path: &str) -> Destination {
    if config.proxy_mode {
        return Destination {
            url: format!(
                "{}{}{}",
                relay_base.trim_end_matches('/'),
                RELAY_API_PREFIX,
                path
            ),
            mode: FetchMode::SameOrigin,
            route: Some(RelayRoute {
                host: config.host.clone(),
                port: config.port.clone(),
            }),
        };
    }

    Destination {
        url: format!("{}{}", http_origin(&config.host, &config.port), path),
        mode: if config.cors_mode {
            FetchMode::NoCors
        } else {
            FetchMode::Cors
        },
        route: None,
    }
}

/// A JSON POST ready to hand to a [`Transport`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundRequest {
    pub destination: Destination,
    pub body: Value,
}

/// What came back from the television, as far as the fetch mode allows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportResponse {
    Readable { status: u16, body: String },
    Opaque,
}

impl TransportResponse {
    /// Mirrors the fetch `ok` flag: 200..=299
    pub fn is_ok(&self) -> Option<bool> {
        match self {
            TransportResponse::Readable { status, .. } => Some((200..300).contains(status)),
            TransportResponse::Opaque => None,
        }
    }
}

/// Performs the actual HTTP exchange.
///
/// Implementations must fail only for network-level problems; non-success
/// statuses are reported through [`TransportResponse::Readable`].
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: OutboundRequest,
    ) -> impl Future<Output = Result<TransportResponse>> + Send;
}

/// reqwest-backed transport
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse> {
        let OutboundRequest { destination, body } = request;

        let mut builder = self.client.post(&destination.url).json(&body);
        if let Some(route) = &destination.route {
            builder = builder
                .header(TV_IP_HEADER, route.host.as_str())
                .header(TV_PORT_HEADER, route.port.as_str());
        }

        tracing::debug!(
            url = %destination.url,
            mode = destination.mode.as_str(),
            "Sending request"
        );
        let response = builder.send().await?;

        if !destination.mode.is_readable() {
            return Ok(TransportResponse::Opaque);
        }

        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(status, "Received response");
        Ok(TransportResponse::Readable { status, body })
    }
}
