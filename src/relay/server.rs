use super::{proxy, static_files};
use anyhow::{Context, Result};
use axum::{routing::any, Router};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Relay port when neither `--port` nor `PORT` is given
pub const DEFAULT_RELAY_PORT: u16 = 8000;

/// Environment variable overriding the relay port
pub const PORT_ENV_VAR: &str = "PORT";

/// Relay state shared across handlers
#[derive(Clone)]
pub struct RelayState {
    pub client: reqwest::Client,
    pub static_root: PathBuf,
}

impl RelayState {
    pub fn new(static_root: PathBuf) -> Result<Self> {
        // Upstream redirects go back to the caller untouched.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self {
            client,
            static_root,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: String,
    pub port: u16,
    pub static_root: PathBuf,
}

impl RelayConfig {
    /// Port from `PORT` (falling back to 8000), static files from `./static`
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var(PORT_ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => value
                .trim()
                .parse()
                .with_context(|| format!("Invalid {} value: {}", PORT_ENV_VAR, value))?,
            _ => DEFAULT_RELAY_PORT,
        };

        let static_root = std::env::current_dir()
            .context("Failed to read current directory")?
            .join("static");

        Ok(Self {
            bind: "127.0.0.1".to_string(),
            port,
            static_root,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Relay server instance
pub struct RelayServer {
    config: RelayConfig,
}

impl RelayServer {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    /// Bind and run until the process is stopped
    pub async fn run(self) -> Result<()> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        tracing::info!("Relay listening on http://{}", addr);
        tracing::info!("Static root: {}", self.config.static_root.display());

        let state = RelayState::new(self.config.static_root)?;
        serve(listener, state).await
    }
}

/// Serve the relay on an already-bound listener
pub async fn serve(listener: TcpListener, state: RelayState) -> Result<()> {
    let app = create_router(state);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Create the Axum router: `/api` forwarding plus static fallback
pub fn create_router(state: RelayState) -> Router {
    Router::new()
        .route("/api", any(proxy::handle))
        .route("/api/", any(proxy::handle))
        .route("/api/*rest", any(proxy::handle))
        .fallback(static_files::serve)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
