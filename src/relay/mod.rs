//! Same-origin relay
//!
//! Forwards `/api/*` to the television named in the `X-TV-IP` header and
//! serves the remote's static files for everything else. Holds no
//! configuration about the television itself.

pub mod proxy;
pub mod server;
pub mod static_files;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

pub use server::{create_router, RelayConfig, RelayServer, RelayState};

/// Failures the relay answers locally, always as JSON
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Missing X-TV-IP header.")]
    MissingTarget,

    #[error("Proxy error")]
    Upstream(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,
}

#[derive(Serialize)]
struct RelayErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingTarget => StatusCode::BAD_REQUEST,
            RelayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            RelayError::Forbidden => StatusCode::FORBIDDEN,
            RelayError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let detail = match &self {
            RelayError::Upstream(detail) => Some(detail.clone()),
            _ => None,
        };
        let body = RelayErrorBody {
            error: self.to_string(),
            detail,
        };
        (self.status_code(), Json(body)).into_response()
    }
}
