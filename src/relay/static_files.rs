use super::server::RelayState;
use super::RelayError;
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::path::{Path, PathBuf};

/// Content type used for any extension missing from [`content_type_for`]
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Serve a file below the static root; `/` maps to `/index.html`
pub async fn serve(State(state): State<RelayState>, uri: Uri) -> Response {
    let file_path = match resolve_path(&state.static_root, uri.path()) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(path = uri.path(), "Static request rejected: {}", e);
            return e.into_response();
        },
    };

    match tokio::fs::read(&file_path).await {
        Ok(data) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type_for(&file_path))],
            data,
        )
            .into_response(),
        Err(e) => {
            tracing::debug!(path = %file_path.display(), "Static file unavailable: {}", e);
            RelayError::NotFound.into_response()
        },
    }
}

/// Map a request path onto the filesystem below `root`.
///
/// The path is percent-decoded and normalized lexically; a `..` that would
/// climb above `root` yields [`RelayError::Forbidden`].
pub fn resolve_path(root: &Path, request_path: &str) -> Result<PathBuf, RelayError> {
    let decoded = urlencoding::decode(request_path).map_err(|_| RelayError::NotFound)?;
    let requested = if decoded == "/" {
        "/index.html"
    } else {
        &*decoded
    };

    let mut relative = PathBuf::new();
    for segment in requested.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if !relative.pop() {
                    return Err(RelayError::Forbidden);
                }
            },
            s if s.contains('\\') || s.contains('\0') || s.contains(':') => {
                return Err(RelayError::Forbidden);
            },
            s => relative.push(s),
        }
    }

    Ok(root.join(relative))
}

pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
