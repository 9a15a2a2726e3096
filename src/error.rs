use serde::Serialize;
use thiserror::Error;

/// Hint appended to every network-level failure shown to the operator
pub const REMEDIATION_HINT: &str = "Try no-cors mode or a local proxy.";

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Pairing code is required")]
    EmptyPairingCode,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("{0}")]
    Network(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    OtherError(#[from] anyhow::Error),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl RemoteError {
    pub fn to_error_code(&self) -> &'static str {
        match self {
            RemoteError::DatabaseError(_) => "DATABASE_ERROR",
            RemoteError::EmptyPairingCode => "EMPTY_PAIRING_CODE",
            RemoteError::InvalidInput(_) => "INVALID_INPUT",
            RemoteError::HttpStatus(_) => "HTTP_STATUS",
            RemoteError::Network(_) => "NETWORK_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: self.to_error_code().to_string(),
        }
    }

    /// Operator-facing text for the activity log.
    ///
    /// Transport failures (status codes and network errors) carry the
    /// remediation hint; local validation failures do not.
    pub fn log_message(&self) -> String {
        match self {
            RemoteError::HttpStatus(_) | RemoteError::Network(_) => {
                format!("Error: {}. {}", self, REMEDIATION_HINT)
            },
            _ => format!("Error: {}", self),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RemoteError>;
