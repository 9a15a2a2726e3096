//! Two-phase pairing handshake
//!
//! ```text
//! Unpaired --request--> Requested --grant--> Paired
//!     \                     |
//!      \---- rejected ---> Failed  (left by issuing a new request)
//! ```
//!
//! Network failures never move the state; only an answer from the
//! television (or an unconfirmed send) does.

use crate::error::{RemoteError, Result};
use crate::identity::DeviceIdentity;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const PAIR_REQUEST_PATH: &str = "/1/pair/request";
pub const PAIR_GRANT_PATH: &str = "/1/pair/grant";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingState {
    Unpaired,
    Requested,
    Paired,
    Failed,
}

impl PairingState {
    /// State implied by what is already persisted
    pub fn from_auth_key(auth_key: &str) -> Self {
        if auth_key.is_empty() {
            PairingState::Unpaired
        } else {
            PairingState::Requested
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PairingState::Unpaired => "unpaired",
            PairingState::Requested => "requested",
            PairingState::Paired => "paired",
            PairingState::Failed => "failed",
        }
    }
}

/// Phase of the handshake, used to pick transitions and labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingPhase {
    Request,
    Grant,
}

impl PairingPhase {
    pub fn path(self) -> &'static str {
        match self {
            PairingPhase::Request => PAIR_REQUEST_PATH,
            PairingPhase::Grant => PAIR_GRANT_PATH,
        }
    }

    pub fn send_message(self) -> &'static str {
        match self {
            PairingPhase::Request => "Requesting pairing",
            PairingPhase::Grant => "Confirming pairing code",
        }
    }

    pub fn success_label(self, opaque: bool) -> &'static str {
        match (self, opaque) {
            (PairingPhase::Request, false) => "Pairing requested",
            (PairingPhase::Request, true) => "Pairing request sent (unconfirmed)",
            (PairingPhase::Grant, false) => "Paired",
            (PairingPhase::Grant, true) => "Pairing code sent (unconfirmed)",
        }
    }

    pub fn failure_label(self) -> &'static str {
        match self {
            PairingPhase::Request => "Pairing request failed",
            PairingPhase::Grant => "Pairing failed",
        }
    }

    /// State after the television accepted (or may have accepted) the call
    pub fn advanced_state(self) -> PairingState {
        match self {
            PairingPhase::Request => PairingState::Requested,
            PairingPhase::Grant => PairingState::Paired,
        }
    }
}

pub fn request_body(device: &DeviceIdentity) -> Value {
    json!({ "device": device })
}

pub fn grant_body(auth_key: &str, device: &DeviceIdentity, pin: &str) -> Value {
    json!({
        "auth": auth_key,
        "device": device,
        "pin": pin,
    })
}

/// Reject blank pairing codes before anything is sent
pub fn validate_pin(pin: &str) -> Result<&str> {
    let pin = pin.trim();
    if pin.is_empty() {
        return Err(RemoteError::EmptyPairingCode);
    }
    Ok(pin)
}

#[derive(Deserialize)]
struct PairRequestResponse {
    #[serde(default)]
    auth_key: Option<String>,
}

/// Pull `auth_key` out of a pair-request response.
///
/// A missing field, a `null`, or a body that is not JSON all yield the empty
/// string rather than an error.
pub fn extract_auth_key(body: &str) -> String {
    match serde_json::from_str::<PairRequestResponse>(body) {
        Ok(resp) => resp.auth_key.unwrap_or_default(),
        Err(e) => {
            tracing::debug!("Pair request body is not the expected JSON: {}", e);
            String::new()
        },
    }
}
