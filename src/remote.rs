//! Remote client: command dispatch and the pairing handshake
//!
//! Every public operation returns an [`Outcome`] instead of an error. Failures
//! are turned into a status update and an activity-log entry before the
//! operation returns, so nothing escapes as an unhandled error.

use crate::activity::{ActivityLog, ConnectionStatus, LogEntry};
use crate::commands::Command;
use crate::error::{RemoteError, Result};
use crate::identity::DeviceIdentity;
use crate::pairing::{self, PairingPhase, PairingState};
use crate::settings::{SettingsStore, AUTH_KEY_KEY};
use crate::transport::{
    self, OutboundRequest, Transport, TransportConfig, TransportResponse, DEFAULT_RELAY_BASE,
};
use serde_json::Value;
use tokio::sync::RwLock;

/// Answer the television gave to a readable request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Success,
    Failure { status: u16 },
}

/// Result of one client operation.
///
/// `Unconfirmed` is what an opaque (no-cors) request yields: it was sent,
/// but nothing about the answer can be known.
#[derive(Debug)]
pub enum Outcome {
    Confirmed(Confirmation),
    Unconfirmed,
    Failed(RemoteError),
}

impl Outcome {
    /// Whether the operator should treat the operation as having worked
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::Confirmed(Confirmation::Success) | Outcome::Unconfirmed
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Confirmed(Confirmation::Success) => "confirmed",
            Outcome::Confirmed(Confirmation::Failure { .. }) => "rejected",
            Outcome::Unconfirmed => "unconfirmed",
            Outcome::Failed(_) => "failed",
        }
    }

    /// Operator-facing description of a failure, if any
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Outcome::Confirmed(Confirmation::Failure { status }) => {
                Some(RemoteError::HttpStatus(*status).log_message())
            },
            Outcome::Failed(e) => Some(e.log_message()),
            _ => None,
        }
    }

    /// Collapse into a `Result`, keeping the opaque case a success
    pub fn into_result(self) -> Result<()> {
        match self {
            Outcome::Confirmed(Confirmation::Success) | Outcome::Unconfirmed => Ok(()),
            Outcome::Confirmed(Confirmation::Failure { status }) => {
                Err(RemoteError::HttpStatus(status))
            },
            Outcome::Failed(e) => Err(e),
        }
    }

    fn from_response(response: &TransportResponse) -> Self {
        match response {
            TransportResponse::Opaque => Outcome::Unconfirmed,
            TransportResponse::Readable { status, .. } if (200..300).contains(status) => {
                Outcome::Confirmed(Confirmation::Success)
            },
            TransportResponse::Readable { status, .. } => {
                Outcome::Confirmed(Confirmation::Failure { status: *status })
            },
        }
    }
}

/// Browser-remote equivalent: owns the transport, the persisted settings,
/// and the operator-visible status and log.
pub struct RemoteClient<T, S> {
    transport: T,
    settings: S,
    relay_base: String,
    status: RwLock<ConnectionStatus>,
    log: RwLock<ActivityLog>,
    pairing: RwLock<PairingState>,
}

impl<T: Transport, S: SettingsStore> RemoteClient<T, S> {
    /// Create a client, deriving the pairing state from any persisted auth key
    pub async fn open(transport: T, settings: S) -> Result<Self> {
        let auth_key = settings.get(AUTH_KEY_KEY).await?.unwrap_or_default();
        let mut log = ActivityLog::new();
        log.push("Remote ready. Connect to your TV.");

        Ok(Self {
            transport,
            settings,
            relay_base: DEFAULT_RELAY_BASE.to_string(),
            status: RwLock::new(ConnectionStatus::default()),
            log: RwLock::new(log),
            pairing: RwLock::new(PairingState::from_auth_key(&auth_key)),
        })
    }

    pub fn with_relay_base(mut self, relay_base: impl Into<String>) -> Self {
        self.relay_base = relay_base.into();
        self
    }

    pub fn relay_base(&self) -> &str {
        &self.relay_base
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.status.read().await.clone()
    }

    pub async fn pairing_state(&self) -> PairingState {
        *self.pairing.read().await
    }

    /// Activity log, newest first
    pub async fn log_entries(&self) -> Vec<LogEntry> {
        self.log.read().await.entries().cloned().collect()
    }

    pub async fn clear_log(&self) {
        self.log.write().await.clear();
    }

    pub async fn device_identity(&self) -> Result<DeviceIdentity> {
        DeviceIdentity::load_or_create(&self.settings).await
    }

    /// Persisted auth key, empty when none has been issued
    pub async fn auth_key(&self) -> Result<String> {
        Ok(self.settings.get(AUTH_KEY_KEY).await?.unwrap_or_default())
    }

    /// Record that the operator pointed the remote at a new television
    pub async fn update_target(&self, config: &TransportConfig) {
        self.set_status(ConnectionStatus::ok("Ready")).await;
        self.append_log(format!("Target updated: {}:{}", config.host, config.port))
            .await;
    }

    pub async fn send_key(&self, config: &TransportConfig, key: &str) -> Outcome {
        self.dispatch(config, Command::Key(key.to_string())).await
    }

    pub async fn launch_app(&self, config: &TransportConfig, action: &str) -> Outcome {
        self.dispatch(config, Command::Launch(action.to_string()))
            .await
    }

    /// Send a key press or launch intent. One log entry goes out at send
    /// time, at most one more on failure.
    pub async fn dispatch(&self, config: &TransportConfig, command: Command) -> Outcome {
        self.append_log(command.send_message()).await;

        let outcome = match self.exchange(config, command.path(), command.body()).await {
            Ok(response) => Outcome::from_response(&response),
            Err(e) => Outcome::Failed(e),
        };

        match &outcome {
            Outcome::Confirmed(Confirmation::Success) => {
                self.set_status(ConnectionStatus::ok(command.success_label(false)))
                    .await
            },
            Outcome::Unconfirmed => {
                self.set_status(ConnectionStatus::ok(command.success_label(true)))
                    .await
            },
            _ => self.report_failure(command.failure_label(), &outcome).await,
        }

        outcome
    }

    /// Pairing phase one: announce this device and store the issued auth key.
    ///
    /// Over an opaque transport the key cannot be read; the request is sent
    /// anyway, the stored key is left alone and the outcome is `Unconfirmed`.
    pub async fn request_pairing(&self, config: &TransportConfig) -> Outcome {
        let phase = PairingPhase::Request;
        let outcome = match self.try_request_pairing(config).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed(e),
        };
        self.finish_pairing_phase(phase, &outcome).await;
        outcome
    }

    /// Pairing phase two: send the code shown on the television.
    ///
    /// A blank code is rejected locally and never sent.
    pub async fn confirm_pairing(&self, config: &TransportConfig, pin: &str) -> Outcome {
        let phase = PairingPhase::Grant;
        let pin = match pairing::validate_pin(pin) {
            Ok(pin) => pin,
            Err(e) => {
                let outcome = Outcome::Failed(e);
                self.report_failure(phase.failure_label(), &outcome).await;
                return outcome;
            },
        };

        let outcome = match self.try_confirm_pairing(config, pin).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed(e),
        };
        self.finish_pairing_phase(phase, &outcome).await;
        outcome
    }

    async fn try_request_pairing(&self, config: &TransportConfig) -> Result<Outcome> {
        let device = self.device_identity().await?;
        self.append_log(PairingPhase::Request.send_message()).await;

        let response = self
            .exchange(config, PairingPhase::Request.path(), pairing::request_body(&device))
            .await?;
        let outcome = Outcome::from_response(&response);

        if let (Outcome::Confirmed(Confirmation::Success), TransportResponse::Readable { body, .. }) =
            (&outcome, &response)
        {
            let auth_key = pairing::extract_auth_key(body);
            if auth_key.is_empty() {
                tracing::warn!("Pairing response carried no auth_key");
            }
            self.settings.set(AUTH_KEY_KEY, &auth_key).await?;
        }

        Ok(outcome)
    }

    async fn try_confirm_pairing(&self, config: &TransportConfig, pin: &str) -> Result<Outcome> {
        let device = self.device_identity().await?;
        let auth_key = self.auth_key().await?;
        self.append_log(PairingPhase::Grant.send_message()).await;

        let response = self
            .exchange(
                config,
                PairingPhase::Grant.path(),
                pairing::grant_body(&auth_key, &device, pin),
            )
            .await?;
        Ok(Outcome::from_response(&response))
    }

    async fn finish_pairing_phase(&self, phase: PairingPhase, outcome: &Outcome) {
        match outcome {
            Outcome::Confirmed(Confirmation::Success) => {
                *self.pairing.write().await = phase.advanced_state();
                self.set_status(ConnectionStatus::ok(phase.success_label(false)))
                    .await;
            },
            Outcome::Unconfirmed => {
                *self.pairing.write().await = phase.advanced_state();
                self.set_status(ConnectionStatus::ok(phase.success_label(true)))
                    .await;
            },
            Outcome::Confirmed(Confirmation::Failure { .. }) => {
                *self.pairing.write().await = PairingState::Failed;
                self.report_failure(phase.failure_label(), outcome).await;
            },
            Outcome::Failed(_) => self.report_failure(phase.failure_label(), outcome).await,
        }
    }

    /// Resolve the destination for this call and hand it to the transport
    async fn exchange(
        &self,
        config: &TransportConfig,
        path: &str,
        body: Value,
    ) -> Result<TransportResponse> {
        if config.host.is_empty() {
            return Err(RemoteError::InvalidInput(
                "TV host is not set".to_string(),
            ));
        }

        let destination = transport::resolve(config, &self.relay_base, path);
        self.transport
            .send(OutboundRequest { destination, body })
            .await
    }

    async fn report_failure(&self, label: &str, outcome: &Outcome) {
        self.set_status(ConnectionStatus::error(label)).await;
        if let Some(message) = outcome.failure_message() {
            tracing::warn!(status = label, "{}", message);
            self.append_log(message).await;
        }
    }

    async fn set_status(&self, status: ConnectionStatus) {
        *self.status.write().await = status;
    }

    async fn append_log(&self, message: impl Into<String>) {
        self.log.write().await.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MemorySettings, DEVICE_ID_KEY};
    use crate::test_utils::test_helpers::MockTransport;
    use crate::transport::FetchMode;

    fn cors_config() -> TransportConfig {
        TransportConfig::new("10.0.0.5")
    }

    async fn client(transport: MockTransport) -> RemoteClient<MockTransport, MemorySettings> {
        RemoteClient::open(transport, MemorySettings::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_key_press_success() {
        let remote = client(MockTransport::readable(200, "")).await;
        let outcome = remote.send_key(&cors_config(), "VolumeUp").await;

        assert!(matches!(outcome, Outcome::Confirmed(Confirmation::Success)));
        assert_eq!(remote.status().await, ConnectionStatus::ok("Command sent"));

        let requests = remote.transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].destination.url, "http://10.0.0.5:1925/1/input/key");
        assert_eq!(requests[0].body["key"], "VolumeUp");
    }

    #[tokio::test]
    async fn test_key_press_http_500_reports_code() {
        let remote = client(MockTransport::readable(500, "boom")).await;
        let outcome = remote.send_key(&cors_config(), "Home").await;

        assert!(!outcome.is_success());
        assert!(outcome.failure_message().unwrap().contains("500"));
        assert_eq!(
            remote.status().await,
            ConnectionStatus::error("Failed to reach TV")
        );

        let messages: Vec<String> = remote
            .log_entries()
            .await
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Error: HTTP 500. Try no-cors mode or a local proxy.".to_string(),
                "Sending key: Home".to_string(),
                "Remote ready. Connect to your TV.".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_opaque_command_is_unconfirmed_success() {
        let remote = client(MockTransport::opaque()).await;
        let config = cors_config().with_cors_mode(true);
        let outcome = remote.launch_app(&config, "netflix").await;

        assert!(matches!(outcome, Outcome::Unconfirmed));
        assert!(outcome.is_success());
        assert_eq!(
            remote.status().await,
            ConnectionStatus::ok("App launched (no-cors)")
        );
        assert_eq!(
            remote.transport.requests()[0].destination.mode,
            FetchMode::NoCors
        );
    }

    #[tokio::test]
    async fn test_network_error_carries_hint() {
        let remote = client(MockTransport::failing("connection refused")).await;
        let outcome = remote.send_key(&cors_config(), "Mute").await;

        assert!(matches!(outcome, Outcome::Failed(RemoteError::Network(_))));
        let newest = remote.log_entries().await.remove(0).message;
        assert_eq!(
            newest,
            "Error: connection refused. Try no-cors mode or a local proxy."
        );
    }

    #[tokio::test]
    async fn test_proxy_mode_routes_through_relay() {
        let remote = client(MockTransport::readable(200, ""))
            .await
            .with_relay_base("http://127.0.0.1:9000");
        let config = cors_config().with_port("1926").with_proxy_mode(true);
        remote.send_key(&config, "Back").await;

        let request = &remote.transport.requests()[0];
        assert_eq!(request.destination.url, "http://127.0.0.1:9000/api/1/input/key");
        let route = request.destination.route.as_ref().unwrap();
        assert_eq!(route.host, "10.0.0.5");
        assert_eq!(route.port, "1926");
    }

    #[tokio::test]
    async fn test_pair_request_persists_auth_key() {
        let remote = client(MockTransport::readable(200, r#"{"auth_key":"XYZ"}"#)).await;
        let outcome = remote.request_pairing(&cors_config()).await;

        assert!(outcome.is_success());
        assert_eq!(remote.auth_key().await.unwrap(), "XYZ");
        assert_eq!(remote.pairing_state().await, PairingState::Requested);

        let body = &remote.transport.requests()[0].body;
        let device_id = remote.settings().get(DEVICE_ID_KEY).await.unwrap().unwrap();
        assert_eq!(body["device"]["device_id"], device_id.as_str());
    }

    #[tokio::test]
    async fn test_pair_request_without_key_persists_empty_string() {
        let remote = client(MockTransport::readable(200, r#"{"timeout":30}"#)).await;
        remote
            .settings()
            .set(AUTH_KEY_KEY, "stale")
            .await
            .unwrap();

        let outcome = remote.request_pairing(&cors_config()).await;
        assert!(outcome.is_success());
        assert_eq!(
            remote.settings().get(AUTH_KEY_KEY).await.unwrap(),
            Some(String::new())
        );
    }

    #[tokio::test]
    async fn test_pair_request_opaque_leaves_key_untouched() {
        let remote = client(MockTransport::opaque()).await;
        remote.settings().set(AUTH_KEY_KEY, "kept").await.unwrap();

        let config = cors_config().with_cors_mode(true);
        let outcome = remote.request_pairing(&config).await;

        assert!(matches!(outcome, Outcome::Unconfirmed));
        assert_eq!(remote.auth_key().await.unwrap(), "kept");
        assert_eq!(
            remote.status().await,
            ConnectionStatus::ok("Pairing request sent (unconfirmed)")
        );
    }

    #[tokio::test]
    async fn test_pair_request_rejected_moves_to_failed() {
        let remote = client(MockTransport::readable(403, "")).await;
        let outcome = remote.request_pairing(&cors_config()).await;

        assert!(matches!(
            outcome,
            Outcome::Confirmed(Confirmation::Failure { status: 403 })
        ));
        assert_eq!(remote.pairing_state().await, PairingState::Failed);
        assert_eq!(remote.auth_key().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_pair_request_network_failure_keeps_state_and_key() {
        let remote = client(MockTransport::failing("connection refused")).await;

        let outcome = remote.request_pairing(&cors_config()).await;

        assert!(matches!(outcome, Outcome::Failed(RemoteError::Network(_))));
        assert_eq!(remote.pairing_state().await, PairingState::Unpaired);
        assert_eq!(remote.auth_key().await.unwrap(), "");
        assert_eq!(
            remote.status().await,
            ConnectionStatus::error("Pairing request failed")
        );
        assert_eq!(remote.transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_pair_request_network_failure_keeps_existing_key() {
        let settings = MemorySettings::new();
        settings.set(AUTH_KEY_KEY, "kept").await.unwrap();
        let remote = RemoteClient::open(MockTransport::failing("timed out"), settings)
            .await
            .unwrap();

        remote.request_pairing(&cors_config()).await;

        assert_eq!(remote.pairing_state().await, PairingState::Requested);
        assert_eq!(remote.auth_key().await.unwrap(), "kept");
    }

    #[tokio::test]
    async fn test_opaque_confirm_is_unconfirmed_and_paired() {
        let remote = client(MockTransport::opaque()).await;
        remote.settings().set(AUTH_KEY_KEY, "XYZ").await.unwrap();
        let config = cors_config().with_cors_mode(true);

        let outcome = remote.confirm_pairing(&config, "1234").await;

        assert!(matches!(outcome, Outcome::Unconfirmed));
        assert!(outcome.is_success());
        assert_eq!(remote.pairing_state().await, PairingState::Paired);
        assert_eq!(
            remote.status().await,
            ConnectionStatus::ok("Pairing code sent (unconfirmed)")
        );
        assert_eq!(
            remote.transport.requests()[0].destination.mode,
            FetchMode::NoCors
        );
    }

    #[tokio::test]
    async fn test_rejected_confirm_moves_to_failed() {
        let remote = client(MockTransport::readable(401, "")).await;
        remote.settings().set(AUTH_KEY_KEY, "XYZ").await.unwrap();

        let outcome = remote.confirm_pairing(&cors_config(), "9999").await;

        assert!(matches!(
            outcome,
            Outcome::Confirmed(Confirmation::Failure { status: 401 })
        ));
        assert_eq!(remote.pairing_state().await, PairingState::Failed);
        assert_eq!(remote.status().await, ConnectionStatus::error("Pairing failed"));
        assert_eq!(
            remote.log_entries().await[0].message,
            "Error: HTTP 401. Try no-cors mode or a local proxy."
        );
        assert_eq!(remote.auth_key().await.unwrap(), "XYZ");
    }

    #[tokio::test]
    async fn test_confirm_rejects_empty_pin_without_network() {
        let remote = client(MockTransport::readable(200, "")).await;
        let outcome = remote.confirm_pairing(&cors_config(), "  ").await;

        assert!(matches!(
            outcome,
            Outcome::Failed(RemoteError::EmptyPairingCode)
        ));
        assert_eq!(remote.transport.call_count(), 0);
        assert_eq!(remote.pairing_state().await, PairingState::Unpaired);
    }

    #[tokio::test]
    async fn test_confirm_sends_auth_device_and_pin() {
        let remote = client(MockTransport::readable(200, "")).await;
        remote.settings().set(AUTH_KEY_KEY, "XYZ").await.unwrap();

        let outcome = remote.confirm_pairing(&cors_config(), "1234").await;
        assert!(outcome.is_success());
        assert_eq!(remote.pairing_state().await, PairingState::Paired);
        assert_eq!(remote.status().await, ConnectionStatus::ok("Paired"));

        let request = &remote.transport.requests()[0];
        assert_eq!(request.destination.url, "http://10.0.0.5:1925/1/pair/grant");
        assert_eq!(request.body["auth"], "XYZ");
        assert_eq!(request.body["pin"], "1234");
        assert!(request.body["device"]["device_id"].is_string());
    }

    #[tokio::test]
    async fn test_failed_confirm_keeps_requested_progress() {
        let transport = MockTransport::scripted(vec![
            Ok(TransportResponse::Readable {
                status: 200,
                body: r#"{"auth_key":"K"}"#.to_string(),
            }),
            Err(RemoteError::Network("timed out".to_string())),
        ]);
        let remote = client(transport).await;

        remote.request_pairing(&cors_config()).await;
        assert_eq!(remote.pairing_state().await, PairingState::Requested);

        let outcome = remote.confirm_pairing(&cors_config(), "0000").await;
        assert!(matches!(outcome, Outcome::Failed(_)));
        assert_eq!(remote.pairing_state().await, PairingState::Requested);
        assert_eq!(remote.auth_key().await.unwrap(), "K");
        assert!(!remote.status().await.ok);
    }

    #[tokio::test]
    async fn test_open_restores_requested_state() {
        let settings = MemorySettings::new();
        settings.set(AUTH_KEY_KEY, "persisted").await.unwrap();
        let remote = RemoteClient::open(MockTransport::opaque(), settings)
            .await
            .unwrap();
        assert_eq!(remote.pairing_state().await, PairingState::Requested);
    }

    #[tokio::test]
    async fn test_missing_host_is_local_error() {
        let remote = client(MockTransport::readable(200, "")).await;
        let outcome = remote.send_key(&TransportConfig::new("  "), "Home").await;

        assert!(matches!(outcome, Outcome::Failed(RemoteError::InvalidInput(_))));
        assert_eq!(remote.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_update_target_and_clear_log() {
        let remote = client(MockTransport::opaque()).await;
        remote
            .update_target(&TransportConfig::new("10.0.0.9"))
            .await;
        assert_eq!(remote.status().await, ConnectionStatus::ok("Ready"));
        assert_eq!(
            remote.log_entries().await[0].message,
            "Target updated: 10.0.0.9:1925"
        );

        remote.clear_log().await;
        assert!(remote.log_entries().await.is_empty());
    }
}
