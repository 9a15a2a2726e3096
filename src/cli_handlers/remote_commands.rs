use crate::cli::{PairCommands, TargetArgs};
use crate::commands::{is_known_key, Command, KNOWN_KEYS};
use crate::error::Result;
use crate::identity::DeviceIdentity;
use crate::remote::{Outcome, RemoteClient};
use crate::settings::{mask_value, settings_db_path, SettingsStore, SqliteSettings, AUTH_KEY_KEY};
use crate::transport::{HttpTransport, Transport};
use serde_json::json;

/// Open a client backed by the real HTTP transport and persisted settings
pub async fn open_client(target: &TargetArgs) -> Result<RemoteClient<HttpTransport, SqliteSettings>> {
    let settings = SqliteSettings::open_default().await?;
    let client = RemoteClient::open(HttpTransport::new()?, settings)
        .await?
        .with_relay_base(target.relay.as_str());
    Ok(client)
}

pub async fn handle_command(command: Command, target: &TargetArgs) -> Result<()> {
    if let Command::Key(key) = &command {
        if !is_known_key(key) {
            tracing::warn!("'{}' is not a well-known key code; sending anyway", key);
        }
    }

    let client = open_client(target).await?;
    let outcome = client
        .dispatch(&target.transport_config(), command)
        .await;
    print_report(&client, &outcome, &target.format).await?;
    outcome.into_result()
}

pub async fn handle_pair_command(cmd: PairCommands) -> Result<()> {
    match cmd {
        PairCommands::Request { target } => {
            let client = open_client(&target).await?;
            let outcome = client.request_pairing(&target.transport_config()).await;
            print_report(&client, &outcome, &target.format).await?;
            outcome.into_result()
        },
        PairCommands::Grant { pin, target } => {
            let client = open_client(&target).await?;
            let outcome = client
                .confirm_pairing(&target.transport_config(), &pin)
                .await;
            print_report(&client, &outcome, &target.format).await?;
            outcome.into_result()
        },
    }
}

pub async fn handle_identity_command(format: &str) -> Result<()> {
    let settings = SqliteSettings::open_default().await?;
    let identity = DeviceIdentity::load_or_create(&settings).await?;
    let auth_key = settings.get(AUTH_KEY_KEY).await?.unwrap_or_default();
    let masked = mask_value(&auth_key);

    if format == "json" {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "device": identity,
                "auth_key": masked,
                "paired": !auth_key.is_empty(),
                "settings": settings_db_path()?.display().to_string(),
            }))?
        );
    } else {
        println!("Device ID:   {}", identity.device_id);
        println!("Device name: {}", identity.device_name);
        println!("OS:          {}", identity.device_os);
        println!("App:         {} [{}]", identity.app_name, identity.app_id);
        if auth_key.is_empty() {
            println!("Auth key:    (not set)");
        } else {
            println!("Auth key:    {}", masked);
        }
    }

    Ok(())
}

pub fn handle_keys_command(format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(KNOWN_KEYS)?);
    } else {
        for key in KNOWN_KEYS {
            println!("{}", key);
        }
    }
    Ok(())
}

/// Print status line and activity log after an operation
async fn print_report<T: Transport, S: SettingsStore>(
    client: &RemoteClient<T, S>,
    outcome: &Outcome,
    format: &str,
) -> Result<()> {
    let status = client.status().await;
    let entries = client.log_entries().await;

    if format == "json" {
        let log: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| json!({ "message": e.message, "timestamp": e.timestamp.to_rfc3339() }))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "outcome": outcome.kind(),
                "status": status,
                "pairing_state": client.pairing_state().await,
                "log": log,
            }))?
        );
    } else {
        let badge = if status.ok { "✓" } else { "✗" };
        println!("{} {}", badge, status.label);
        for entry in &entries {
            println!("  [{}] {}", entry.display_time(), entry.message);
        }
    }

    Ok(())
}
