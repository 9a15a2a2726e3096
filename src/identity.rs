use crate::error::Result;
use crate::settings::{SettingsStore, DEVICE_ID_KEY};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DEVICE_NAME: &str = "tv-remote";
pub const DEFAULT_APP_NAME: &str = "TV Remote";
pub const DEFAULT_APP_ID: &str = "org.tvremote.cli";
pub const DEFAULT_DEVICE_TYPE: &str = "native";
/// Reported OS version; the host's release is not probed
pub const DEFAULT_OS_VERSION: &str = "unknown";

/// Descriptor this remote presents to the television when pairing.
///
/// Only `device_id` is persisted; the remaining fields are derived from the
/// build and host platform every time the identity is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub device_id: String,
    pub device_name: String,
    pub device_os: String,
    pub device_os_version: String,
    pub app_name: String,
    pub app_id: String,
    #[serde(rename = "type")]
    pub device_type: String,
}

impl DeviceIdentity {
    pub fn with_id(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            device_os: std::env::consts::OS.to_string(),
            device_os_version: DEFAULT_OS_VERSION.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            app_id: DEFAULT_APP_ID.to_string(),
            device_type: DEFAULT_DEVICE_TYPE.to_string(),
        }
    }

    /// Load the identity, generating and persisting a device id on first use
    pub async fn load_or_create<S: SettingsStore>(store: &S) -> Result<Self> {
        let device_id = store
            .get_or_insert_with(DEVICE_ID_KEY, generate_device_id)
            .await?;
        Ok(Self::with_id(device_id))
    }
}

/// Random v4 UUID in hyphenated form
pub fn generate_device_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .hyphenated()
        .to_string()
}
