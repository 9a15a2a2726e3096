//! Persisted key-value settings
//!
//! The remote keeps exactly two scalar values between sessions: the device
//! identifier and the auth key issued by the television. Both live behind
//! [`SettingsStore`] so tests can substitute [`MemorySettings`] for the
//! SQLite-backed store used by the CLI.

use crate::db::{create_pool, run_migrations};
use crate::error::{RemoteError, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Key under which the stable device identifier is stored
pub const DEVICE_ID_KEY: &str = "device_id";

/// Key under which the auth key from the last pairing request is stored
pub const AUTH_KEY_KEY: &str = "auth_key";

/// Overrides the directory holding `settings.db`
pub const HOME_ENV_VAR: &str = "TV_REMOTE_HOME";

/// Minimal key-value store for persisted scalars
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Return the stored value, or store and return `init()` if the key is
    /// absent or empty. `init` runs at most once per call.
    fn get_or_insert_with<F>(
        &self,
        key: &str,
        init: F,
    ) -> impl Future<Output = Result<String>> + Send
    where
        F: FnOnce() -> String + Send,
    {
        async move {
            if let Some(value) = self.get(key).await? {
                if !value.is_empty() {
                    return Ok(value);
                }
            }
            let value = init();
            self.set(key, &value).await?;
            Ok(value)
        }
    }
}

/// In-memory store, lost when dropped
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_or_insert_with<F>(&self, key: &str, init: F) -> Result<String>
    where
        F: FnOnce() -> String + Send,
    {
        let mut values = self.values.write().await;
        match values.get(key) {
            Some(value) if !value.is_empty() => Ok(value.clone()),
            _ => {
                let value = init();
                values.insert(key.to_string(), value.clone());
                Ok(value)
            },
        }
    }
}

/// SQLite-backed store shared by every `tvr` invocation
#[derive(Clone)]
pub struct SqliteSettings {
    pool: SqlitePool,
}

impl SqliteSettings {
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let pool = create_pool(db_path).await?;
        run_migrations(&pool).await?;
        tracing::debug!(path = %db_path.display(), "Settings database opened");
        Ok(Self { pool })
    }

    /// Open the store at its default location
    pub async fn open_default() -> Result<Self> {
        Self::open(&settings_db_path()?).await
    }
}

impl SettingsStore for SqliteSettings {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_or_insert_with<F>(&self, key: &str, init: F) -> Result<String>
    where
        F: FnOnce() -> String + Send,
    {
        // Concurrent first runs race on the insert; the loser reads the winner's value.
        let candidate = init();
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value WHERE settings.value = ''",
        )
        .bind(key)
        .bind(&candidate)
        .execute(&self.pool)
        .await?;

        self.get(key).await?.ok_or_else(|| {
            RemoteError::InvalidInput(format!("Setting '{}' vanished after insert", key))
        })
    }
}

/// Directory holding persisted remote state
pub fn settings_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(HOME_ENV_VAR) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    dirs::home_dir()
        .map(|home| home.join(".tv-remote"))
        .ok_or_else(|| {
            RemoteError::InvalidInput(format!(
                "Cannot locate home directory; set {} explicitly",
                HOME_ENV_VAR
            ))
        })
}

pub fn settings_db_path() -> Result<PathBuf> {
    Ok(settings_dir()?.join("settings.db"))
}

/// Mask a secret for display: first 4 chars + ********
pub fn mask_value(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else if value.chars().count() <= 4 {
        "********".to_string()
    } else {
        let prefix: String = value.chars().take(4).collect();
        format!("{}...********", prefix)
    }
}
