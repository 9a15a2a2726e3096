use crate::relay::{RelayConfig, RelayServer};
use std::path::PathBuf;

/// Resolve relay configuration from flags over environment defaults
pub fn relay_config(
    port: Option<u16>,
    root: Option<PathBuf>,
    bind: &str,
) -> anyhow::Result<RelayConfig> {
    let mut config = RelayConfig::from_env()?;
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(root) = root {
        config.static_root = root;
    }
    config.bind = bind.to_string();
    Ok(config)
}

pub async fn handle_relay_command(
    port: Option<u16>,
    root: Option<PathBuf>,
    bind: &str,
) -> anyhow::Result<()> {
    let config = relay_config(port, root, bind)?;
    if !config.static_root.is_dir() {
        tracing::warn!(
            "Static root {} does not exist; only /api will be useful",
            config.static_root.display()
        );
    }

    RelayServer::new(config).run().await
}
