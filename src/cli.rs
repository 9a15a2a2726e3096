use crate::transport::{TransportConfig, DEFAULT_RELAY_BASE, DEFAULT_TV_PORT};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const LONG_ABOUT: &str = r#"
tvr - remote control for JSON/HTTP controlled televisions

Transport modes:
  default     direct request, status and body readable
  --no-cors   direct opaque request; delivery cannot be confirmed
  --proxy     through the tvr relay (`tvr relay`), which forwards to --host

Pairing:
  tvr pair request --host 10.0.0.5          ← TV shows a code
  tvr pair grant 1234 --host 10.0.0.5       ← confirm with that code

Persisted state (device id, auth key) lives in ~/.tv-remote/settings.db,
or in $TV_REMOTE_HOME when set.
"#;

#[derive(Parser, Clone)]
#[command(name = "tvr")]
#[command(about = "Remote control and same-origin relay for networked televisions")]
#[command(long_about = LONG_ABOUT)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output (-q)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output diagnostics in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Send a key press
    ///
    /// Examples:
    ///   tvr key VolumeUp --host 10.0.0.5
    ///   tvr key Standby --host 10.0.0.5 --no-cors
    Key {
        /// Key code, e.g. Home, VolumeUp, CursorLeft (see `tvr keys`)
        key: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Launch an application intent
    Launch {
        /// Intent action to launch
        action: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Pair this remote with the television
    #[command(subcommand)]
    Pair(PairCommands),

    /// Show the device identity and stored auth key
    Identity {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List well-known key codes
    Keys {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Run the same-origin relay server
    Relay {
        /// Port to listen on (overrides PORT, default 8000)
        #[arg(long)]
        port: Option<u16>,

        /// Directory served for non-API paths (default ./static)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[derive(Subcommand, Clone)]
pub enum PairCommands {
    /// Ask the television to start pairing; stores the issued auth key
    Request {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Confirm pairing with the code shown on screen
    Grant {
        /// Pairing code displayed by the television
        pin: String,

        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Connection flags shared by every command that talks to the television
#[derive(Args, Clone, Debug)]
pub struct TargetArgs {
    /// Television IP address or hostname
    #[arg(long)]
    pub host: String,

    /// Television API port
    #[arg(long = "tv-port", default_value = DEFAULT_TV_PORT)]
    pub tv_port: String,

    /// Send opaque no-cors requests (responses cannot be read)
    #[arg(long)]
    pub no_cors: bool,

    /// Route through the relay instead of contacting the TV directly
    #[arg(long)]
    pub proxy: bool,

    /// Relay base URL used with --proxy
    #[arg(long, default_value = DEFAULT_RELAY_BASE)]
    pub relay: String,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: String,
}

impl TargetArgs {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::new(self.host.as_str())
            .with_port(self.tv_port.as_str())
            .with_cors_mode(self.no_cors)
            .with_proxy_mode(self.proxy)
    }
}
