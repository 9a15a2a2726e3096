// CLI command handlers module
//
// Remote: key, launch, pair, identity, keys
// Server: relay

pub mod relay;
pub mod remote_commands;

pub use relay::handle_relay_command;
pub use remote_commands::{
    handle_command, handle_identity_command, handle_keys_command, handle_pair_command,
};
