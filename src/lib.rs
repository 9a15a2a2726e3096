pub mod activity;
pub mod cli;
pub mod cli_handlers;
pub mod commands;
pub mod db;
pub mod error;
pub mod identity;
pub mod logging;
pub mod pairing;
pub mod relay;
pub mod remote;
pub mod settings;
pub mod transport;

#[cfg(test)]
pub mod test_utils;
