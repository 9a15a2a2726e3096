use clap::Parser;
use tv_remote::cli::{Cli, Commands};
use tv_remote::cli_handlers::{
    handle_command, handle_identity_command, handle_keys_command, handle_pair_command,
    handle_relay_command,
};
use tv_remote::commands::Command;
use tv_remote::error::Result;
use tv_remote::logging::{log_file_from_env, ApplicationMode, LoggingConfig};

#[tokio::main]
async fn main() {
    // Parse CLI arguments first to get logging configuration
    let cli = Cli::parse();

    let mode = match cli.command {
        Commands::Relay { .. } => ApplicationMode::Relay,
        _ => ApplicationMode::Cli,
    };
    let mut log_config = LoggingConfig::from_args(cli.quiet, cli.verbose, cli.json, mode);
    if mode == ApplicationMode::Relay {
        if let Some(path) = log_file_from_env() {
            log_config = log_config.with_file_output(path);
        }
    }

    if let Err(e) = tv_remote::logging::init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli).await {
        let error_response = e.to_error_response();
        match serde_json::to_string_pretty(&error_response) {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("{}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match cli.command.clone() {
        Commands::Key { key, target } => handle_command(Command::Key(key), &target).await?,

        Commands::Launch { action, target } => {
            handle_command(Command::Launch(action), &target).await?
        },

        Commands::Pair(pair_cmd) => handle_pair_command(pair_cmd).await?,

        Commands::Identity { format } => handle_identity_command(&format).await?,

        Commands::Keys { format } => handle_keys_command(&format)?,

        Commands::Relay { port, root, bind } => handle_relay_command(port, root, &bind).await?,
    }

    Ok(())
}
