use anyhow::Context;
use clap::Parser;
use shopassist::cli::handle_ask_command;
use shopassist::cli::handle_config_command;
use shopassist::cli::handle_serve_api;
use shopassist::cli::print_error;
use shopassist::cli::Cli;
use shopassist::cli::Commands;
use shopassist::config::AppConfig;
use shopassist::secrets::EnvSecretStore;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load().context("failed to load configuration")?;

    if cli.verbose {
        shopassist::logging::init_logging_with_level("debug")?;
    } else {
        shopassist::logging::init_logging_with_config(Some(&config.logging))?;
    }
    info!("Configuration loaded successfully");

    let secrets = EnvSecretStore::new(cli.secrets_dir.clone());

    let outcome = match cli.command {
        Commands::Serve { host, port, cors } => {
            handle_serve_api(&config, &secrets, host, port, cors).await
        }
        Commands::Ask {
            message,
            image,
            trace,
        } => handle_ask_command(&config, &secrets, message, image.as_deref(), trace).await,
        Commands::Config => handle_config_command(&config),
    };

    if let Err(e) = &outcome {
        print_error(&e.to_string());
    }
    outcome.map_err(Into::into)
}
