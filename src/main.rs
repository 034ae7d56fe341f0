use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod remote;

use agua_core::{ChangeNotifier, LocalCache, SyncEngine};
use commands::{
    ConfigCommand, Engine, GetCommand, RemoveCommand, ReplaceCommand, ShiftCommand, SyncCommand,
    UpsertCommand, WatchCommand,
};
use config::Config;
use remote::DeviceRemote;

#[derive(Parser)]
#[command(name = "agua")]
#[command(version)]
#[command(about = "Local-first records for the water billing tool", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a collection
    Get(GetCommand),

    /// Replace a whole collection from a JSON file
    Replace(ReplaceCommand),

    /// Insert or update one record
    Upsert(UpsertCommand),

    /// Remove one record
    Remove(RemoveCommand),

    /// Sync with remote server
    Sync(SyncCommand),

    /// Sync periodically and print changes
    Watch(WatchCommand),

    /// Manage the reading shift
    Shift(ShiftCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agua=warn,agua_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Save config path for init command
    let cli_config_path = cli.config.clone();

    // Load configuration
    let config = Config::load(cli.config)?;

    let engine = SyncEngine::new(
        LocalCache::new(config.data_dir.value.clone()),
        DeviceRemote::from_config(&config.sync)?,
        config.sync.options(),
        ChangeNotifier::new(),
    );

    // Auto-sync BEFORE read commands
    if is_read_command(&cli.command) {
        try_auto_sync(&engine, &config).await;
    }

    let result = execute_command(&cli.command, &engine, &config, cli_config_path).await;

    // Auto-sync AFTER write commands (only if command succeeded)
    if result.is_ok() && is_write_command(&cli.command) {
        try_auto_sync(&engine, &config).await;
    }

    result
}

async fn execute_command(
    command: &Option<Commands>,
    engine: &Engine,
    config: &Config,
    cli_config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Some(Commands::Get(cmd)) => cmd.run(engine)?,
        Some(Commands::Replace(cmd)) => cmd.run(engine).await?,
        Some(Commands::Upsert(cmd)) => cmd.run(engine).await?,
        Some(Commands::Remove(cmd)) => cmd.run(engine).await?,
        Some(Commands::Sync(cmd)) => cmd.run(engine, config).await?,
        Some(Commands::Watch(cmd)) => cmd.run(engine).await?,
        Some(Commands::Shift(cmd)) => cmd.run(engine)?,
        Some(Commands::Config(cmd)) => cmd.run(config, cli_config_path)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

/// Pulls from the server when auto-sync is on. Failures are logged and
/// never stop the command.
async fn try_auto_sync(engine: &Engine, config: &Config) {
    if !config.sync.auto_sync || !config.sync.is_configured() {
        return;
    }

    match engine.sync().await {
        Ok(true) => tracing::info!("Auto-sync pulled remote changes"),
        Ok(false) => tracing::debug!("Auto-sync: nothing new"),
        Err(e) => tracing::warn!("Auto-sync failed: {}", e),
    }
}

/// Returns true if the command is a read operation that should sync before execution.
fn is_read_command(cmd: &Option<Commands>) -> bool {
    matches!(cmd, Some(Commands::Get(_)))
}

/// Returns true if the command is a write operation that should sync after execution.
fn is_write_command(cmd: &Option<Commands>) -> bool {
    matches!(
        cmd,
        Some(Commands::Replace(_) | Commands::Upsert(_) | Commands::Remove(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_command_classification() {
        let cli = Cli::try_parse_from(["agua", "get", "houses", "--format", "json"]).unwrap();
        assert!(is_read_command(&cli.command));
        assert!(!is_write_command(&cli.command));

        let cli = Cli::try_parse_from(["agua", "upsert", "houses", r#"{"id":"A113"}"#]).unwrap();
        assert!(is_write_command(&cli.command));

        let cli = Cli::try_parse_from(["agua", "sync", "status"]).unwrap();
        assert!(!is_read_command(&cli.command));
        assert!(!is_write_command(&cli.command));

        let cli = Cli::try_parse_from(["agua", "watch", "-i", "5", "houses", "users"]).unwrap();
        match cli.command {
            Some(Commands::Watch(cmd)) => {
                assert_eq!(cmd.interval, 5);
                assert_eq!(cmd.collections, vec!["houses", "users"]);
            }
            _ => panic!("expected watch"),
        }
    }
}
