//! Sync CLI commands for synchronizing with the server.

use agua_core::check_server;
use chrono::{DateTime, Local, Utc};
use clap::{Args, Subcommand};

use crate::config::Config;

use super::{CommandError, Engine};

/// Sync with remote server
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration, queue and server status
    Status,
}

impl SyncCommand {
    pub async fn run(&self, engine: &Engine, config: &Config) -> Result<(), CommandError> {
        match &self.command {
            None => self.sync(engine, config).await,
            Some(SyncSubcommand::Status) => self.status(engine, config).await,
        }
    }

    async fn sync(&self, engine: &Engine, config: &Config) -> Result<(), CommandError> {
        if !config.sync.is_configured() {
            println!("Sync is not configured. Run `agua sync status` for setup help.");
            return Ok(());
        }

        println!("Syncing with server...");

        let updated = engine.sync().await?;
        let pending = engine.pending_writes()?.len();

        if updated {
            println!("Sync complete.");
        } else {
            println!("Already up to date.");
        }
        if pending > 0 {
            println!(
                "{} local write{} still queued.",
                pending,
                if pending == 1 { "" } else { "s" }
            );
        }

        Ok(())
    }

    async fn status(&self, engine: &Engine, config: &Config) -> Result<(), CommandError> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        let pending = engine.pending_writes()?;
        let last_synced = engine.last_synced()?;

        let Some(server_url) = &config.sync.server_url else {
            println!("Status: Not configured");
            println!("Queued writes: {}", pending.len());
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  sync:");
            println!("    server_url: \"http://localhost:8080\"");
            println!("    token: \"shared-secret\"");
            println!("    auto_sync: false");
            println!();
            println!("Or set environment variables:");
            println!("  AGUA_SYNC_URL");
            println!("  AGUA_SYNC_TOKEN");
            return Ok(());
        };

        println!("Server:     {}", server_url);
        println!(
            "Token:      {}",
            if config.sync.token.is_some() {
                "set"
            } else {
                "not set"
            }
        );
        println!("Write mode: {}", config.sync.write_mode);
        println!(
            "Auto-sync:  {}",
            if config.sync.auto_sync {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!(
            "Last sync:  {}",
            last_synced
                .as_deref()
                .map(format_stamp)
                .unwrap_or_else(|| "never".to_string())
        );
        println!("Queued:     {}", pending.len());
        for write in &pending {
            println!("  - {}", write.collection);
        }
        println!();

        print!("Server status: ");
        if check_server(server_url).await {
            println!("✓ reachable");
        } else {
            println!("✗ unreachable");
        }

        Ok(())
    }
}

/// Renders a sync cursor (epoch milliseconds) as local time.
fn format_stamp(stamp: &str) -> String {
    stamp
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| stamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_stamp() {
        let formatted = format_stamp("1767225600000");
        assert!(formatted.starts_with("2025-12-3") || formatted.starts_with("2026-01-01"));
        assert_eq!(format_stamp("not-a-number"), "not-a-number");
    }
}
