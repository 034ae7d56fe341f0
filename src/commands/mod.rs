mod collection;
mod config_cmd;
mod shift;
mod sync_cmd;
mod watch;

use std::path::PathBuf;

use agua_core::{CacheError, Collection, PushStatus, RemoteError, Saved, SyncEngine, SyncError};
use clap::ValueEnum;

use crate::remote::DeviceRemote;

pub use collection::{GetCommand, RemoveCommand, ReplaceCommand, UpsertCommand};
pub use config_cmd::ConfigCommand;
pub use shift::ShiftCommand;
pub use sync_cmd::SyncCommand;
pub use watch::WatchCommand;

/// The engine every command runs against.
pub type Engine = SyncEngine<DeviceRemote>;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Errors from CLI commands
#[derive(Debug)]
pub enum CommandError {
    Sync(SyncError),
    Remote(RemoteError),
    Io(PathBuf, std::io::Error),
    InvalidJson(String),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Sync(e) => write!(f, "{}", e),
            CommandError::Remote(e) => write!(f, "{}", e),
            CommandError::Io(path, e) => write!(f, "{}: {}", path.display(), e),
            CommandError::InvalidJson(msg) => write!(f, "Invalid JSON: {}", msg),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Sync(e) => Some(e),
            CommandError::Remote(e) => Some(e),
            CommandError::Io(_, e) => Some(e),
            CommandError::InvalidJson(_) => None,
        }
    }
}

impl From<SyncError> for CommandError {
    fn from(e: SyncError) -> Self {
        CommandError::Sync(e)
    }
}

impl From<CacheError> for CommandError {
    fn from(e: CacheError) -> Self {
        CommandError::Sync(SyncError::from(e))
    }
}

impl From<RemoteError> for CommandError {
    fn from(e: RemoteError) -> Self {
        CommandError::Remote(e)
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        CommandError::InvalidJson(e.to_string())
    }
}

/// Prints a collection, one record per line in text mode.
fn print_collection(
    name: &str,
    records: &Collection,
    format: OutputFormat,
) -> Result<(), CommandError> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        OutputFormat::Text => {
            println!(
                "{} ({} record{})",
                name,
                records.len(),
                if records.len() == 1 { "" } else { "s" }
            );
            for record in records {
                let mut fields = record.as_map().clone();
                fields.remove("id");
                println!(
                    "  {:<12} {}",
                    record.id().unwrap_or("-"),
                    serde_json::Value::Object(fields)
                );
            }
        }
    }
    Ok(())
}

/// One-line summary of where a write ended up.
fn describe_saved(name: &str, saved: &Saved) -> String {
    match &saved.remote {
        PushStatus::Pushed { version, .. } => format!(
            "Saved {} ({} records), pushed as version {}",
            name,
            saved.records.len(),
            version
        ),
        PushStatus::Queued { reason } => format!(
            "Saved {} locally ({} records), queued for sync: {}",
            name,
            saved.records.len(),
            reason
        ),
    }
}
