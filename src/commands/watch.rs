//! Keep pulling from the server and report what changed.

use std::collections::BTreeSet;
use std::time::Duration;

use agua_core::{validate_collection_name, ChangeEvent, SyncError};
use clap::Args;
use tokio::sync::broadcast::{error::TryRecvError, Receiver};

use super::{CommandError, Engine};

/// Sync periodically and print change notifications
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Seconds between pulls
    #[arg(long, short, default_value = "30")]
    pub interval: u64,

    /// Collections to report (all when empty)
    pub collections: Vec<String>,
}

impl WatchCommand {
    pub async fn run(&self, engine: &Engine) -> Result<(), CommandError> {
        for name in &self.collections {
            validate_collection_name(name).map_err(SyncError::from)?;
        }

        let watched: BTreeSet<&str> = self.collections.iter().map(String::as_str).collect();
        let mut receivers = Vec::new();
        if watched.is_empty() {
            receivers.push(engine.notifier().subscribe_all());
        } else {
            for name in &watched {
                receivers.push(engine.notifier().subscribe(name).await);
            }
            // Completion events only go to the catch-all channel
            receivers.push(engine.notifier().subscribe_all());
        }

        let names = if watched.is_empty() {
            "all collections".to_string()
        } else {
            watched.iter().copied().collect::<Vec<_>>().join(", ")
        };
        println!(
            "Watching {} every {}s (Ctrl-C to stop)",
            names,
            self.interval.max(1)
        );

        let mut ticker = tokio::time::interval(Duration::from_secs(self.interval.max(1)));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = engine.sync().await {
                        eprintln!("Sync failed: {}", e);
                    }
                    let catch_all = receivers.len() - 1;
                    for (index, rx) in receivers.iter_mut().enumerate() {
                        let only_completion = !watched.is_empty() && index == catch_all;
                        drain(rx, only_completion);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    println!("Stopped.");
                    return Ok(());
                }
            }
        }
    }
}

/// Prints the events waiting on `rx`.
fn drain(rx: &mut Receiver<ChangeEvent>, only_completion: bool) {
    loop {
        match rx.try_recv() {
            Ok(ChangeEvent::CollectionChanged { collection }) if !only_completion => {
                println!("  changed: {}", collection);
            }
            Ok(ChangeEvent::SyncCompleted { updated_at }) => {
                println!("Synced document {}", updated_at);
            }
            Ok(_) => {}
            Err(TryRecvError::Lagged(n)) => {
                tracing::warn!("Missed {} change event(s)", n);
            }
            Err(_) => break,
        }
    }
}
