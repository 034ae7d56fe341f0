//! In-process change notifications.
//!
//! Consumers subscribe to the collections they display and re-read them
//! with `SyncEngine::get` when an event arrives. Events carry no data.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

/// Buffered events per channel before slow receivers start lagging.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The local copy of a collection was overwritten by a pull.
    CollectionChanged { collection: String },
    /// A pull applied a newer remote document.
    SyncCompleted { updated_at: String },
}

/// Registry of broadcast channels keyed by collection name.
#[derive(Clone)]
pub struct ChangeNotifier {
    inner: Arc<Inner>,
}

struct Inner {
    channels: RwLock<HashMap<String, broadcast::Sender<ChangeEvent>>>,
    all: broadcast::Sender<ChangeEvent>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (all, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                channels: RwLock::new(HashMap::new()),
                all,
            }),
        }
    }

    /// Subscribes to changes of one collection.
    pub async fn subscribe(&self, collection: &str) -> broadcast::Receiver<ChangeEvent> {
        let mut channels = self.inner.channels.write().await;

        if let Some(sender) = channels.get(collection) {
            sender.subscribe()
        } else {
            let (sender, receiver) = broadcast::channel(CHANNEL_CAPACITY);
            channels.insert(collection.to_string(), sender);
            receiver
        }
    }

    /// Subscribes to every event, including `SyncCompleted`.
    pub fn subscribe_all(&self) -> broadcast::Receiver<ChangeEvent> {
        self.inner.all.subscribe()
    }

    /// Delivers an event to the matching collection channel and to every
    /// `subscribe_all` receiver.
    pub async fn publish(&self, event: ChangeEvent) {
        if let ChangeEvent::CollectionChanged { collection } = &event {
            let channels = self.inner.channels.read().await;
            if let Some(sender) = channels.get(collection) {
                // Ignore send errors (no subscribers)
                let _ = sender.send(event.clone());
            }
        }

        let _ = self.inner.all.send(event);
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("all_receivers", &self.inner.all.receiver_count())
            .finish()
    }
}
