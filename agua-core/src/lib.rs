//! Agua Sync Core Library
//!
//! Local-first persistence for the Agua billing tool: a durable per-device
//! cache of named collections, a single shared remote document, and the
//! engine that reconciles the two across devices.

pub mod cache;
pub mod models;
pub mod record;
pub mod remote;
pub mod sync;

pub use cache::{CacheError, LocalCache};
pub use models::{Entity, House, Invoice, Leak, Reading, User, UserRole};
pub use record::{validate_collection_name, Collection, Record};
pub use remote::{
    check_server, HttpRemote, MemoryRemote, PutOutcome, RemoteDocument, RemoteError, RemoteStore,
};
pub use sync::{
    ChangeEvent, ChangeNotifier, PushStatus, Saved, SyncEngine, SyncError, SyncOptions, WriteMode,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
