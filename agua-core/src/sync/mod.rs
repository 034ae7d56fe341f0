//! Local-first synchronization.
//!
//! Reads are served from the local cache. Writes land in the cache first,
//! then go through an ordered outbound queue to the remote document. A
//! pull (`SyncEngine::sync`) overwrites local collections with the remote
//! copy when the remote `updatedAt` moved, and announces what changed
//! through the `ChangeNotifier`.
//!
//! # Usage
//!
//! ```
//! use agua_core::{ChangeNotifier, LocalCache, MemoryRemote, SyncEngine, SyncOptions};
//!
//! # let dir = std::env::temp_dir().join(format!("agua-doc-{}", std::process::id()));
//! let engine = SyncEngine::new(
//!     LocalCache::new(&dir),
//!     MemoryRemote::new(),
//!     SyncOptions::default(),
//!     ChangeNotifier::new(),
//! );
//! let houses = engine.get("houses").unwrap();
//! assert!(!houses.is_empty());
//! ```

mod engine;
mod error;
mod mutation;
mod notifier;
mod options;

pub use engine::{PushStatus, Saved, SyncEngine};
pub use error::SyncError;
pub use mutation::{Mutation, PendingWrite};
pub use notifier::{ChangeEvent, ChangeNotifier};
pub use options::{SyncOptions, WriteMode};
