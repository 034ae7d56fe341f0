//! Local Cache Store: the device's durable copy of every collection.
//!
//! # Layout
//!
//! ```text
//! <data_dir>/
//!   db_<collection>.json    last-known-good array of records
//!   last_cloud_sync         sync cursor (remote `updatedAt` last applied)
//!   reader_shift_active     "true" while a reading shift is open
//!   pending_writes          outbound queue of unacknowledged mutations
//! ```
//!
//! A missing `db_<collection>.json` means the collection is absent; a file
//! containing `[]` is an intentionally empty collection.

mod store;

pub use store::{CacheError, LocalCache};

/// Prefix of every collection file.
pub const COLLECTION_PREFIX: &str = "db_";
/// Scalar holding the sync cursor.
pub const SYNC_CURSOR_KEY: &str = "last_cloud_sync";
/// Scalar holding the reader shift flag.
pub const SHIFT_ACTIVE_KEY: &str = "reader_shift_active";
/// Scalar holding the outbound queue.
pub const PENDING_WRITES_KEY: &str = "pending_writes";
