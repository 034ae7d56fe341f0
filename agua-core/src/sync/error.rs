//! Sync engine error types.

use crate::cache::CacheError;
use crate::record::InvalidCollectionName;

/// Errors returned by engine operations.
///
/// Remote failures are not errors at this level: writes report them in
/// `PushStatus::Queued` and `sync` reports them as "nothing synced".
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The local cache could not be read or written.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error(transparent)]
    InvalidName(#[from] InvalidCollectionName),
    /// A record without a string `id` was written to a collection.
    #[error("Record in collection '{0}' has no string id")]
    MissingId(String),
    /// A replacement collection holds the same id twice.
    #[error("Duplicate id '{id}' in collection '{collection}'")]
    DuplicateId { collection: String, id: String },
    /// A typed entity or the outbound queue could not be (de)serialized.
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}
