//! Remote Shared Document access.
//!
//! The remote is a single JSON document holding every collection. Two
//! write primitives are offered:
//!
//! - `replace`: overwrite the whole document (document-level
//!   last-writer-wins)
//! - `put_collection`: replace one collection only if its version is still
//!   the one the writer read (per-collection compare-and-swap)

mod document;
mod http;
mod memory;

use std::future::Future;

use crate::record::Record;

pub use document::RemoteDocument;
pub use http::{check_server, CommitBody, ConflictBody, HttpRemote};
pub use memory::MemoryRemote;

/// Result of a conditional collection write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The write was applied.
    Committed { version: u64, updated_at: i64 },
    /// Someone else wrote the collection since it was read.
    Conflict { current_version: u64 },
}

/// Errors reaching or understanding the remote.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Transport failure (connection refused, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(String),
    /// The server answered with an unexpected status.
    #[error("Server returned status {0}")]
    Status(u16),
    /// The response body was not a valid document.
    #[error("Malformed response: {0}")]
    Decode(String),
    /// The remote is unreachable (simulated or detected).
    #[error("Remote is offline")]
    Offline,
}

/// A shared document store reachable from several devices.
pub trait RemoteStore: Send + Sync {
    /// Fetches the whole document. An absent document is the empty one.
    fn fetch(&self) -> impl Future<Output = Result<RemoteDocument, RemoteError>> + Send;

    /// Overwrites the whole document, unconditionally.
    fn replace(
        &self,
        doc: &RemoteDocument,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Replaces one collection if its version still equals
    /// `expected_version`.
    fn put_collection(
        &self,
        name: &str,
        records: &[Record],
        expected_version: u64,
    ) -> impl Future<Output = Result<PutOutcome, RemoteError>> + Send;
}
