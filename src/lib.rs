//! Agua Sync server library.
//!
//! Exposes the document server so the `agua-server` binary and tests can
//! build the same router.

pub mod server;
