//! The document server: hosts the Remote Shared Document over HTTP.

mod routes;
mod storage;

pub use routes::{app, AppState};
pub use storage::{DocumentStore, StoreError};
