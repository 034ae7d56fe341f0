//! In-process remote shared by every engine holding a clone.
//!
//! Used to run several simulated devices against one document, and to
//! exercise offline behavior.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::record::{now_millis, Record};

use super::{PutOutcome, RemoteDocument, RemoteError, RemoteStore};

#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    doc: Arc<Mutex<Option<RemoteDocument>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing document.
    pub fn with_document(doc: RemoteDocument) -> Self {
        Self {
            doc: Arc::new(Mutex::new(Some(doc))),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// While offline every call fails with `RemoteError::Offline`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns a copy of the stored document, if any.
    pub fn snapshot(&self) -> Option<RemoteDocument> {
        self.lock().clone()
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RemoteError::Offline)
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<RemoteDocument>> {
        // A poisoned lock only means a panicking test thread; the document
        // itself is always left whole.
        self.doc.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RemoteStore for MemoryRemote {
    async fn fetch(&self) -> Result<RemoteDocument, RemoteError> {
        self.check_online()?;
        Ok(self.lock().clone().unwrap_or_default())
    }

    async fn replace(&self, doc: &RemoteDocument) -> Result<(), RemoteError> {
        self.check_online()?;
        *self.lock() = Some(doc.clone());
        Ok(())
    }

    async fn put_collection(
        &self,
        name: &str,
        records: &[Record],
        expected_version: u64,
    ) -> Result<PutOutcome, RemoteError> {
        self.check_online()?;
        let mut guard = self.lock();
        let doc = guard.get_or_insert_with(RemoteDocument::default);
        Ok(doc.put_collection_if(name, records, expected_version, now_millis()))
    }
}
