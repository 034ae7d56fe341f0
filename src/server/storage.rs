//! File-backed store for the Remote Shared Document.
//!
//! The document lives in a single file:
//! ```text
//! <DATA_DIR>/
//!   document.json
//! ```
//!
//! Writes go to a temp file that is renamed into place. All mutations run
//! under one lock, so a version check and the write that follows it are
//! atomic with respect to other requests.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use agua_core::record::now_millis;
use agua_core::{PutOutcome, Record, RemoteDocument};
use tokio::sync::RwLock;

const DOCUMENT_FILE: &str = "document.json";

/// Errors that can occur during document storage operations.
#[derive(Debug)]
pub enum StoreError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// The stored document is not valid JSON.
    ParseError(PathBuf, serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StoreError::ParseError(path, e) => {
                write!(f, "Failed to parse document {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::IoError(_, e) => Some(e),
            StoreError::ParseError(_, e) => Some(e),
        }
    }
}

/// The server's copy of the shared document.
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    doc: RwLock<Option<RemoteDocument>>,
}

impl DocumentStore {
    /// Opens the store in `data_dir`, loading the document if one exists.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).map_err(|e| StoreError::IoError(data_dir.to_path_buf(), e))?;

        let path = data_dir.join(DOCUMENT_FILE);
        let doc = match fs::read(&path) {
            Ok(bytes) => {
                let doc = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::ParseError(path.clone(), e))?;
                Some(doc)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(StoreError::IoError(path, e)),
        };

        Ok(Self {
            path,
            doc: RwLock::new(doc),
        })
    }

    /// Returns the path of the document file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current document, or `None` before the first write.
    pub async fn get(&self) -> Option<RemoteDocument> {
        self.doc.read().await.clone()
    }

    /// Stores `doc` as is.
    pub async fn replace(&self, doc: RemoteDocument) -> Result<(), StoreError> {
        let mut current = self.doc.write().await;
        self.persist(&doc).await?;
        *current = Some(doc);
        Ok(())
    }

    /// Replaces one collection if its version is still `expected_version`.
    pub async fn put_collection(
        &self,
        name: &str,
        records: &[Record],
        expected_version: u64,
    ) -> Result<PutOutcome, StoreError> {
        let mut current = self.doc.write().await;
        let mut doc = current.clone().unwrap_or_default();

        let outcome = doc.put_collection_if(name, records, expected_version, now_millis());
        if let PutOutcome::Committed { version, .. } = outcome {
            self.persist(&doc).await?;
            *current = Some(doc);
            tracing::info!("Collection '{}' now at version {}", name, version);
        }

        Ok(outcome)
    }

    /// Writes the document file on the blocking pool. Callers hold the
    /// write lock until this returns.
    async fn persist(&self, doc: &RemoteDocument) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec(doc).map_err(|e| StoreError::ParseError(self.path.clone(), e))?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| StoreError::IoError(self.path.clone(), io::Error::other(e)))?
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let temp_path = path.with_extension("tmp");
    let mut file =
        File::create(&temp_path).map_err(|e| StoreError::IoError(temp_path.clone(), e))?;
    file.write_all(bytes)
        .map_err(|e| StoreError::IoError(temp_path.clone(), e))?;
    file.sync_all()
        .map_err(|e| StoreError::IoError(temp_path.clone(), e))?;

    fs::rename(&temp_path, path).map_err(|e| StoreError::IoError(path.to_path_buf(), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (DocumentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_empty_store() {
        let (store, _temp) = test_store();
        assert!(store.get().await.is_none());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_replace_persists_document() {
        let (store, temp) = test_store();

        let mut doc = RemoteDocument::default();
        doc.set_collection("houses", vec![Record::with_id("A113")], 1_000);
        store.replace(doc.clone()).await.unwrap();

        assert_eq!(store.get().await, Some(doc.clone()));

        let reopened = DocumentStore::open(temp.path()).unwrap();
        assert_eq!(reopened.get().await, Some(doc));
        assert!(!temp.path().join("document.tmp").exists());
    }

    #[tokio::test]
    async fn test_put_collection_checks_version() {
        let (store, temp) = test_store();

        let first = store
            .put_collection("users", &[Record::with_id("u2")], 0)
            .await
            .unwrap();
        assert!(matches!(first, PutOutcome::Committed { version: 1, .. }));

        let stale = store
            .put_collection("users", &[Record::with_id("u3")], 0)
            .await
            .unwrap();
        assert_eq!(stale, PutOutcome::Conflict { current_version: 1 });

        let reopened = DocumentStore::open(temp.path()).unwrap();
        let doc = reopened.get().await.unwrap();
        assert_eq!(doc.collection("users").unwrap(), &vec![Record::with_id("u2")]);
        assert_eq!(doc.version_of("users"), 1);
    }

    #[tokio::test]
    async fn test_disjoint_collections_do_not_conflict() {
        let (store, _temp) = test_store();

        store
            .put_collection("houses", &[Record::with_id("A113")], 0)
            .await
            .unwrap();
        let outcome = store
            .put_collection("users", &[Record::with_id("u2")], 0)
            .await
            .unwrap();

        assert!(matches!(outcome, PutOutcome::Committed { version: 1, .. }));
        let doc = store.get().await.unwrap();
        assert!(doc.collection("houses").is_some());
        assert!(doc.collection("users").is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_conditional_writes_commit_once() {
        let (store, temp) = test_store();
        let store = std::sync::Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("u{}", i);
                store
                    .put_collection("users", &[Record::with_id(id)], 0)
                    .await
                    .unwrap()
            }));
        }

        let mut committed = 0;
        for handle in handles {
            if let PutOutcome::Committed { .. } = handle.await.unwrap() {
                committed += 1;
            }
        }
        assert_eq!(committed, 1);

        let reopened = DocumentStore::open(temp.path()).unwrap();
        assert_eq!(reopened.get().await.unwrap().version_of("users"), 1);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_document() {
        let (store, temp) = test_store();
        std::fs::remove_dir_all(temp.path()).unwrap();

        let mut doc = RemoteDocument::default();
        doc.set_collection("houses", vec![Record::with_id("A113")], 1_000);
        let err = store.replace(doc).await.unwrap_err();

        assert!(matches!(err, StoreError::IoError(_, _)));
        assert!(store.get().await.is_none());
    }

    #[test]
    fn test_open_corrupt_document() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("document.json"), b"{not json").unwrap();

        let err = DocumentStore::open(temp_dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::ParseError(_, _)));
        assert!(err.to_string().contains("Failed to parse document"));
    }
}
