//! The sync engine: local cache, outbound queue and remote document.

use std::collections::HashSet;

use tokio::sync::Mutex;

use crate::cache::{LocalCache, PENDING_WRITES_KEY, SYNC_CURSOR_KEY};
use crate::models::{from_record, seed, to_record, Entity};
use crate::record::{
    find_duplicate_id, now_millis, validate_collection_name, Collection, Record,
};
use crate::remote::{PutOutcome, RemoteError, RemoteStore};

use super::error::SyncError;
use super::mutation::{Mutation, PendingWrite};
use super::notifier::{ChangeEvent, ChangeNotifier};
use super::options::{SyncOptions, WriteMode};

/// What happened to a local write on its way to the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStatus {
    /// The remote acknowledged the write.
    Pushed { version: u64, updated_at: i64 },
    /// The write is kept in the outbound queue.
    Queued { reason: String },
}

/// Result of a local write.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved {
    /// The collection as now stored locally.
    pub records: Collection,
    pub remote: PushStatus,
}

impl Saved {
    pub fn is_pushed(&self) -> bool {
        matches!(self.remote, PushStatus::Pushed { .. })
    }
}

/// A push that went through.
struct Commit {
    version: u64,
    updated_at: i64,
    /// Collection as merged on the remote, for conditional writes.
    merged: Option<Collection>,
}

#[derive(Debug, thiserror::Error)]
enum PushFailure {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("version conflict on '{collection}' after {attempts} attempt(s)")]
    Conflict { collection: String, attempts: u32 },
    #[error(transparent)]
    Local(#[from] SyncError),
}

/// Reconciles one device's cache with the shared remote document.
pub struct SyncEngine<R> {
    cache: LocalCache,
    remote: R,
    options: SyncOptions,
    notifier: ChangeNotifier,
    /// Serializes writes, queue flushes and pulls on this device.
    write_lock: Mutex<()>,
}

impl<R: RemoteStore> SyncEngine<R> {
    pub fn new(
        cache: LocalCache,
        remote: R,
        options: SyncOptions,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            cache,
            remote,
            options,
            notifier,
            write_lock: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Returns the local copy of a collection, seeding it with the
    /// default data on first access. Never touches the network.
    pub fn get(&self, name: &str) -> Result<Collection, SyncError> {
        self.get_or_seed(name, || seed::defaults_for(name))
    }

    /// Like `get`, with a caller-supplied seed.
    pub fn get_or_seed<F>(&self, name: &str, seed: F) -> Result<Collection, SyncError>
    where
        F: FnOnce() -> Collection,
    {
        if let Some(records) = self.cache.read_collection(name)? {
            return Ok(records);
        }

        let records = seed();
        self.cache.write_collection(name, &records)?;
        tracing::debug!("Seeded collection '{}' with {} record(s)", name, records.len());
        Ok(records)
    }

    /// Replaces a whole collection locally, then pushes it.
    pub async fn replace_collection(
        &self,
        name: &str,
        records: Collection,
    ) -> Result<Saved, SyncError> {
        validate_collection_name(name)?;
        if records.iter().any(|r| r.id().is_none()) {
            return Err(SyncError::MissingId(name.to_string()));
        }
        if let Some(id) = find_duplicate_id(&records) {
            return Err(SyncError::DuplicateId {
                collection: name.to_string(),
                id: id.to_string(),
            });
        }

        self.commit(name, Mutation::Replace { records }).await
    }

    /// Merges one record into a collection by id, stamping `updatedAt`.
    pub async fn upsert_record(&self, name: &str, mut record: Record) -> Result<Saved, SyncError> {
        validate_collection_name(name)?;
        if record.id().is_none() {
            return Err(SyncError::MissingId(name.to_string()));
        }
        record.set_updated_at(now_millis());

        self.commit(name, Mutation::Upsert { record }).await
    }

    /// Drops the record with `id` from a collection. A missing id is not an
    /// error; the unchanged collection is still pushed.
    pub async fn remove(&self, name: &str, id: &str) -> Result<Saved, SyncError> {
        validate_collection_name(name)?;
        self.commit(name, Mutation::Remove { id: id.to_string() }).await
    }

    /// Pulls the remote document if it changed since the last pull.
    ///
    /// Returns `Ok(true)` when local collections were refreshed. A remote
    /// that cannot be reached gives `Ok(false)`; only local persistence
    /// failures are errors.
    pub async fn sync(&self) -> Result<bool, SyncError> {
        let changed;
        let stamp;
        {
            let _guard = self.write_lock.lock().await;

            if let Some(PushStatus::Queued { reason }) = self.flush().await? {
                tracing::debug!("Outbound queue not drained before pull: {}", reason);
            }

            let doc = match self.remote.fetch().await {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!("Sync skipped, remote unavailable: {}", e);
                    return Ok(false);
                }
            };

            stamp = match doc.stamp() {
                Some(stamp) => stamp,
                None => return Ok(false),
            };
            if self.last_synced()?.as_deref() == Some(stamp.as_str()) {
                return Ok(false);
            }

            let pending: HashSet<String> = self
                .load_queue()?
                .into_iter()
                .map(|p| p.collection)
                .collect();

            let mut updated = Vec::new();
            for (name, records) in &doc.collections {
                if validate_collection_name(name).is_err() {
                    tracing::warn!("Ignoring remote collection with invalid name {:?}", name);
                    continue;
                }
                if pending.contains(name) {
                    tracing::debug!("Keeping local '{}' until its queued writes are pushed", name);
                    continue;
                }

                // A corrupt local copy is simply overwritten
                let local = self.cache.read_collection(name).ok().flatten();
                if local.as_ref() != Some(records) {
                    self.cache.write_collection(name, records)?;
                    updated.push(name.clone());
                }
            }

            self.cache.write_scalar(SYNC_CURSOR_KEY, &stamp)?;
            changed = updated;
        }

        for name in &changed {
            self.notifier
                .publish(ChangeEvent::CollectionChanged {
                    collection: name.clone(),
                })
                .await;
        }
        self.notifier
            .publish(ChangeEvent::SyncCompleted {
                updated_at: stamp.clone(),
            })
            .await;

        tracing::info!(
            "Synced remote document {} ({} collection(s) changed)",
            stamp,
            changed.len()
        );
        Ok(true)
    }

    /// The remote `updatedAt` applied by the last pull.
    pub fn last_synced(&self) -> Result<Option<String>, SyncError> {
        Ok(self.cache.read_scalar(SYNC_CURSOR_KEY)?)
    }

    /// Local writes not yet acknowledged by the remote, oldest first.
    pub fn pending_writes(&self) -> Result<Vec<PendingWrite>, SyncError> {
        self.load_queue()
    }

    /// Typed read of an entity collection.
    pub fn list<E: Entity>(&self) -> Result<Vec<E>, SyncError> {
        self.get_or_seed(E::COLLECTION, || seed::records(&E::seed()))?
            .into_iter()
            .map(|record| from_record(record).map_err(SyncError::from))
            .collect()
    }

    /// Typed upsert of one entity.
    pub async fn upsert<E: Entity>(&self, entity: &E) -> Result<Saved, SyncError> {
        let record = to_record(entity)?;
        self.upsert_record(E::COLLECTION, record).await
    }

    /// Typed removal by id.
    pub async fn delete<E: Entity>(&self, id: &str) -> Result<Saved, SyncError> {
        self.remove(E::COLLECTION, id).await
    }

    async fn commit(&self, name: &str, mutation: Mutation) -> Result<Saved, SyncError> {
        let _guard = self.write_lock.lock().await;

        // Writes never seed: a collection this device has not stored is empty
        let base = match &mutation {
            Mutation::Replace { .. } => Vec::new(),
            _ => self.cache.read_collection(name)?.unwrap_or_default(),
        };
        let records = mutation.apply(base);
        self.cache.write_collection(name, &records)?;

        let mut queue = self.load_queue()?;
        queue.push(PendingWrite {
            collection: name.to_string(),
            mutation,
        });
        self.store_queue(&queue)?;

        // The queue holds at least this write, so flush reports on it
        let remote = self.flush().await?.unwrap_or(PushStatus::Queued {
            reason: "not pushed".to_string(),
        });

        let records = self.cache.read_collection(name)?.unwrap_or(records);
        Ok(Saved { records, remote })
    }

    /// Pushes queued writes in order until one fails.
    ///
    /// Returns the status of the last write handled, or `None` if the queue
    /// was empty. Callers hold `write_lock`.
    async fn flush(&self) -> Result<Option<PushStatus>, SyncError> {
        let mut queue = self.load_queue()?;
        let mut last = None;

        while let Some(pending) = queue.first().cloned() {
            match self.push(&pending).await {
                Ok(commit) => {
                    queue.remove(0);
                    self.store_queue(&queue)?;

                    if let Some(merged) = commit.merged {
                        // Re-apply what is still queued for this collection
                        let local = queue
                            .iter()
                            .filter(|p| p.collection == pending.collection)
                            .fold(merged, |acc, p| p.mutation.apply(acc));
                        self.cache.write_collection(&pending.collection, &local)?;
                    }

                    tracing::debug!(
                        "Pushed '{}' at version {}",
                        pending.collection,
                        commit.version
                    );
                    last = Some(PushStatus::Pushed {
                        version: commit.version,
                        updated_at: commit.updated_at,
                    });
                }
                Err(PushFailure::Local(e)) => return Err(e),
                Err(failure) => {
                    tracing::warn!(
                        "Push of '{}' failed, {} write(s) queued: {}",
                        pending.collection,
                        queue.len(),
                        failure
                    );
                    return Ok(Some(PushStatus::Queued {
                        reason: failure.to_string(),
                    }));
                }
            }
        }

        Ok(last)
    }

    async fn push(&self, pending: &PendingWrite) -> Result<Commit, PushFailure> {
        match self.options.write_mode {
            WriteMode::Overwrite => self.push_document(pending).await,
            WriteMode::Conditional => self.push_collection(pending).await,
        }
    }

    /// Read-modify-write of the whole document. The last writer wins, so a
    /// stale read here drops other devices' concurrent writes.
    async fn push_document(&self, pending: &PendingWrite) -> Result<Commit, PushFailure> {
        let mut doc = self.remote.fetch().await?;
        let records = self
            .cache
            .read_collection(&pending.collection)
            .map_err(SyncError::from)?
            .unwrap_or_default();

        let version = doc.set_collection(&pending.collection, records, now_millis());
        self.remote.replace(&doc).await?;

        Ok(Commit {
            version,
            updated_at: doc.updated_at.unwrap_or_default(),
            merged: None,
        })
    }

    /// Re-applies the mutation to the current remote copy and writes it
    /// back if nobody else wrote the collection in between.
    async fn push_collection(&self, pending: &PendingWrite) -> Result<Commit, PushFailure> {
        let name = pending.collection.as_str();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let doc = self.remote.fetch().await?;
            let expected = doc.version_of(name);

            let base = match doc.collection(name) {
                Some(records) => records.clone(),
                None => self
                    .cache
                    .read_collection(name)
                    .map_err(SyncError::from)?
                    .unwrap_or_default(),
            };
            let records = pending.mutation.apply(base);

            match self.remote.put_collection(name, &records, expected).await? {
                PutOutcome::Committed {
                    version,
                    updated_at,
                } => {
                    return Ok(Commit {
                        version,
                        updated_at,
                        merged: Some(records),
                    })
                }
                PutOutcome::Conflict { current_version } => {
                    tracing::debug!(
                        "Version conflict on '{}': expected {}, found {}",
                        name,
                        expected,
                        current_version
                    );
                    if attempts > self.options.max_retries {
                        return Err(PushFailure::Conflict {
                            collection: name.to_string(),
                            attempts,
                        });
                    }
                }
            }
        }
    }

    fn load_queue(&self) -> Result<Vec<PendingWrite>, SyncError> {
        match self.cache.read_scalar(PENDING_WRITES_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn store_queue(&self, queue: &[PendingWrite]) -> Result<(), SyncError> {
        if queue.is_empty() {
            self.cache.remove_scalar(PENDING_WRITES_KEY)?;
        } else {
            let raw = serde_json::to_string(queue)?;
            self.cache.write_scalar(PENDING_WRITES_KEY, &raw)?;
        }
        Ok(())
    }
}

impl<R> std::fmt::Debug for SyncEngine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("data_dir", &self.cache.data_dir())
            .field("options", &self.options)
            .finish()
    }
}
