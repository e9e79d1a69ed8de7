use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};

use crate::models::{AvailabilitySnapshot, DateRange, Entry, RemovedCounts};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize bookings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("bookings document {path} is unreadable: {reason}")]
    Corrupt { path: String, reason: String },
}

/// Single JSON document holding every booking and block.
///
/// Reads never lock; readers see either the old or the new document because
/// writes go to a temp file that is renamed into place. Mutations go through
/// [`AvailabilityStore::transaction`], which serializes them on one lock so a
/// check-then-insert cannot interleave with another writer.
pub struct AvailabilityStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    last_id: AtomicI64,
}

impl AvailabilityStore {
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let store = Self {
            path,
            write_lock: Mutex::new(()),
            last_id: AtomicI64::new(0),
        };

        let snapshot = store.load().await;
        if let Some(max) = snapshot.max_numeric_id() {
            store.last_id.store(max, Ordering::SeqCst);
        }
        tracing::info!(
            path = %store.path.display(),
            bookings = snapshot.bookings.len(),
            blocks = snapshot.blocks.len(),
            "opened availability store"
        );

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current state. A missing or unreadable document yields an empty
    /// snapshot so the public calendar stays up; corruption is logged.
    pub async fn load(&self) -> AvailabilitySnapshot {
        match self.read_document().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(error = %e, "failed to read bookings, serving empty availability");
                AvailabilitySnapshot::default()
            }
        }
    }

    async fn read_document(&self) -> Result<AvailabilitySnapshot, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AvailabilitySnapshot::default()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub async fn save(&self, snapshot: &AvailabilitySnapshot) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write_atomic(snapshot).await
    }

    async fn write_atomic(&self, snapshot: &AvailabilitySnapshot) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(snapshot)?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&body).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    pub async fn is_occupied(&self, range: &DateRange) -> bool {
        self.load().await.is_occupied(range)
    }

    /// Appends without re-validating; the caller has already checked the range
    /// is free. Prefer a [`StoreTransaction`] when the check and the insert
    /// must be one step.
    pub async fn insert(&self, entry: Entry) -> Result<(), StoreError> {
        let mut txn = self.transaction().await?;
        txn.insert(entry);
        txn.commit().await
    }

    /// Removes any booking or block with `id`. Absent ids are a no-op.
    pub async fn remove(&self, id: &str) -> Result<RemovedCounts, StoreError> {
        let mut txn = self.transaction().await?;
        let removed = txn.remove(id);
        if removed == RemovedCounts::default() {
            return Ok(removed);
        }
        txn.commit().await?;
        Ok(removed)
    }

    /// Takes the write lock and loads the document strictly: a corrupt file
    /// fails the mutation instead of being overwritten with an empty one.
    pub async fn transaction(&self) -> Result<StoreTransaction<'_>, StoreError> {
        let guard = self.write_lock.lock().await;
        let snapshot = self.read_document().await?;
        Ok(StoreTransaction {
            _guard: guard,
            store: self,
            snapshot,
        })
    }

    /// Millisecond timestamp id, strictly increasing within the process.
    pub fn next_id(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last_id.load(Ordering::SeqCst);
        loop {
            let next = now.max(last.saturating_add(1));
            match self
                .last_id
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next.to_string(),
                Err(actual) => last = actual,
            }
        }
    }
}

pub struct StoreTransaction<'a> {
    _guard: MutexGuard<'a, ()>,
    store: &'a AvailabilityStore,
    snapshot: AvailabilitySnapshot,
}

impl StoreTransaction<'_> {
    pub fn snapshot(&self) -> &AvailabilitySnapshot {
        &self.snapshot
    }

    pub fn is_occupied(&self, range: &DateRange) -> bool {
        self.snapshot.is_occupied(range)
    }

    pub fn insert(&mut self, entry: Entry) {
        self.snapshot.insert(entry);
    }

    pub fn remove(&mut self, id: &str) -> RemovedCounts {
        self.snapshot.remove(id)
    }

    pub async fn commit(self) -> Result<(), StoreError> {
        self.store.write_atomic(&self.snapshot).await
    }
}
