//! In-process store with optional JSON snapshot persistence

use super::store::{GameStore, StoreError, StoreObserver, StoreResult};
use crate::codec::WireState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The stored game record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Assigned on create, kept across updates
    pub id: String,
    /// Time of the last accepted write (RFC 3339)
    pub updated_at: String,
    pub state: WireState,
}

impl StoredRecord {
    fn new(state: WireState) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            updated_at: chrono::Utc::now().to_rfc3339(),
            state,
        }
    }
}

#[derive(Default)]
struct Inner {
    record: Option<StoredRecord>,
    observers: Vec<Arc<dyn StoreObserver>>,
}

/// Store that keeps the record in memory and notifies observers
/// synchronously, so broadcasts are delivered in write order before the
/// write is acknowledged.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    reject_writes: AtomicBool,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store backed by a snapshot file, reloading it if it exists
    pub async fn with_snapshot(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let record = match tokio::fs::read_to_string(&path).await {
            Ok(json) => {
                let record: StoredRecord = serde_json::from_str(&json)?;
                tracing::info!("Loaded game record {} from {}", record.id, path.display());
                Some(record)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            inner: Mutex::new(Inner {
                record,
                observers: Vec::new(),
            }),
            reject_writes: AtomicBool::new(false),
            snapshot_path: Some(path),
        })
    }

    /// Make every following write fail until switched off again
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Current record, if a game exists
    pub async fn record(&self) -> Option<StoredRecord> {
        self.inner.lock().await.record.clone()
    }

    pub async fn observer_count(&self) -> usize {
        self.inner.lock().await.observers.len()
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("store is rejecting writes".to_string()));
        }
        Ok(())
    }

    async fn persist(&self, record: Option<&StoredRecord>) -> StoreResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        match record {
            Some(record) => {
                let json = serde_json::to_string_pretty(record)?;
                tokio::fs::write(path, json).await?;
            }
            None => match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }

    /// Persist, swap in and broadcast a new record while holding the lock
    async fn commit(&self, inner: &mut Inner, record: Option<StoredRecord>) -> StoreResult<()> {
        self.persist(record.as_ref()).await?;
        inner.record = record;
        let state = inner.record.as_ref().map(|r| &r.state);
        for observer in &inner.observers {
            observer.on_state_changed(state);
        }
        tracing::debug!(
            "Broadcast {} to {} observer(s)",
            if state.is_some() { "update" } else { "deletion" },
            inner.observers.len()
        );
        Ok(())
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn init(&self, observer: Arc<dyn StoreObserver>) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        observer.on_state_changed(inner.record.as_ref().map(|r| &r.state));
        inner.observers.push(observer);
        Ok(())
    }

    async fn create(&self, state: WireState) -> StoreResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.lock().await;
        if inner.record.is_some() {
            return Err(StoreError::AlreadyExists);
        }
        let record = StoredRecord::new(state);
        tracing::info!("Created game record {}", record.id);
        self.commit(&mut inner, Some(record)).await
    }

    async fn update(&self, state: WireState) -> StoreResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.lock().await;
        let Some(current) = &inner.record else {
            return Err(StoreError::NotFound);
        };
        let record = StoredRecord {
            id: current.id.clone(),
            updated_at: chrono::Utc::now().to_rfc3339(),
            state,
        };
        self.commit(&mut inner, Some(record)).await
    }

    async fn delete(&self) -> StoreResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.lock().await;
        if inner.record.is_none() {
            return Err(StoreError::NotFound);
        }
        tracing::info!("Deleting game record");
        self.commit(&mut inner, None).await
    }
}
