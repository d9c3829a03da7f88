//! Contract of the persistence/notification channel behind the controller

use crate::codec::WireState;
use async_trait::async_trait;
use std::sync::Arc;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by a store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("No game record exists")]
    NotFound,

    #[error("A game record already exists")]
    AlreadyExists,

    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Rejected(_) => "STORE_REJECTED",
            StoreError::Unavailable(_) => "STORE_UNAVAILABLE",
            StoreError::NotFound => "NO_GAME",
            StoreError::AlreadyExists => "GAME_EXISTS",
            StoreError::Io(_) | StoreError::Serialization(_) => "STORE_IO",
        }
    }
}

/// Receives every change of the backing record, including echoes of the
/// observer's own writes. `None` means the record was deleted.
pub trait StoreObserver: Send + Sync {
    fn on_state_changed(&self, state: Option<&WireState>);
}

/// A store holding the single shared game record.
///
/// Implementations must deliver changes to every registered observer in the
/// order the writes were acknowledged.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Register an observer; it is immediately told the current record
    async fn init(&self, observer: Arc<dyn StoreObserver>) -> StoreResult<()>;

    /// Create the record from a full state
    async fn create(&self, state: WireState) -> StoreResult<()>;

    /// Replace the whole record
    async fn update(&self, state: WireState) -> StoreResult<()>;

    /// Destroy the record
    async fn delete(&self) -> StoreResult<()>;
}
