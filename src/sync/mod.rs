//! Synchronization controller
//!
//! Bridges the pure transitions in [`crate::state`] to a [`GameStore`]:
//! a transition is computed against the locally observed state, written to
//! the store as a full record and committed locally once acknowledged.
//! Every broadcast from the store replaces the local state unconditionally.

pub mod memory;
pub mod store;

pub use memory::{MemoryStore, StoredRecord};
pub use store::{GameStore, StoreError, StoreObserver, StoreResult};

use crate::codec::{self, WireState};
use crate::config::SyncConfig;
use crate::state::{Action, TransitionError};
use crate::types::{GameState, TeamId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};

/// Errors surfaced to the caller of a controller operation
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("No game loaded")]
    NoGame,

    #[error("Live writes are disabled")]
    WritesDisabled,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::NoGame => "NO_GAME",
            SyncError::WritesDisabled => "WRITES_DISABLED",
            SyncError::Transition(e) => e.code(),
            SyncError::Store(e) => e.code(),
        }
    }
}

/// How a buzz attempt ended. Losing the race is an outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BuzzOutcome {
    Won,
    TooLate { winner: TeamId },
}

/// Local view of the shared state, fed by store broadcasts
struct LocalState {
    current: watch::Sender<Option<GameState>>,
    /// Every broadcast in delivery order, for race resolution
    feed: broadcast::Sender<Option<GameState>>,
}

impl LocalState {
    fn replace(&self, state: Option<GameState>) {
        self.current.send_replace(state);
    }
}

impl StoreObserver for LocalState {
    fn on_state_changed(&self, wire: Option<&WireState>) {
        let state = wire.map(codec::decode);
        match &state {
            Some(s) => {
                if let Err(e) = s.validate() {
                    tracing::warn!("Broadcast state is inconsistent: {}", e);
                }
                tracing::debug!("Received broadcast state");
            }
            None => tracing::debug!("Received broadcast deletion"),
        }
        // No feed subscribers outside a buzz is fine
        let _ = self.feed.send(state.clone());
        self.replace(state);
    }
}

pub struct SyncController {
    store: Arc<dyn GameStore>,
    config: SyncConfig,
    local: Arc<LocalState>,
    /// Serializes this controller's writes so each one is computed against
    /// the state left by the previous one
    write_lock: Mutex<()>,
}

impl SyncController {
    pub fn new(store: Arc<dyn GameStore>, config: SyncConfig) -> Self {
        let (current, _) = watch::channel(None);
        let (feed, _) = broadcast::channel(64);
        Self {
            store,
            config,
            local: Arc::new(LocalState { current, feed }),
            write_lock: Mutex::new(()),
        }
    }

    /// Subscribe to the store; the current record (if any) becomes local state
    pub async fn init(&self) -> Result<(), SyncError> {
        self.store.init(self.local.clone()).await?;
        Ok(())
    }

    /// Last known state, `None` when no game exists
    pub fn current(&self) -> Option<GameState> {
        self.local.current.borrow().clone()
    }

    /// Receive every new local state (accepted transitions and broadcasts)
    pub fn subscribe(&self) -> watch::Receiver<Option<GameState>> {
        self.local.current.subscribe()
    }

    fn ensure_writable(&self) -> Result<(), SyncError> {
        if !self.config.allow_writes {
            tracing::warn!("Live writes are disabled, refusing to write");
            return Err(SyncError::WritesDisabled);
        }
        Ok(())
    }

    /// Apply `action` to the current state and write the result.
    ///
    /// A refused transition never reaches the store. A rejected write leaves
    /// local state untouched; there is no automatic retry.
    pub async fn apply(&self, action: Action) -> Result<GameState, SyncError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_writable()?;
        let current = self.current().ok_or(SyncError::NoGame)?;

        let next = match current.apply(&action) {
            Ok(next) => next,
            Err(e) => {
                tracing::info!("Refused {}: {}", action.name(), e);
                return Err(e.into());
            }
        };

        self.submit(&next).await?;
        tracing::info!("Applied {}", action.name());
        Ok(next)
    }

    /// Claim the open buzzer race for `team`.
    ///
    /// The local state is checked right before writing. If a rival's winning
    /// write turns out to have been acknowledged before ours, the race is
    /// reported as lost and the rival's state is written back, unless a
    /// newer write has already replaced ours.
    pub async fn buzz(&self, team: TeamId) -> Result<BuzzOutcome, SyncError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_writable()?;
        // Subscribe before reading so no broadcast falls between the two
        let mut feed = self.local.feed.subscribe();
        let current = self.current().ok_or(SyncError::NoGame)?;

        let next = match current.buzz_in(team) {
            Ok(next) => next,
            Err(TransitionError::TooLate { winner }) => {
                tracing::info!("{} buzzed too late, {} already won", team, winner);
                return Ok(BuzzOutcome::TooLate { winner });
            }
            Err(e) => return Err(e.into()),
        };

        self.submit(&next).await?;

        match self.rival_before_echo(&mut feed, &next).await {
            Some(rival) => {
                let winner = rival.buzzer_winner().unwrap_or(team);
                if let Some(latest) = newer_broadcast(&mut feed) {
                    // Someone wrote after our echo; restoring the rival would erase it
                    tracing::warn!(
                        "{} lost the buzzer race to {}, already superseded by a newer write",
                        team,
                        winner
                    );
                    self.local.replace(latest);
                    return Ok(BuzzOutcome::TooLate { winner });
                }
                tracing::warn!(
                    "{} lost the buzzer race to {}, restoring the winner",
                    team,
                    winner
                );
                self.submit(&rival).await?;
                Ok(BuzzOutcome::TooLate { winner })
            }
            None => {
                tracing::info!("{} won the buzzer race", team);
                Ok(BuzzOutcome::Won)
            }
        }
    }

    /// Scan broadcasts up to the echo of `own` for a winning write by
    /// another team that was not followed by a re-opened race
    async fn rival_before_echo(
        &self,
        feed: &mut broadcast::Receiver<Option<GameState>>,
        own: &GameState,
    ) -> Option<GameState> {
        let deadline = tokio::time::Instant::now() + self.config.echo_timeout;
        let mut rival = None;
        loop {
            match tokio::time::timeout_at(deadline, feed.recv()).await {
                Ok(Ok(Some(state))) => {
                    if &state == own {
                        return rival;
                    }
                    if state.buzzer_active() {
                        rival = None;
                    } else if state.buzzer_winner().is_some()
                        && state.buzzer_winner() != own.buzzer_winner()
                    {
                        rival = Some(state);
                    }
                }
                Ok(Ok(None)) => rival = None,
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    tracing::warn!("Missed {} broadcasts while waiting for buzz echo", skipped);
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => return rival,
                Err(_) => {
                    tracing::warn!(
                        "No echo for buzz within {:?}, keeping the result",
                        self.config.echo_timeout
                    );
                    return rival;
                }
            }
        }
    }

    /// Write the default game and adopt it locally
    pub async fn create_game(&self) -> Result<GameState, SyncError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_writable()?;
        let state = GameState::default();
        self.store.create(codec::encode(&state)).await?;
        self.local.replace(Some(state.clone()));
        tracing::info!("Game created");
        Ok(state)
    }

    /// Destroy the game. Local state is cleared even when the store refuses,
    /// and the store's error is still reported.
    pub async fn delete_game(&self) -> Result<(), SyncError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_writable()?;
        let result = self.store.delete().await;
        self.local.replace(None);
        match &result {
            Ok(()) => tracing::info!("Game deleted"),
            Err(e) => tracing::warn!("Game delete failed, local state cleared anyway: {}", e),
        }
        result.map_err(SyncError::from)
    }

    /// Full-state write followed by the optimistic local commit
    async fn submit(&self, next: &GameState) -> Result<(), SyncError> {
        if let Err(e) = self.store.update(codec::encode(next)).await {
            tracing::warn!("Store rejected update: {}", e);
            return Err(e.into());
        }
        self.local.replace(Some(next.clone()));
        Ok(())
    }
}

/// Drain whatever was broadcast after the buzz echo, returning the latest
fn newer_broadcast(
    feed: &mut broadcast::Receiver<Option<GameState>>,
) -> Option<Option<GameState>> {
    let mut latest = None;
    loop {
        match feed.try_recv() {
            Ok(state) => latest = Some(state),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => return latest,
        }
    }
}
