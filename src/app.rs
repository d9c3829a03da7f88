use crate::protocol::ServerMessage;
use crate::sync::SyncController;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shared server state handed to every connection
pub struct AppState {
    pub controller: Arc<SyncController>,
    /// Broadcast channel for messages to all connected screens
    pub broadcast: broadcast::Sender<ServerMessage>,
}

impl AppState {
    pub fn new(controller: Arc<SyncController>) -> Self {
        let (broadcast, _) = broadcast::channel(100);
        Self {
            controller,
            broadcast,
        }
    }
}
