use crate::app::AppState;
use crate::codec;
use crate::protocol::ServerMessage;
use crate::types::GameState;
use std::sync::Arc;

/// Build the message every screen receives when the shared state changes
pub fn state_message(state: Option<&GameState>) -> ServerMessage {
    ServerMessage::State {
        state: state.map(codec::encode),
        server_now: chrono::Utc::now().to_rfc3339(),
    }
}

/// Spawn a background task that forwards every controller state change to
/// connected screens
pub fn spawn_state_broadcaster(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    let mut updates = state.controller.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let msg = {
                let current = updates.borrow_and_update();
                state_message(current.as_ref())
            };
            tracing::debug!("Broadcasting state change");
            // Ignore send errors (no receivers connected is fine)
            let _ = state.broadcast.send(msg);
        }
        tracing::info!("State broadcaster stopped");
    })
}
