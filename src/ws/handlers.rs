//! WebSocket message dispatch
//!
//! Authorization is checked here, then the message is turned into a
//! controller call.

use super::Connection;
use crate::app::AppState;
use crate::codec;
use crate::protocol::{ClientMessage, Role, ServerMessage};
use crate::state::{Action, RandomPick};
use crate::sync::SyncError;
use crate::types::GameState;
use std::sync::Arc;

/// Macro to check host authorization and return early if unauthorized
macro_rules! check_host {
    ($connection:expr, $action:expr) => {
        if $connection.role != Role::Host {
            return Some(ServerMessage::error(
                "UNAUTHORIZED",
                format!("Only host can {}", $action),
            ));
        }
    };
}

fn sync_error(e: SyncError) -> ServerMessage {
    ServerMessage::error(e.code(), e.to_string())
}

fn ack(state: Option<&GameState>) -> ServerMessage {
    ServerMessage::Ack {
        state: state.map(codec::encode),
    }
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    connection: &Connection,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Ping => Some(ServerMessage::Pong),

        ClientMessage::Buzz { team } => {
            match connection.role {
                Role::Host => {}
                Role::Team if connection.team == Some(team) => {}
                _ => {
                    return Some(ServerMessage::error(
                        "UNAUTHORIZED",
                        format!("This screen cannot buzz for {}", team),
                    ))
                }
            }
            match state.controller.buzz(team).await {
                Ok(outcome) => Some(ServerMessage::buzz_result(team, outcome)),
                Err(e) => Some(sync_error(e)),
            }
        }

        // Host-only commands
        ClientMessage::HostAction { action } => {
            check_host!(connection, action.name());
            handle_action(state, action).await
        }

        ClientMessage::HostRandomSwing => {
            check_host!(connection, "trigger a random swing");
            let pick = RandomPick::draw(&mut rand::rng());
            tracing::info!("Random swing picked {} for {}", pick.swing, pick.team);
            handle_action(state, Action::RandomSwing { pick }).await
        }

        ClientMessage::HostCreateGame => {
            check_host!(connection, "create a game");
            match state.controller.create_game().await {
                Ok(game) => Some(ack(Some(&game))),
                Err(e) => Some(sync_error(e)),
            }
        }

        ClientMessage::HostDeleteGame => {
            check_host!(connection, "delete the game");
            match state.controller.delete_game().await {
                Ok(()) => Some(ack(None)),
                Err(e) => Some(sync_error(e)),
            }
        }
    }
}

async fn handle_action(state: &Arc<AppState>, action: Action) -> Option<ServerMessage> {
    match state.controller.apply(action).await {
        Ok(next) => Some(ack(Some(&next))),
        Err(e) => Some(sync_error(e)),
    }
}
