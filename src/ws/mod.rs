pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::app::AppState;
use crate::broadcast;
use crate::codec;
use crate::protocol::{ClientMessage, Role, ServerMessage};
use crate::types::TeamId;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub role: Option<String>,
    pub team: Option<u8>,
}

/// A connected screen. Team screens are bound to exactly one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub role: Role,
    pub team: Option<TeamId>,
}

impl Connection {
    pub fn host() -> Self {
        Self {
            role: Role::Host,
            team: None,
        }
    }

    pub fn team(team: TeamId) -> Self {
        Self {
            role: Role::Team,
            team: Some(team),
        }
    }

    pub fn display() -> Self {
        Self {
            role: Role::Display,
            team: None,
        }
    }

    /// Resolve the connection from the upgrade query
    pub fn from_query(params: &WsQuery) -> Result<Self, String> {
        match params.role.as_deref() {
            Some("host") => Ok(Self::host()),
            Some("team") => {
                let number = params
                    .team
                    .ok_or_else(|| "team role requires a team number".to_string())?;
                let team = TeamId::new(number).map_err(|e| e.to_string())?;
                Ok(Self::team(team))
            }
            Some("display") | None => Ok(Self::display()),
            Some(other) => Err(format!("unknown role {:?}", other)),
        }
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    tracing::info!(
        "WebSocket connection request: role={:?}, team={:?}",
        params.role,
        params.team
    );

    let connection = match Connection::from_query(&params) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!("Refusing WebSocket connection: {}", e);
            return (StatusCode::BAD_REQUEST, e).into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, connection, state))
}

async fn send_json(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            true
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, connection: Connection, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    tracing::info!("WebSocket connected: {:?}", connection);

    // Subscribe before the welcome so no change falls in between
    let mut broadcast_rx = state.broadcast.subscribe();

    let welcome = ServerMessage::Welcome {
        role: connection.role,
        team: connection.team,
        state: state.controller.current().as_ref().map(codec::encode),
    };
    if !send_json(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        return;
    }

    loop {
        tokio::select! {
            broadcast_msg = broadcast_rx.recv() => {
                match broadcast_msg {
                    Ok(msg) => {
                        if !send_json(&mut sender, &msg).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Only the latest state matters
                        tracing::warn!(
                            "Connection lagged by {} messages, resending state",
                            skipped
                        );
                        let current = state.controller.current();
                        let msg = broadcast::state_message(current.as_ref());
                        if !send_json(&mut sender, &msg).await {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                handlers::handle_message(client_msg, &connection, &state).await
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::error(
                                    "PARSE_ERROR",
                                    format!("Invalid message format: {}", e),
                                ))
                            }
                        };

                        if let Some(response) = response {
                            if !send_json(&mut sender, &response).await {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed: {:?}", connection);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(role: Option<&str>, team: Option<u8>) -> WsQuery {
        WsQuery {
            role: role.map(str::to_string),
            team,
        }
    }

    #[test]
    fn test_connection_from_query() {
        assert_eq!(
            Connection::from_query(&query(Some("host"), None)).unwrap(),
            Connection::host()
        );
        assert_eq!(
            Connection::from_query(&query(None, None)).unwrap(),
            Connection::display()
        );
        assert_eq!(
            Connection::from_query(&query(Some("team"), Some(5))).unwrap(),
            Connection::team(TeamId::new(5).unwrap())
        );
    }

    #[test]
    fn test_connection_query_errors() {
        assert!(Connection::from_query(&query(Some("team"), None)).is_err());
        assert!(Connection::from_query(&query(Some("team"), Some(0))).is_err());
        assert!(Connection::from_query(&query(Some("admin"), None)).is_err());
    }
}
