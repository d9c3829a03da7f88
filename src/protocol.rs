use crate::codec::WireState;
use crate::state::Action;
use crate::sync::BuzzOutcome;
use crate::types::TeamId;
use serde::{Deserialize, Serialize};

/// Which screen a connection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Host,
    Team,
    Display,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    // Host-only messages
    HostAction {
        action: Action,
    },
    /// Roll a random team and swing on the server
    HostRandomSwing,
    HostCreateGame,
    HostDeleteGame,
    /// Claim the open buzzer race (team screens may only buzz for themselves)
    Buzz {
        team: TeamId,
    },
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        role: Role,
        team: Option<TeamId>,
        /// `None` while no game exists
        state: Option<WireState>,
    },
    /// Shared state changed (sent to every connection)
    State {
        state: Option<WireState>,
        server_now: String,
    },
    /// Host write accepted; carries the resulting state
    Ack {
        state: Option<WireState>,
    },
    BuzzResult {
        team: TeamId,
        won: bool,
        /// Team holding the race after this attempt
        winner: TeamId,
    },
    Pong,
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn buzz_result(team: TeamId, outcome: BuzzOutcome) -> Self {
        match outcome {
            BuzzOutcome::Won => ServerMessage::BuzzResult {
                team,
                won: true,
                winner: team,
            },
            BuzzOutcome::TooLate { winner } => ServerMessage::BuzzResult {
                team,
                won: false,
                winner,
            },
        }
    }

    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }
}
