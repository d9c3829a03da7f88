//! Transition engine
//!
//! Every transition is a method on [`GameState`] that borrows the current
//! state and returns the next one. Nothing here touches the store, a lock or
//! the clock, so any sequence of actions can be replayed in a unit test.

mod board;
mod buzzer;
mod powerup;
mod question;
mod score;
mod turn;

pub use powerup::{CANDY_BONUS, ORNAMENT_MULTIPLIER};
pub use score::{RandomPick, GROUP_PENALTY, RANDOM_SWINGS, STEAL_AMOUNT};

use crate::types::*;
use serde::{Deserialize, Serialize};

/// Result type for transitions
pub type TransitionResult = Result<GameState, TransitionError>;

/// Why a transition was refused. The input state is always left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Team {0} does not exist (expected 1-5)")]
    InvalidTeam(u8),

    #[error("Question slot {0} does not exist (expected 0-19)")]
    InvalidSlot(u8),

    #[error("Multiplier must be at least 1, got {0}")]
    InvalidMultiplier(u32),

    #[error("Question value must be positive")]
    InvalidQuestionValue,

    #[error("Invalid team label: {0:?}")]
    InvalidTeamName(String),

    #[error("Swing {0} is not one of the random event amounts")]
    InvalidSwing(i64),

    #[error("No active question")]
    NoActiveQuestion,

    #[error("{team} has no {kind} left")]
    InsufficientPowerup { team: TeamId, kind: PowerupKind },

    #[error("Score of {team} would leave the representable range")]
    ScoreOverflow { team: TeamId },

    #[error("All scores are equal, nothing to steal")]
    ScoresTooClose,

    #[error("Buzzer is not open")]
    RaceNotOpen,

    #[error("Too late, {winner} already buzzed in")]
    TooLate { winner: TeamId },
}

impl TransitionError {
    /// Stable code sent to clients alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            TransitionError::InvalidTeam(_) => "INVALID_TEAM",
            TransitionError::InvalidSlot(_) => "INVALID_SLOT",
            TransitionError::InvalidMultiplier(_) => "INVALID_MULTIPLIER",
            TransitionError::InvalidQuestionValue => "INVALID_QUESTION_VALUE",
            TransitionError::InvalidTeamName(_) => "INVALID_TEAM_NAME",
            TransitionError::InvalidSwing(_) => "INVALID_SWING",
            TransitionError::NoActiveQuestion => "NO_ACTIVE_QUESTION",
            TransitionError::InsufficientPowerup { .. } => "INSUFFICIENT_POWERUP",
            TransitionError::ScoreOverflow { .. } => "SCORE_OVERFLOW",
            TransitionError::ScoresTooClose => "SCORES_TOO_CLOSE",
            TransitionError::RaceNotOpen => "RACE_NOT_OPEN",
            TransitionError::TooLate { .. } => "TOO_LATE",
        }
    }
}

fn default_steal_amount() -> i64 {
    STEAL_AMOUNT
}

fn default_group_penalty() -> i64 {
    GROUP_PENALTY
}

/// A host (or buzzing team) intent, as sent over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    // Scoring
    AddPoints {
        team: TeamId,
        points: i64,
    },
    SubtractPoints {
        team: TeamId,
        points: i64,
    },
    SetScore {
        team: TeamId,
        score: i64,
    },
    SwapScores {
        a: TeamId,
        b: TeamId,
    },
    StealFromLeader {
        #[serde(default = "default_steal_amount")]
        amount: i64,
    },
    GroupPenalty {
        #[serde(default = "default_group_penalty")]
        points: i64,
    },
    RandomSwing {
        pick: RandomPick,
    },

    // Turn & multiplier
    SetCurrentTeam {
        team: TeamId,
    },
    SetMultiplier {
        multiplier: u32,
    },

    // Question lifecycle
    ShowQuestion {
        question: ActiveQuestion,
        /// Board slot to record as used together with showing the question
        #[serde(default)]
        slot: Option<u8>,
    },
    RevealAnswer,
    ReturnToBoard,
    MarkCorrect,
    MarkWrong,

    // Power-ups
    GrantPowerup {
        team: TeamId,
        kind: PowerupKind,
    },
    UsePowerup {
        team: TeamId,
        kind: PowerupKind,
    },

    // Buzzer race
    OpenBuzzer,
    BuzzIn {
        team: TeamId,
    },
    CloseBuzzer,

    // Board bookkeeping
    MarkUsed {
        slots: Vec<u8>,
    },
    MarkAllUsed,
    RenameTeam {
        team: TeamId,
        name: String,
    },
    SetAvatar {
        team: TeamId,
        avatar: String,
    },
}

impl Action {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddPoints { .. } => "add_points",
            Action::SubtractPoints { .. } => "subtract_points",
            Action::SetScore { .. } => "set_score",
            Action::SwapScores { .. } => "swap_scores",
            Action::StealFromLeader { .. } => "steal_from_leader",
            Action::GroupPenalty { .. } => "group_penalty",
            Action::RandomSwing { .. } => "random_swing",
            Action::SetCurrentTeam { .. } => "set_current_team",
            Action::SetMultiplier { .. } => "set_multiplier",
            Action::ShowQuestion { .. } => "show_question",
            Action::RevealAnswer => "reveal_answer",
            Action::ReturnToBoard => "return_to_board",
            Action::MarkCorrect => "mark_correct",
            Action::MarkWrong => "mark_wrong",
            Action::GrantPowerup { .. } => "grant_powerup",
            Action::UsePowerup { .. } => "use_powerup",
            Action::OpenBuzzer => "open_buzzer",
            Action::BuzzIn { .. } => "buzz_in",
            Action::CloseBuzzer => "close_buzzer",
            Action::MarkUsed { .. } => "mark_used",
            Action::MarkAllUsed => "mark_all_used",
            Action::RenameTeam { .. } => "rename_team",
            Action::SetAvatar { .. } => "set_avatar",
        }
    }
}

impl GameState {
    /// Compute the state that results from `action`
    pub fn apply(&self, action: &Action) -> TransitionResult {
        match action {
            Action::AddPoints { team, points } => self.add_points(*team, *points),
            Action::SubtractPoints { team, points } => self.subtract_points(*team, *points),
            Action::SetScore { team, score } => Ok(self.set_score(*team, *score)),
            Action::SwapScores { a, b } => Ok(self.swap_scores(*a, *b)),
            Action::StealFromLeader { amount } => self.steal_from_leader(*amount),
            Action::GroupPenalty { points } => self.group_penalty(*points),
            Action::RandomSwing { pick } => self.random_swing(*pick),
            Action::SetCurrentTeam { team } => Ok(self.set_current_team(*team)),
            Action::SetMultiplier { multiplier } => self.set_multiplier(*multiplier),
            Action::ShowQuestion { question, slot } => {
                let shown = self.show_question(question.clone())?;
                match slot {
                    Some(slot) => shown.mark_used([*slot]),
                    None => Ok(shown),
                }
            }
            Action::RevealAnswer => self.reveal_answer(),
            Action::ReturnToBoard => Ok(self.return_to_board()),
            Action::MarkCorrect => self.mark_correct(),
            Action::MarkWrong => self.mark_wrong(),
            Action::GrantPowerup { team, kind } => Ok(self.grant_powerup(*team, *kind)),
            Action::UsePowerup { team, kind } => self.use_powerup(*team, *kind),
            Action::OpenBuzzer => Ok(self.open_buzzer()),
            Action::BuzzIn { team } => self.buzz_in(*team),
            Action::CloseBuzzer => Ok(self.close_buzzer()),
            Action::MarkUsed { slots } => self.mark_used(slots.iter().copied()),
            Action::MarkAllUsed => Ok(self.mark_all_used()),
            Action::RenameTeam { team, name } => self.rename_team(*team, name),
            Action::SetAvatar { team, avatar } => self.set_avatar(*team, avatar),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(n: u8) -> TeamId {
        TeamId::new(n).unwrap()
    }

    #[test]
    fn test_failed_transition_leaves_input_unchanged() {
        let state = GameState::default();
        let before = state.clone();

        let result = state.apply(&Action::MarkCorrect);
        assert_eq!(result, Err(TransitionError::NoActiveQuestion));
        assert_eq!(state, before);
    }

    #[test]
    fn test_show_question_with_slot_marks_it_used() {
        let question = ActiveQuestion::new("Q", "A", 200, false).unwrap();
        let state = GameState::default()
            .apply(&Action::ShowQuestion {
                question,
                slot: Some(7),
            })
            .unwrap();

        assert_eq!(state.question_phase(), QuestionPhase::QuestionShown);
        assert!(state.is_used(7));
    }

    #[test]
    fn test_show_question_with_bad_slot_is_refused() {
        let question = ActiveQuestion::new("Q", "A", 200, false).unwrap();
        let result = GameState::default().apply(&Action::ShowQuestion {
            question,
            slot: Some(20),
        });
        assert_eq!(result, Err(TransitionError::InvalidSlot(20)));
    }

    #[test]
    fn test_action_json_shape() {
        let action: Action =
            serde_json::from_str(r#"{"type":"use_powerup","team":2,"kind":"candy"}"#).unwrap();
        assert_eq!(
            action,
            Action::UsePowerup {
                team: team(2),
                kind: PowerupKind::Candy
            }
        );

        let action: Action = serde_json::from_str(r#"{"type":"steal_from_leader"}"#).unwrap();
        assert_eq!(action, Action::StealFromLeader { amount: 150 });
    }

    #[test]
    fn test_action_with_unknown_team_does_not_parse() {
        let result = serde_json::from_str::<Action>(r#"{"type":"set_current_team","team":6}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(TransitionError::ScoresTooClose.code(), "SCORES_TOO_CLOSE");
        assert_eq!(
            TransitionError::ScoreOverflow { team: team(2) }.code(),
            "SCORE_OVERFLOW"
        );
        assert_eq!(
            TransitionError::TooLate { winner: team(1) }.code(),
            "TOO_LATE"
        );
        assert_eq!(
            TransitionError::TooLate { winner: team(3) }.to_string(),
            "Too late, Team 3 already buzzed in"
        );
    }
}
