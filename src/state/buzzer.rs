//! Buzz-in race: Closed -> Open -> Won, with Closed reachable from anywhere

use super::{TransitionError, TransitionResult};
use crate::types::*;

impl GameState {
    /// Start a new race, forgetting the previous winner
    pub fn open_buzzer(&self) -> GameState {
        let mut next = self.clone();
        next.buzzer_active = true;
        next.buzzer_winner = None;
        next
    }

    /// Claim the open race for `team`.
    ///
    /// Only valid while the race is open; once a winner is set every further
    /// attempt reports who got there first.
    pub fn buzz_in(&self, team: TeamId) -> TransitionResult {
        match self.buzzer_phase() {
            BuzzerPhase::Open => {
                let mut next = self.clone();
                next.buzzer_active = false;
                next.buzzer_winner = Some(team);
                Ok(next)
            }
            BuzzerPhase::Won { winner } => Err(TransitionError::TooLate { winner }),
            BuzzerPhase::Closed => Err(TransitionError::RaceNotOpen),
        }
    }

    /// Abort or reset the race with no winner
    pub fn close_buzzer(&self) -> GameState {
        let mut next = self.clone();
        next.buzzer_active = false;
        next.buzzer_winner = None;
        next
    }
}
