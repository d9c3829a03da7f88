use super::{TransitionError, TransitionResult};
use crate::types::*;

/// Flat bonus a team receives for spending a candy
pub const CANDY_BONUS: i64 = 50;

/// Multiplier set for the next question when an ornament is spent
pub const ORNAMENT_MULTIPLIER: u32 = 2;

impl GameState {
    pub fn grant_powerup(&self, team: TeamId, kind: PowerupKind) -> GameState {
        let mut next = self.clone();
        let count = next.team_powerups[team.index()].count_mut(kind);
        *count = count.saturating_add(1);
        next
    }

    /// Spend one unit of `kind` and apply its fixed effect
    pub fn use_powerup(&self, team: TeamId, kind: PowerupKind) -> TransitionResult {
        if self.powerups(team).count(kind) == 0 {
            return Err(TransitionError::InsufficientPowerup { team, kind });
        }

        let mut next = match kind {
            PowerupKind::Candy => self.add_points(team, CANDY_BONUS)?,
            PowerupKind::Ornament => {
                let mut next = self.clone();
                next.next_multiplier = ORNAMENT_MULTIPLIER;
                next
            }
        };
        *next.team_powerups[team.index()].count_mut(kind) -= 1;
        Ok(next)
    }
}
