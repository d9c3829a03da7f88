use super::{TransitionError, TransitionResult};
use crate::types::*;

impl GameState {
    /// Add `slots` to the used set. Already-used slots are ignored.
    pub fn mark_used(&self, slots: impl IntoIterator<Item = u8>) -> TransitionResult {
        let mut next = self.clone();
        for slot in slots {
            if slot >= QUESTION_SLOTS {
                return Err(TransitionError::InvalidSlot(slot));
            }
            next.used_questions.insert(slot);
        }
        Ok(next)
    }

    pub fn mark_all_used(&self) -> GameState {
        let mut next = self.clone();
        next.used_questions.extend(0..QUESTION_SLOTS);
        next
    }

    pub fn rename_team(&self, team: TeamId, name: &str) -> TransitionResult {
        let name = checked_label(name)?;
        let mut next = self.clone();
        next.team_names[team.index()] = name;
        Ok(next)
    }

    pub fn set_avatar(&self, team: TeamId, avatar: &str) -> TransitionResult {
        let avatar = checked_label(avatar)?;
        let mut next = self.clone();
        next.team_avatars[team.index()] = avatar;
        Ok(next)
    }
}

/// Labels travel in comma-joined lists and must not contain the delimiter
fn checked_label(label: &str) -> Result<String, TransitionError> {
    let trimmed = label.trim();
    if trimmed.is_empty() || trimmed.contains(',') {
        return Err(TransitionError::InvalidTeamName(label.to_string()));
    }
    Ok(trimmed.to_string())
}
