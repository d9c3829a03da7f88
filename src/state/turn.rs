use super::{TransitionError, TransitionResult};
use crate::types::*;

impl GameState {
    pub fn set_current_team(&self, team: TeamId) -> GameState {
        let mut next = self.clone();
        next.current_team = team;
        next
    }

    /// Record the multiplier for the next question.
    ///
    /// Scoring transitions never read it back; a caller that wants a
    /// multiplied award computes the product before calling them.
    pub fn set_multiplier(&self, multiplier: u32) -> TransitionResult {
        if multiplier == 0 {
            return Err(TransitionError::InvalidMultiplier(multiplier));
        }
        let mut next = self.clone();
        next.next_multiplier = multiplier;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_current_team() {
        let team = TeamId::new(4).unwrap();
        let state = GameState::default().set_current_team(team);
        assert_eq!(state.current_team(), team);
    }

    #[test]
    fn test_set_multiplier() {
        let state = GameState::default().set_multiplier(3).unwrap();
        assert_eq!(state.next_multiplier(), 3);
        assert_eq!(
            state.set_multiplier(0),
            Err(TransitionError::InvalidMultiplier(0))
        );
    }

    #[test]
    fn test_multiplier_does_not_scale_scoring() {
        let question = ActiveQuestion::new("Q", "A", 400, false).unwrap();
        let state = GameState::default()
            .set_multiplier(2)
            .unwrap()
            .show_question(question)
            .unwrap()
            .mark_correct()
            .unwrap();
        assert_eq!(state.score(state.current_team()), 400);
        assert_eq!(state.next_multiplier(), 2);
    }
}
