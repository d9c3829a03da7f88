//! Question lifecycle: Board -> QuestionShown -> AnswerRevealed -> Board

use super::{TransitionError, TransitionResult};
use crate::types::*;

impl GameState {
    /// Put a question on every screen with its answer hidden.
    ///
    /// Replaces whatever question was showing; the board slot is recorded
    /// separately (see `Action::ShowQuestion`).
    pub fn show_question(&self, question: ActiveQuestion) -> TransitionResult {
        if question.value == 0 {
            return Err(TransitionError::InvalidQuestionValue);
        }
        let mut next = self.clone();
        next.active_question = Some(question);
        next.answer_revealed = false;
        Ok(next)
    }

    pub fn reveal_answer(&self) -> TransitionResult {
        if self.active_question.is_none() {
            return Err(TransitionError::NoActiveQuestion);
        }
        let mut next = self.clone();
        next.answer_revealed = true;
        Ok(next)
    }

    pub fn return_to_board(&self) -> GameState {
        let mut next = self.clone();
        next.active_question = None;
        next.answer_revealed = false;
        next
    }

    /// Award the question's value to the current team and reveal the answer
    pub fn mark_correct(&self) -> TransitionResult {
        let points = self.active_points()?;
        let mut next = self.add_points(self.current_team, points)?;
        next.answer_revealed = true;
        Ok(next)
    }

    /// Take the question's value from the current team. The answer stays
    /// hidden (or shown) as it was, so another team can still try.
    pub fn mark_wrong(&self) -> TransitionResult {
        let points = self.active_points()?;
        self.subtract_points(self.current_team, points)
    }

    fn active_points(&self) -> Result<i64, TransitionError> {
        self.active_question
            .as_ref()
            .map(ActiveQuestion::points)
            .ok_or(TransitionError::NoActiveQuestion)
    }
}
