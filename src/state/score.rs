use super::{TransitionError, TransitionResult};
use crate::types::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Points moved from the leader to the last-placed team by a steal
pub const STEAL_AMOUNT: i64 = 150;

/// Points every team loses in a group penalty
pub const GROUP_PENALTY: i64 = 100;

/// Candidate deltas for the random event
pub const RANDOM_SWINGS: [i64; 6] = [100, 200, 300, -100, -200, -300];

/// The outcome of the random event's dice, chosen by the caller so the
/// transition itself stays deterministic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomPick {
    pub team: TeamId,
    pub swing: i64,
}

impl RandomPick {
    pub fn draw<R: Rng>(rng: &mut R) -> Self {
        let index = rng.random_range(0..TEAM_COUNT);
        let swing = RANDOM_SWINGS[rng.random_range(0..RANDOM_SWINGS.len())];
        Self {
            team: TeamId::wrapping_from_index(index),
            swing,
        }
    }
}

impl GameState {
    pub fn add_points(&self, team: TeamId, points: i64) -> TransitionResult {
        let mut next = self.clone();
        next.team_scores[team.index()] = self.checked_score(team, i64::checked_add, points)?;
        Ok(next)
    }

    pub fn subtract_points(&self, team: TeamId, points: i64) -> TransitionResult {
        let mut next = self.clone();
        next.team_scores[team.index()] = self.checked_score(team, i64::checked_sub, points)?;
        Ok(next)
    }

    fn checked_score(
        &self,
        team: TeamId,
        op: fn(i64, i64) -> Option<i64>,
        points: i64,
    ) -> Result<i64, TransitionError> {
        op(self.team_scores[team.index()], points).ok_or(TransitionError::ScoreOverflow { team })
    }

    pub fn set_score(&self, team: TeamId, score: i64) -> GameState {
        let mut next = self.clone();
        next.team_scores[team.index()] = score;
        next
    }

    pub fn swap_scores(&self, a: TeamId, b: TeamId) -> GameState {
        let mut next = self.clone();
        next.team_scores.swap(a.index(), b.index());
        next
    }

    /// Move `amount` from the highest-scoring team to the lowest-scoring one.
    ///
    /// Ties resolve to the lowest team number on both ends, so the two ends
    /// only coincide when every score is equal.
    pub fn steal_from_leader(&self, amount: i64) -> TransitionResult {
        let mut lowest = 0;
        let mut highest = 0;
        for (i, score) in self.team_scores.iter().enumerate().skip(1) {
            if *score < self.team_scores[lowest] {
                lowest = i;
            }
            if *score > self.team_scores[highest] {
                highest = i;
            }
        }
        if lowest == highest {
            return Err(TransitionError::ScoresTooClose);
        }

        self.subtract_points(TeamId::wrapping_from_index(highest), amount)?
            .add_points(TeamId::wrapping_from_index(lowest), amount)
    }

    /// Subtract `points` from every team at once
    pub fn group_penalty(&self, points: i64) -> TransitionResult {
        TeamId::all().try_fold(self.clone(), |next, team| next.subtract_points(team, points))
    }

    pub fn random_swing(&self, pick: RandomPick) -> TransitionResult {
        if !RANDOM_SWINGS.contains(&pick.swing) {
            return Err(TransitionError::InvalidSwing(pick.swing));
        }
        self.add_points(pick.team, pick.swing)
    }
}
