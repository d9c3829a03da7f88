use crate::state::TransitionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Number of team slots on every screen
pub const TEAM_COUNT: usize = 5;

/// Number of question slots on the board (slot numbers are 0-based)
pub const QUESTION_SLOTS: u8 = 20;

pub const DEFAULT_AVATARS: [&str; TEAM_COUNT] = ["🎅", "🤶", "🧝", "⛄", "🎄"];

pub const DEFAULT_DAILY_DOUBLES: [u8; 2] = [4, 14];

/// Team number in `1..=TEAM_COUNT`.
///
/// Holding a `TeamId` means the index has already been checked, so the
/// transition code can index the per-team arrays without further validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TeamId(u8);

impl TeamId {
    pub fn new(number: u8) -> Result<Self, TransitionError> {
        if (1..=TEAM_COUNT as u8).contains(&number) {
            Ok(Self(number))
        } else {
            Err(TransitionError::InvalidTeam(number))
        }
    }

    /// The team number as shown on screen (1-based)
    pub fn get(self) -> u8 {
        self.0
    }

    /// Position in the per-team arrays (0-based)
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    pub fn all() -> impl Iterator<Item = TeamId> {
        (1..=TEAM_COUNT as u8).map(TeamId)
    }

    /// Team at a 0-based position, wrapping past the last team
    pub fn wrapping_from_index(index: usize) -> Self {
        TeamId((index % TEAM_COUNT) as u8 + 1)
    }
}

impl Default for TeamId {
    fn default() -> Self {
        TeamId(1)
    }
}

impl TryFrom<u8> for TeamId {
    type Error = TransitionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        TeamId::new(value)
    }
}

impl From<TeamId> for u8 {
    fn from(team: TeamId) -> Self {
        team.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerupKind {
    Candy,
    Ornament,
}

impl fmt::Display for PowerupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerupKind::Candy => f.write_str("candy"),
            PowerupKind::Ornament => f.write_str("ornament"),
        }
    }
}

/// Consumable power-up balance of one team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPowerups {
    pub candy: u32,
    pub ornament: u32,
}

impl TeamPowerups {
    pub fn count(&self, kind: PowerupKind) -> u32 {
        match kind {
            PowerupKind::Candy => self.candy,
            PowerupKind::Ornament => self.ornament,
        }
    }

    pub(crate) fn count_mut(&mut self, kind: PowerupKind) -> &mut u32 {
        match kind {
            PowerupKind::Candy => &mut self.candy,
            PowerupKind::Ornament => &mut self.ornament,
        }
    }
}

/// Side-tracked accomplishments. Carried through every write untouched;
/// no transition reads or changes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievements {
    pub flag: bool,
    pub pair_a: [u32; 2],
    pub pair_b: [u32; 2],
    pub team_counts: [u32; TEAM_COUNT],
}

/// The question currently displayed on every screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveQuestion {
    pub question: String,
    pub answer: String,
    pub value: u32,
    #[serde(default)]
    pub is_daily_double: bool,
}

impl ActiveQuestion {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        value: u32,
        is_daily_double: bool,
    ) -> Result<Self, TransitionError> {
        if value == 0 {
            return Err(TransitionError::InvalidQuestionValue);
        }
        Ok(Self {
            question: question.into(),
            answer: answer.into(),
            value,
            is_daily_double,
        })
    }

    /// Points at stake as a signed score delta
    pub fn points(&self) -> i64 {
        i64::from(self.value)
    }
}

/// Where the shared screen is in the question lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionPhase {
    Board,
    QuestionShown,
    AnswerRevealed,
}

/// Where the buzz-in race is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "phase")]
pub enum BuzzerPhase {
    Closed,
    Open,
    Won { winner: TeamId },
}

/// The single shared game state.
///
/// Fields are only readable from outside the crate; every change goes
/// through a transition in [`crate::state`], which returns a new value and
/// leaves the input untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub(crate) used_questions: BTreeSet<u8>,
    pub(crate) team_scores: [i64; TEAM_COUNT],
    pub(crate) team_names: [String; TEAM_COUNT],
    pub(crate) team_avatars: [String; TEAM_COUNT],
    pub(crate) team_powerups: [TeamPowerups; TEAM_COUNT],
    pub(crate) current_team: TeamId,
    pub(crate) next_multiplier: u32,
    pub(crate) daily_doubles: BTreeSet<u8>,
    pub(crate) achievements: Achievements,
    pub(crate) buzzer_active: bool,
    pub(crate) buzzer_winner: Option<TeamId>,
    pub(crate) active_question: Option<ActiveQuestion>,
    pub(crate) answer_revealed: bool,
}

pub(crate) fn default_team_names() -> [String; TEAM_COUNT] {
    std::array::from_fn(|i| format!("Team {}", i + 1))
}

pub(crate) fn default_team_avatars() -> [String; TEAM_COUNT] {
    DEFAULT_AVATARS.map(String::from)
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            used_questions: BTreeSet::new(),
            team_scores: [0; TEAM_COUNT],
            team_names: default_team_names(),
            team_avatars: default_team_avatars(),
            team_powerups: [TeamPowerups::default(); TEAM_COUNT],
            current_team: TeamId::default(),
            next_multiplier: 1,
            daily_doubles: DEFAULT_DAILY_DOUBLES.into_iter().collect(),
            achievements: Achievements::default(),
            buzzer_active: false,
            buzzer_winner: None,
            active_question: None,
            answer_revealed: false,
        }
    }
}

impl GameState {
    pub fn used_questions(&self) -> &BTreeSet<u8> {
        &self.used_questions
    }

    pub fn is_used(&self, slot: u8) -> bool {
        self.used_questions.contains(&slot)
    }

    pub fn team_scores(&self) -> &[i64; TEAM_COUNT] {
        &self.team_scores
    }

    pub fn score(&self, team: TeamId) -> i64 {
        self.team_scores[team.index()]
    }

    pub fn team_names(&self) -> &[String; TEAM_COUNT] {
        &self.team_names
    }

    pub fn team_name(&self, team: TeamId) -> &str {
        &self.team_names[team.index()]
    }

    pub fn team_avatars(&self) -> &[String; TEAM_COUNT] {
        &self.team_avatars
    }

    pub fn team_powerups(&self) -> &[TeamPowerups; TEAM_COUNT] {
        &self.team_powerups
    }

    pub fn powerups(&self, team: TeamId) -> TeamPowerups {
        self.team_powerups[team.index()]
    }

    pub fn current_team(&self) -> TeamId {
        self.current_team
    }

    /// Informational only: no scoring transition multiplies by it
    pub fn next_multiplier(&self) -> u32 {
        self.next_multiplier
    }

    pub fn daily_doubles(&self) -> &BTreeSet<u8> {
        &self.daily_doubles
    }

    pub fn is_daily_double(&self, slot: u8) -> bool {
        self.daily_doubles.contains(&slot)
    }

    pub fn achievements(&self) -> &Achievements {
        &self.achievements
    }

    pub fn buzzer_active(&self) -> bool {
        self.buzzer_active
    }

    pub fn buzzer_winner(&self) -> Option<TeamId> {
        self.buzzer_winner
    }

    pub fn active_question(&self) -> Option<&ActiveQuestion> {
        self.active_question.as_ref()
    }

    pub fn answer_revealed(&self) -> bool {
        self.answer_revealed
    }

    pub fn question_phase(&self) -> QuestionPhase {
        match (&self.active_question, self.answer_revealed) {
            (None, _) => QuestionPhase::Board,
            (Some(_), false) => QuestionPhase::QuestionShown,
            (Some(_), true) => QuestionPhase::AnswerRevealed,
        }
    }

    /// An open race always reports `Open`, even if a stale winner is still
    /// present in a hand-edited record.
    pub fn buzzer_phase(&self) -> BuzzerPhase {
        match (self.buzzer_active, self.buzzer_winner) {
            (true, _) => BuzzerPhase::Open,
            (false, Some(winner)) => BuzzerPhase::Won { winner },
            (false, None) => BuzzerPhase::Closed,
        }
    }

    /// Check the cross-field invariants that decoding does not repair.
    ///
    /// Transitions never produce a violating state; a violation means a
    /// record was written by something other than this crate.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(slot) = self
            .used_questions
            .iter()
            .chain(self.daily_doubles.iter())
            .find(|slot| **slot >= QUESTION_SLOTS)
        {
            return Err(format!("Question slot {} is out of range", slot));
        }
        if self.next_multiplier == 0 {
            return Err("Next multiplier must be at least 1".to_string());
        }
        if self.active_question.is_none() && self.answer_revealed {
            return Err("Answer is revealed but no question is active".to_string());
        }
        if self.buzzer_active && self.buzzer_winner.is_some() {
            return Err("Buzzer is open but already has a winner".to_string());
        }
        Ok(())
    }
}
