//! Wire codec for the shared game record.
//!
//! The store keeps one flat record of strings. Per-team values are
//! comma-joined lists, power-ups are `candy-ornament` pairs, booleans are the
//! literals `"true"`/`"false"` and the active question is a JSON blob.
//!
//! Decoding never fails: every malformed or missing field falls back to its
//! default (logged at `warn`) so a partially corrupt write still renders.

use crate::types::*;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// The record as stored and broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireState {
    #[serde(default, deserialize_with = "lenient")]
    pub used_questions: String,
    #[serde(default, deserialize_with = "lenient")]
    pub team_scores: String,
    #[serde(default, deserialize_with = "lenient")]
    pub team_names: String,
    #[serde(default, deserialize_with = "lenient")]
    pub team_avatars: String,
    #[serde(default, deserialize_with = "lenient")]
    pub team_powerups: String,
    #[serde(default, deserialize_with = "lenient")]
    pub current_team: String,
    #[serde(default, deserialize_with = "lenient")]
    pub next_multiplier: String,
    #[serde(default, deserialize_with = "lenient")]
    pub daily_doubles: String,
    #[serde(default, deserialize_with = "lenient")]
    pub achievements: String,
    #[serde(default, deserialize_with = "lenient")]
    pub buzzer_active: String,
    #[serde(default, deserialize_with = "lenient")]
    pub buzzer_winner: String,
    #[serde(default, deserialize_with = "lenient")]
    pub active_question: String,
    #[serde(default, deserialize_with = "lenient")]
    pub answer_revealed: String,
}

/// Accept whatever JSON scalar a writer put in a field.
/// Older writers store `current_team` and `next_multiplier` as numbers.
fn lenient<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

pub fn encode(state: &GameState) -> WireState {
    let active_question = match &state.active_question {
        Some(question) => serde_json::to_string(question).unwrap_or_else(|e| {
            tracing::error!("Failed to encode active question: {}", e);
            String::new()
        }),
        None => String::new(),
    };

    WireState {
        used_questions: join(state.used_questions.iter()),
        team_scores: join(state.team_scores.iter()),
        team_names: state.team_names.join(","),
        team_avatars: state.team_avatars.join(","),
        team_powerups: join(
            state
                .team_powerups
                .iter()
                .map(|p| format!("{}-{}", p.candy, p.ornament)),
        ),
        current_team: state.current_team.get().to_string(),
        next_multiplier: state.next_multiplier.to_string(),
        daily_doubles: join(state.daily_doubles.iter()),
        achievements: encode_achievements(&state.achievements),
        buzzer_active: state.buzzer_active.to_string(),
        buzzer_winner: state
            .buzzer_winner
            .map(|team| team.get().to_string())
            .unwrap_or_default(),
        active_question,
        answer_revealed: state.answer_revealed.to_string(),
    }
}

pub fn decode(wire: &WireState) -> GameState {
    GameState {
        used_questions: decode_slots("used_questions", &wire.used_questions, &[]),
        team_scores: decode_team_list("team_scores", &wire.team_scores, [0; TEAM_COUNT], |s| {
            s.trim().parse().ok()
        }),
        team_names: decode_team_list("team_names", &wire.team_names, default_team_names(), |s| {
            Some(s.to_string())
        }),
        team_avatars: decode_team_list(
            "team_avatars",
            &wire.team_avatars,
            default_team_avatars(),
            |s| Some(s.to_string()),
        ),
        team_powerups: decode_team_list(
            "team_powerups",
            &wire.team_powerups,
            [TeamPowerups::default(); TEAM_COUNT],
            |s| Some(decode_powerups(s)),
        ),
        current_team: decode_scalar("current_team", &wire.current_team, |s| {
            s.parse().ok().and_then(|n| TeamId::new(n).ok())
        })
        .unwrap_or_default(),
        next_multiplier: decode_scalar("next_multiplier", &wire.next_multiplier, |s| {
            s.parse().ok().filter(|m: &u32| *m >= 1)
        })
        .unwrap_or(1),
        daily_doubles: decode_slots("daily_doubles", &wire.daily_doubles, &DEFAULT_DAILY_DOUBLES),
        achievements: decode_achievements(&wire.achievements),
        buzzer_active: decode_flag(&wire.buzzer_active),
        buzzer_winner: decode_scalar("buzzer_winner", &wire.buzzer_winner, |s| {
            s.parse().ok().and_then(|n| TeamId::new(n).ok())
        }),
        active_question: decode_question(&wire.active_question),
        answer_revealed: decode_flag(&wire.answer_revealed),
    }
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(",")
}

/// Only the exact literal `true` is true
fn decode_flag(raw: &str) -> bool {
    raw == "true"
}

/// Empty means absent (no warning); anything unparsable is logged and absent
fn decode_scalar<T>(field: &str, raw: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = parse(trimmed);
    if parsed.is_none() {
        tracing::warn!("Ignoring malformed {} value {:?}", field, raw);
    }
    parsed
}

fn decode_slots(field: &str, raw: &str, default: &[u8]) -> BTreeSet<u8> {
    if raw.trim().is_empty() {
        return default.iter().copied().collect();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .filter_map(|piece| match piece.parse::<u8>() {
            Ok(slot) if slot < QUESTION_SLOTS => Some(slot),
            _ => {
                tracing::warn!("Dropping invalid {} entry {:?}", field, piece);
                None
            }
        })
        .collect()
}

/// Decode a five-entry list. Missing or unparsable entries take the default
/// for that position; entries past the fifth are ignored.
fn decode_team_list<T: Clone>(
    field: &str,
    raw: &str,
    defaults: [T; TEAM_COUNT],
    parse: impl Fn(&str) -> Option<T>,
) -> [T; TEAM_COUNT] {
    if raw.is_empty() {
        return defaults;
    }
    let pieces: Vec<&str> = raw.split(',').collect();
    if pieces.len() != TEAM_COUNT {
        tracing::warn!(
            "{} has {} entries, expected {}",
            field,
            pieces.len(),
            TEAM_COUNT
        );
    }
    std::array::from_fn(|i| match pieces.get(i) {
        Some(piece) => parse(piece).unwrap_or_else(|| {
            tracing::warn!("Malformed {} entry {:?} for team {}", field, piece, i + 1);
            defaults[i].clone()
        }),
        None => defaults[i].clone(),
    })
}

/// Each half of `candy-ornament` stands alone; a malformed half counts as zero
fn decode_powerups(raw: &str) -> TeamPowerups {
    let mut parts = raw.splitn(2, '-').map(str::trim);
    let mut count = |kind: PowerupKind| {
        let piece = parts.next().unwrap_or_default();
        piece.parse::<u32>().unwrap_or_else(|_| {
            tracing::warn!(
                "Malformed {} count {:?} in team_powerups entry {:?}",
                kind,
                piece,
                raw
            );
            0
        })
    };
    TeamPowerups {
        candy: count(PowerupKind::Candy),
        ornament: count(PowerupKind::Ornament),
    }
}

fn parse_or_zero<T: FromStr + Default>(raw: Option<&str>) -> T {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
}

fn encode_achievements(achievements: &Achievements) -> String {
    let dashed = |values: &[u32]| {
        values
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("-")
    };
    format!(
        "{},{},{},{}",
        achievements.flag,
        dashed(&achievements.pair_a),
        dashed(&achievements.pair_b),
        dashed(&achievements.team_counts)
    )
}

fn decode_achievements(raw: &str) -> Achievements {
    fn counters<const N: usize>(group: Option<&str>) -> [u32; N] {
        let values: Vec<&str> = group.map(|g| g.split('-').collect()).unwrap_or_default();
        std::array::from_fn(|i| parse_or_zero(values.get(i).copied()))
    }

    let mut groups = raw.split(',');
    Achievements {
        flag: groups.next().is_some_and(decode_flag),
        pair_a: counters(groups.next()),
        pair_b: counters(groups.next()),
        team_counts: counters(groups.next()),
    }
}

fn decode_question(raw: &str) -> Option<ActiveQuestion> {
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<ActiveQuestion>(raw) {
        Ok(question) => Some(question),
        Err(e) => {
            tracing::warn!("Active question blob unreadable, showing board: {}", e);
            None
        }
    }
}
