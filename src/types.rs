use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{Arc, Mutex},
};

use crate::commands::TournamentSession;

// ── Constants ──────────────────────────────────────────────────────────

/// Stored `winner` value for a drawn match.
pub const DRAW_SENTINEL: &str = "Null";
pub const POINTS_PER_WIN: i32 = 3;
pub const POINTS_PER_DRAW: i32 = 1;
pub const DEFAULT_FIELD_COUNT: u32 = 1;
pub const DEFAULT_TOTAL_ROUNDS: u32 = 1;
pub const DEFAULT_MAX_STAND_IN_APPEARANCES: u32 = 1;

// ── Shared state type aliases ──────────────────────────────────────────

pub type SharedSession = Arc<Mutex<TournamentSession>>;

// ── Tournament domain types ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub point_differential: i32,
    #[serde(default)]
    pub is_ready: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub staff_info: String,
    #[serde(default)]
    pub members: String,
}

impl Team {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Team {
            id,
            name: name.into(),
            score: 0,
            point_differential: 0,
            is_ready: false,
            is_staff: false,
            staff_info: String::new(),
            members: String::new(),
        }
    }

    pub fn ready(mut self) -> Self {
        self.is_ready = true;
        self
    }
}

/// Outcome of a match as stored in the ledger.
///
/// Persisted as a plain string: `""` while undecided, the draw sentinel
/// `"Null"` for a draw, otherwise the winning team's name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Winner {
    #[default]
    Undecided,
    Draw,
    Team(String),
}

impl Winner {
    pub fn is_decided(&self) -> bool {
        !matches!(self, Winner::Undecided)
    }
}

impl From<String> for Winner {
    fn from(raw: String) -> Self {
        if raw.is_empty() {
            Winner::Undecided
        } else if raw == DRAW_SENTINEL {
            Winner::Draw
        } else {
            Winner::Team(raw)
        }
    }
}

impl From<Winner> for String {
    fn from(winner: Winner) -> Self {
        match winner {
            Winner::Undecided => String::new(),
            Winner::Draw => DRAW_SENTINEL.to_string(),
            Winner::Team(name) => name,
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Undecided => write!(f, "undecided"),
            Winner::Draw => write!(f, "draw"),
            Winner::Team(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub round: u32,
    pub phase: u32,
    pub field: u32,
    pub team1: String,
    #[serde(default)]
    pub team2: Option<String>,
    #[serde(default)]
    pub score_team1: u32,
    #[serde(default)]
    pub score_team2: u32,
    #[serde(default)]
    pub winner: Winner,
    #[serde(default)]
    pub is_friendly_for_team2: bool,
    #[serde(default)]
    pub forced_rematch: bool,
}

impl Match {
    pub fn slot(&self) -> MatchSlot {
        MatchSlot {
            round: self.round,
            phase: self.phase,
            field: self.field,
        }
    }

    pub fn involves(&self, name: &str) -> bool {
        self.team1 == name || self.team2.as_deref() == Some(name)
    }

    /// True when `name` played this match for official standings.
    pub fn counts_for(&self, name: &str) -> bool {
        self.team1 == name || (self.team2.as_deref() == Some(name) && !self.is_friendly_for_team2)
    }

    pub fn pairs(&self, a: &str, b: &str) -> bool {
        match self.team2.as_deref() {
            Some(team2) => (self.team1 == a && team2 == b) || (self.team1 == b && team2 == a),
            None => false,
        }
    }

    pub fn is_walkover(&self) -> bool {
        self.team2.is_none()
    }
}

/// A (round, phase, field) time slot; unique per generated match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSlot {
    pub round: u32,
    pub phase: u32,
    pub field: u32,
}

impl fmt::Display for MatchSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round {} phase {} field {}", self.round, self.phase, self.field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPairing {
    pub team1: String,
    pub team2: Option<String>,
    pub forced: bool,
}

/// Summary of one `generate_round` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub round: u32,
    pub phase: u32,
    pub removed: usize,
    pub created: usize,
    pub forced_rematches: usize,
    pub friendlies: usize,
    pub walkovers: usize,
    pub reordered: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceStatus {
    pub data_dir: Option<String>,
    pub saved_at: Option<String>,
    pub team_count: usize,
    pub match_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winner_string_mapping() {
        assert_eq!(Winner::from(String::new()), Winner::Undecided);
        assert_eq!(Winner::from("Null".to_string()), Winner::Draw);
        assert_eq!(Winner::from("Otters".to_string()), Winner::Team("Otters".to_string()));
        assert_eq!(String::from(Winner::Draw), "Null");
        assert_eq!(String::from(Winner::Undecided), "");
    }

    #[test]
    fn test_match_json_uses_camel_case_and_plain_winner() {
        let m = Match {
            round: 2,
            phase: 1,
            field: 3,
            team1: "Otters".to_string(),
            team2: Some("Herons".to_string()),
            score_team1: 13,
            score_team2: 7,
            winner: Winner::Team("Otters".to_string()),
            is_friendly_for_team2: false,
            forced_rematch: false,
        };
        let value = serde_json::to_value(&m).unwrap();
        assert_eq!(value["scoreTeam1"], 13);
        assert_eq!(value["winner"], "Otters");
        assert_eq!(value["isFriendlyForTeam2"], false);

        let legacy = r#"{"round":1,"phase":1,"field":1,"team1":"A","team2":null,"winner":"A"}"#;
        let parsed: Match = serde_json::from_str(legacy).unwrap();
        assert!(parsed.is_walkover());
        assert_eq!(parsed.winner, Winner::Team("A".to_string()));
        assert_eq!(parsed.score_team1, 0);
    }

    #[test]
    fn test_friendly_match_does_not_count_for_stand_in() {
        let m = Match {
            round: 1,
            phase: 2,
            field: 1,
            team1: "A".to_string(),
            team2: Some("B".to_string()),
            score_team1: 0,
            score_team2: 0,
            winner: Winner::Undecided,
            is_friendly_for_team2: true,
            forced_rematch: false,
        };
        assert!(m.counts_for("A"));
        assert!(!m.counts_for("B"));
        assert!(m.involves("B"));
        assert!(m.pairs("B", "A"));
    }
}
