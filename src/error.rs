use std::fmt;
use thiserror::Error;

use crate::types::MatchSlot;

/// Why a round or phase may not be (re)generated right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    RoundOutOfRange { total_rounds: u32 },
    PreviousRoundMissing,
    PreviousRoundUnfinished,
    AlreadyPlayed,
    NoPreviousPhase,
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refusal::RoundOutOfRange { total_rounds } => {
                write!(f, "round must be between 1 and {total_rounds}")
            }
            Refusal::PreviousRoundMissing => write!(f, "previous round has no matches"),
            Refusal::PreviousRoundUnfinished => write!(f, "previous round still has undecided matches"),
            Refusal::AlreadyPlayed => write!(f, "results were already entered for it"),
            Refusal::NoPreviousPhase => write!(f, "there is no previous phase to draw teams from"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("cannot generate round {round}: {reason}")]
    RoundRefused { round: u32, reason: Refusal },

    #[error("cannot generate phase {phase} of round {round}: {reason}")]
    PhaseRefused { round: u32, phase: u32, reason: Refusal },

    #[error("no match at {0}")]
    UnknownMatch(MatchSlot),

    #[error("match at {0} is a walkover and takes no result")]
    WalkoverResult(MatchSlot),

    #[error("team {0} not found")]
    UnknownTeam(String),

    #[error("invalid team name {0:?}")]
    InvalidTeamName(String),

    #[error("team {0} already exists")]
    DuplicateTeam(String),

    #[error("team {name} is still referenced by {matches} match(es)")]
    TeamInUse { name: String, matches: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("storage error for key {key}: {message}")]
    Storage { key: String, message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TournamentError>;
