use crate::config::*;
use crate::error::{Result as EngineResult, TournamentError};
use crate::ledger::Ledger;
use crate::lifecycle;
use crate::ranking;
use crate::store::{self, BlobStore, FileBlobStore, MemoryBlobStore};
use crate::types::*;
use std::sync::{Arc, Mutex};

/// Everything one running tournament needs: its settings, its ledger and the
/// store both are saved to.
pub struct TournamentSession {
    pub config: TournamentConfig,
    pub ledger: Ledger,
    store: Box<dyn BlobStore>,
    saved_at: Option<String>,
}

impl TournamentSession {
    pub fn open(store: Box<dyn BlobStore>) -> EngineResult<Self> {
        let config = store::load_config(store.as_ref())?;
        config.validate()?;
        let mut ledger = store::load_ledger(store.as_ref())?;
        ranking::recalculate_all(&mut ledger);
        let saved_at = store::saved_at(store.as_ref())?;
        tracing::info!(
            "session opened: {} team(s), {} match(es), {} round(s) on {} field(s)",
            ledger.teams.len(),
            ledger.matches.len(),
            config.total_rounds,
            config.field_count
        );
        Ok(TournamentSession { config, ledger, store, saved_at })
    }

    /// Load `.env`, then open the file store in the configured data directory.
    pub fn open_default() -> EngineResult<Self> {
        load_env_file();
        let dir = data_dir();
        tracing::info!("data directory: {}", dir.display());
        Self::open(Box::new(FileBlobStore::new(dir)))
    }

    pub fn in_memory(config: TournamentConfig) -> Self {
        TournamentSession {
            config: config.normalize(),
            ledger: Ledger::new(),
            store: Box::new(MemoryBlobStore::new()),
            saved_at: None,
        }
    }

    pub fn save(&mut self) -> EngineResult<()> {
        store::save_config(self.store.as_mut(), &self.config)?;
        let stamp = store::save_ledger(self.store.as_mut(), &self.ledger)?;
        tracing::debug!("saved at {stamp}");
        self.saved_at = Some(stamp);
        Ok(())
    }

    pub fn persistence_status(&self) -> PersistenceStatus {
        PersistenceStatus {
            data_dir: self.store.location().map(|p| p.display().to_string()),
            saved_at: self.saved_at.clone(),
            team_count: self.ledger.teams.len(),
            match_count: self.ledger.matches.len(),
        }
    }
}

pub fn shared(session: TournamentSession) -> SharedSession {
    Arc::new(Mutex::new(session))
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Lock the session and call `f` with it.
fn with_session<F, R>(session: &SharedSession, f: F) -> Result<R, String>
where
    F: FnOnce(&mut TournamentSession) -> EngineResult<R>,
{
    let mut guard = session.lock().map_err(|e| e.to_string())?;
    f(&mut *guard).map_err(|e| e.to_string())
}

/// Like `with_session`, then save if `f` succeeded.
fn with_session_saved<F, R>(session: &SharedSession, f: F) -> Result<R, String>
where
    F: FnOnce(&mut TournamentSession) -> EngineResult<R>,
{
    with_session(session, |s| {
        let out = f(&mut *s)?;
        s.save()?;
        Ok(out)
    })
}

/// Apply `change` to a copy of the config and keep it only if it validates.
fn update_config<F>(s: &mut TournamentSession, change: F) -> EngineResult<TournamentConfig>
where
    F: FnOnce(&mut TournamentConfig),
{
    let mut config = s.config.clone();
    change(&mut config);
    config.validate()?;
    s.config = config;
    Ok(s.config.clone())
}

// ── Rounds ──────────────────────────────────────────────────────────────

/// Generate round `round`, or only its phase `phase` when one is given.
pub fn generate_round(
    session: &SharedSession,
    round: u32,
    phase: Option<u32>,
) -> Result<GenerationReport, String> {
    with_session_saved(session, |s| {
        lifecycle::generate_round(&mut s.ledger, &s.config, round, phase.unwrap_or(0))
    })
}

pub fn can_generate_round(session: &SharedSession, round: u32) -> Result<bool, String> {
    with_session(session, |s| Ok(lifecycle::can_generate_round(&s.ledger, &s.config, round)))
}

pub fn can_generate_phase(session: &SharedSession, round: u32, phase: u32) -> Result<bool, String> {
    with_session(session, |s| Ok(lifecycle::can_generate_phase(&s.ledger, &s.config, round, phase)))
}

pub fn set_match_result(
    session: &SharedSession,
    slot: MatchSlot,
    score_team1: u32,
    score_team2: u32,
) -> Result<Match, String> {
    with_session_saved(session, |s| {
        ranking::set_match_result(&mut s.ledger, slot, score_team1, score_team2)
    })
}

pub fn matches_by_round(session: &SharedSession, round: u32) -> Result<Vec<Match>, String> {
    with_session(session, |s| Ok(s.ledger.matches_by_round(round)))
}

pub fn round_is_over(session: &SharedSession, round: u32) -> Result<bool, String> {
    with_session(session, |s| Ok(s.ledger.round_is_over(round)))
}

pub fn ranked_teams(session: &SharedSession) -> Result<Vec<Team>, String> {
    with_session(session, |s| Ok(ranking::ranked_teams(&s.ledger)))
}

pub fn team_matches(session: &SharedSession, name: String) -> Result<Vec<Match>, String> {
    with_session(session, |s| {
        if s.ledger.team(&name).is_none() {
            return Err(TournamentError::UnknownTeam(name));
        }
        Ok(s.ledger.team_matches(&name))
    })
}

pub fn split(session: &SharedSession) -> Result<u32, String> {
    with_session(session, |s| Ok(s.ledger.split(s.config.field_count)))
}

// ── Roster ──────────────────────────────────────────────────────────────

pub fn add_team(session: &SharedSession, name: String) -> Result<Team, String> {
    with_session_saved(session, |s| s.ledger.add_team(&name).cloned())
}

pub fn remove_team(session: &SharedSession, name: String) -> Result<Team, String> {
    with_session_saved(session, |s| s.ledger.remove_team(&name))
}

pub fn set_team_ready(session: &SharedSession, name: String, ready: bool) -> Result<(), String> {
    with_session_saved(session, |s| s.ledger.set_team_ready(&name, ready))
}

pub fn set_team_staff(
    session: &SharedSession,
    name: String,
    staff_info: Option<String>,
) -> Result<(), String> {
    with_session_saved(session, |s| s.ledger.set_team_staff(&name, staff_info))
}

pub fn team_staff_info(session: &SharedSession, name: String) -> Result<String, String> {
    with_session(session, |s| Ok(s.ledger.team_staff_info(&name)))
}

// ── Config ──────────────────────────────────────────────────────────────

pub fn tournament_config(session: &SharedSession) -> Result<TournamentConfig, String> {
    with_session(session, |s| Ok(s.config.clone()))
}

pub fn set_rounds(session: &SharedSession, rounds: u32) -> Result<TournamentConfig, String> {
    with_session_saved(session, |s| {
        let config = update_config(s, |c| c.total_rounds = rounds)?;
        tracing::info!("total rounds set to {rounds}");
        Ok(config)
    })
}

pub fn set_fields(session: &SharedSession, fields: u32) -> Result<TournamentConfig, String> {
    with_session_saved(session, |s| {
        let config = update_config(s, |c| c.field_count = fields)?;
        tracing::info!("field count set to {fields}");
        Ok(config)
    })
}

pub fn set_best_team_end(session: &SharedSession, enabled: bool) -> Result<TournamentConfig, String> {
    with_session_saved(session, |s| update_config(s, |c| c.best_team_end = enabled))
}

pub fn persistence_status(session: &SharedSession) -> Result<PersistenceStatus, String> {
    with_session(session, |s| Ok(s.persistence_status()))
}
