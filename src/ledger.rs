use serde::{Deserialize, Serialize};

use crate::error::{Result, TournamentError};
use crate::types::{Match, Team, DRAW_SENTINEL};

/// In-memory roster and match ledger.
///
/// Teams and matches reference each other by team name. The engine borrows the
/// ledger mutably for generation and result entry; loading and saving happen
/// outside of it (see `store`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub matches: Vec<Match>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    pub fn with_teams(teams: Vec<Team>) -> Self {
        Ledger {
            teams,
            matches: Vec::new(),
        }
    }

    // ── Read-only queries ──────────────────────────────────────────────

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.name == name)
    }

    pub fn team_mut(&mut self, name: &str) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.name == name)
    }

    pub fn ready_team_count(&self) -> usize {
        self.teams.iter().filter(|t| t.is_ready).count()
    }

    /// Matches of one round, sorted by phase then field.
    pub fn matches_by_round(&self, round: u32) -> Vec<Match> {
        let mut out: Vec<Match> = self
            .matches
            .iter()
            .filter(|m| m.round == round)
            .cloned()
            .collect();
        out.sort_by_key(|m| (m.phase, m.field));
        out
    }

    pub fn matches_by_phase(&self, round: u32, phase: u32) -> Vec<&Match> {
        self.matches
            .iter()
            .filter(|m| m.round == round && m.phase == phase)
            .collect()
    }

    /// A round is over once it has matches and every one has a winner.
    pub fn round_is_over(&self, round: u32) -> bool {
        let mut any = false;
        for m in self.matches.iter().filter(|m| m.round == round) {
            if !m.winner.is_decided() {
                return false;
            }
            any = true;
        }
        any
    }

    pub fn team_matches(&self, name: &str) -> Vec<Match> {
        self.matches
            .iter()
            .filter(|m| m.involves(name))
            .cloned()
            .collect()
    }

    /// Whether two teams already met in an official match. Friendly stand-in
    /// matches are not part of the history.
    pub fn have_teams_played_before(&self, a: &str, b: &str) -> bool {
        have_played(&self.matches, a, b)
    }

    /// Number of phase groups a full round needs with `field_count` fields.
    pub fn split(&self, field_count: u32) -> u32 {
        split_for(self.ready_team_count(), field_count)
    }

    pub fn team_staff_info(&self, name: &str) -> String {
        match self.team(name) {
            Some(team) if team.is_staff => format!(" ({})", team.staff_info),
            _ => String::new(),
        }
    }

    // ── Roster ─────────────────────────────────────────────────────────

    pub fn add_team(&mut self, name: &str) -> Result<&Team> {
        let name = name.trim();
        if name.is_empty() || name == DRAW_SENTINEL {
            return Err(TournamentError::InvalidTeamName(name.to_string()));
        }
        if self.team(name).is_some() {
            return Err(TournamentError::DuplicateTeam(name.to_string()));
        }
        let id = self.teams.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.teams.push(Team::new(id, name));
        tracing::info!("added team {name} (id {id})");
        let index = self.teams.len() - 1;
        Ok(&self.teams[index])
    }

    pub fn remove_team(&mut self, name: &str) -> Result<Team> {
        let referenced = self.matches.iter().filter(|m| m.involves(name)).count();
        if referenced > 0 {
            return Err(TournamentError::TeamInUse {
                name: name.to_string(),
                matches: referenced,
            });
        }
        let index = self
            .teams
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| TournamentError::UnknownTeam(name.to_string()))?;
        tracing::info!("removed team {name}");
        Ok(self.teams.remove(index))
    }

    pub fn set_team_ready(&mut self, name: &str, ready: bool) -> Result<()> {
        let team = self
            .team_mut(name)
            .ok_or_else(|| TournamentError::UnknownTeam(name.to_string()))?;
        team.is_ready = ready;
        Ok(())
    }

    pub fn set_team_staff(&mut self, name: &str, staff_info: Option<String>) -> Result<()> {
        let team = self
            .team_mut(name)
            .ok_or_else(|| TournamentError::UnknownTeam(name.to_string()))?;
        match staff_info {
            Some(info) => {
                team.is_staff = true;
                team.staff_info = info;
            }
            None => {
                team.is_staff = false;
                team.staff_info.clear();
            }
        }
        Ok(())
    }
}

pub(crate) fn have_played(matches: &[Match], a: &str, b: &str) -> bool {
    matches
        .iter()
        .any(|m| !m.is_friendly_for_team2 && m.pairs(a, b))
}

pub(crate) fn split_for(team_count: usize, field_count: u32) -> u32 {
    let per_phase = 2 * field_count.max(1) as usize;
    team_count.div_ceil(per_phase) as u32
}
