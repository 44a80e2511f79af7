use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use crate::config::TournamentConfig;
use crate::error::{Refusal, Result, TournamentError};
use crate::friendly::{match_for_pairing, resolve_leftover};
use crate::ledger::{have_played, split_for, Ledger};
use crate::pairing::generate_pairings;
use crate::ranking::{rank_teams, recalculate_all};
use crate::reorder::reorder_final_round;
use crate::types::{GenerationReport, Match, Team};

pub fn check_round(ledger: &Ledger, config: &TournamentConfig, round: u32) -> Result<()> {
  let refuse = |reason| Err(TournamentError::RoundRefused { round, reason });
  if round == 0 || round > config.total_rounds {
    return refuse(Refusal::RoundOutOfRange { total_rounds: config.total_rounds });
  }
  if round != 1 {
    let mut previous = ledger.matches.iter().filter(|m| m.round == round - 1).peekable();
    if previous.peek().is_none() {
      return refuse(Refusal::PreviousRoundMissing);
    }
    if previous.any(|m| !m.winner.is_decided()) {
      return refuse(Refusal::PreviousRoundUnfinished);
    }
  }
  let played = ledger
    .matches
    .iter()
    .any(|m| m.round == round && m.winner.is_decided() && m.team2.is_some());
  if played {
    return refuse(Refusal::AlreadyPlayed);
  }
  Ok(())
}

pub fn can_generate_round(ledger: &Ledger, config: &TournamentConfig, round: u32) -> bool {
  check_round(ledger, config, round).is_ok()
}

pub fn check_phase(ledger: &Ledger, config: &TournamentConfig, round: u32, phase: u32) -> Result<()> {
  let refuse = |reason| Err(TournamentError::PhaseRefused { round, phase, reason });
  if round == 0 || round > config.total_rounds {
    return refuse(Refusal::RoundOutOfRange { total_rounds: config.total_rounds });
  }
  if round == 1 || phase == 0 {
    return refuse(Refusal::NoPreviousPhase);
  }
  let previous = ledger.matches_by_phase(round - 1, phase);
  if previous.is_empty() {
    return refuse(Refusal::PreviousRoundMissing);
  }
  if previous.iter().any(|m| !m.winner.is_decided()) {
    return refuse(Refusal::PreviousRoundUnfinished);
  }
  let played = ledger
    .matches_by_phase(round, phase)
    .iter()
    .any(|m| m.winner.is_decided() && m.team2.is_some());
  if played {
    return refuse(Refusal::AlreadyPlayed);
  }
  Ok(())
}

pub fn can_generate_phase(ledger: &Ledger, config: &TournamentConfig, round: u32, phase: u32) -> bool {
  check_phase(ledger, config, round, phase).is_ok()
}

/// (Re)generate a whole round (`phase == 0`) or a single phase of it.
pub fn generate_round(
  ledger: &mut Ledger,
  config: &TournamentConfig,
  round: u32,
  phase: u32,
) -> Result<GenerationReport> {
  generate_round_with_rng(ledger, config, round, phase, &mut rand::thread_rng())
}

/// Same as [`generate_round`] with the round-1 shuffle drawn from `rng`.
///
/// Everything is computed against the ledger minus the matches being replaced;
/// the ledger itself is only touched once the new matches are ready, so a
/// refusal leaves it exactly as it was.
pub fn generate_round_with_rng<R: Rng + ?Sized>(
  ledger: &mut Ledger,
  config: &TournamentConfig,
  round: u32,
  phase: u32,
  rng: &mut R,
) -> Result<GenerationReport> {
  if phase == 0 {
    check_round(ledger, config, round)?;
  } else {
    check_phase(ledger, config, round, phase)?;
  }
  let field_count = config.field_count.max(1);

  let replaced = |m: &Match| m.round == round && (phase == 0 || m.phase == phase);
  let retained: Vec<Match> = ledger.matches.iter().filter(|m| !replaced(*m)).cloned().collect();
  let removed = ledger.matches.len() - retained.len();

  let ranked_pool = if phase > 0 {
    let previous = retained
      .iter()
      .filter(|m| m.round == round - 1 && m.phase == phase)
      .collect::<Vec<_>>();
    rank_teams(official_participants(&previous, &ledger.teams), &retained)
  } else {
    let ready = ledger.teams.iter().filter(|t| t.is_ready).cloned().collect();
    rank_teams(ready, &retained)
  };
  let ranked_names: Vec<String> = ranked_pool.iter().map(|t| t.name.clone()).collect();

  let mut pool = ranked_names.clone();
  if round == 1 {
    pool.shuffle(rng);
  }
  tracing::debug!("round {round} phase {phase} pool: {}", pool.join(", "));

  let outcome = generate_pairings(&pool, |a, b| have_played(&retained, a, b));

  let mut created: Vec<Match> = Vec::with_capacity(outcome.pairings.len());
  let mut field = 1;
  let mut phase_counter = if phase == 0 { 1 } else { phase };
  let mut report = GenerationReport {
    round,
    phase,
    removed,
    forced_rematches: outcome.forced_count(),
    ..GenerationReport::default()
  };

  for pairing in &outcome.pairings {
    let match_phase = phase_counter;
    let match_field = field;
    if field >= field_count {
      field = 1;
      phase_counter += 1;
    } else {
      field += 1;
    }

    let leftover = if pairing.team2.is_none() {
      let candidates = if phase == 0 {
        let others = created
          .iter()
          .filter(|m| m.phase != match_phase)
          .collect::<Vec<_>>();
        rank_order(&participant_names(&others, &ledger.teams), &ranked_names)
      } else {
        let others = retained
          .iter()
          .filter(|m| m.round == round - 1 && m.phase != phase)
          .collect::<Vec<_>>();
        rank_teams(official_participants(&others, &ledger.teams), &retained)
          .into_iter()
          .map(|t| t.name)
          .filter(|name| !ranked_names.contains(name))
          .collect()
      };
      Some(resolve_leftover(
        &pairing.team1,
        &candidates,
        &retained,
        config.max_stand_in_appearances,
      ))
    } else {
      None
    };

    let mut m = match_for_pairing(round, pairing, leftover.as_ref());
    m.phase = match_phase;
    m.field = match_field;
    if m.is_friendly_for_team2 {
      report.friendlies += 1;
    } else if m.is_walkover() {
      report.walkovers += 1;
    }
    created.push(m);
  }

  if phase == 0 && round == config.total_rounds && config.best_team_end {
    reorder_final_round(&mut created, split_for(pool.len(), field_count));
    report.reordered = true;
  }

  report.created = created.len();
  ledger.matches = retained;
  ledger.matches.extend(created);
  recalculate_all(ledger);

  tracing::info!(
    "generated round {round}{}: {} match(es), {} removed, {} forced, {} friendly, {} walkover",
    if phase == 0 { String::new() } else { format!(" phase {phase}") },
    report.created,
    report.removed,
    report.forced_rematches,
    report.friendlies,
    report.walkovers
  );
  Ok(report)
}

/// Ready teams that officially played in `matches`; friendly stand-ins and
/// names missing from the roster are left out.
fn official_participants(matches: &[&Match], teams: &[Team]) -> Vec<Team> {
  let mut seen = HashSet::new();
  let mut out = Vec::new();
  for name in participant_names(matches, teams) {
    if !seen.insert(name.clone()) {
      continue;
    }
    if let Some(team) = teams.iter().find(|t| t.name == name) {
      out.push(team.clone());
    }
  }
  out
}

fn participant_names(matches: &[&Match], teams: &[Team]) -> Vec<String> {
  let is_ready = |name: &str| teams.iter().any(|t| t.name == name && t.is_ready);
  let mut out = Vec::new();
  for m in matches {
    if is_ready(&m.team1) {
      out.push(m.team1.clone());
    }
    if let Some(team2) = m.team2.as_deref() {
      if !m.is_friendly_for_team2 && is_ready(team2) {
        out.push(team2.to_string());
      }
    }
  }
  out
}

/// `names` sorted by their position in `ranked`; unknown names go last.
fn rank_order(names: &[String], ranked: &[String]) -> Vec<String> {
  let mut out = names.to_vec();
  out.sort_by_key(|name| ranked.iter().position(|r| r == name).unwrap_or(usize::MAX));
  out.dedup();
  out
}
