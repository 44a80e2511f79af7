use crate::ledger::have_played;
use crate::types::{Match, TeamPairing, Winner};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeftoverResolution {
  /// The stand-in plays a friendly: a real contest for team1, unofficial for the stand-in.
  Friendly { stand_in: String },
  Walkover,
}

pub fn stand_in_appearances(matches: &[Match], name: &str) -> u32 {
  matches
    .iter()
    .filter(|m| m.is_friendly_for_team2 && m.team2.as_deref() == Some(name))
    .count() as u32
}

/// Pick a stand-in for `team1` out of rank-ordered `candidates` (teams playing
/// in other phases).
///
/// Teams that already stood in `max_appearances` times are skipped. Among the
/// rest the least-used one wins, then one `team1` has not met, then rank.
pub fn find_stand_in(
  team1: &str,
  candidates: &[String],
  matches: &[Match],
  max_appearances: u32,
) -> Option<String> {
  candidates
    .iter()
    .enumerate()
    .filter(|(_, name)| name.as_str() != team1)
    .map(|(rank, name)| {
      let used = stand_in_appearances(matches, name);
      let met = have_played(matches, team1, name);
      (used, met, rank, name)
    })
    .filter(|(used, ..)| *used < max_appearances)
    .min_by_key(|(used, met, rank, _)| (*used, *met, *rank))
    .map(|(.., name)| name.clone())
}

pub fn resolve_leftover(
  team1: &str,
  candidates: &[String],
  matches: &[Match],
  max_appearances: u32,
) -> LeftoverResolution {
  match find_stand_in(team1, candidates, matches, max_appearances) {
    Some(stand_in) => {
      tracing::info!("{team1} plays a friendly against stand-in {stand_in}");
      LeftoverResolution::Friendly { stand_in }
    }
    None => {
      tracing::warn!("no stand-in available for {team1}, awarding a walkover");
      LeftoverResolution::Walkover
    }
  }
}

// Field and phase are assigned by the caller.
pub fn match_for_pairing(round: u32, pairing: &TeamPairing, leftover: Option<&LeftoverResolution>) -> Match {
  let mut m = Match {
    round,
    phase: 0,
    field: 0,
    team1: pairing.team1.clone(),
    team2: pairing.team2.clone(),
    score_team1: 0,
    score_team2: 0,
    winner: Winner::Undecided,
    is_friendly_for_team2: false,
    forced_rematch: pairing.forced,
  };
  if pairing.team2.is_none() {
    match leftover {
      Some(LeftoverResolution::Friendly { stand_in }) => {
        m.team2 = Some(stand_in.clone());
        m.is_friendly_for_team2 = true;
      }
      _ => {
        m.winner = Winner::Team(pairing.team1.clone());
      }
    }
  }
  m
}

#[cfg(test)]
mod tests {
  use super::*;

  fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|n| n.to_string()).collect()
  }

  fn official(a: &str, b: &str) -> Match {
    Match {
      round: 1,
      phase: 1,
      field: 1,
      team1: a.to_string(),
      team2: Some(b.to_string()),
      score_team1: 0,
      score_team2: 0,
      winner: Winner::Undecided,
      is_friendly_for_team2: false,
      forced_rematch: false,
    }
  }

  fn friendly(a: &str, stand_in: &str) -> Match {
    Match {
      is_friendly_for_team2: true,
      ..official(a, stand_in)
    }
  }

  #[test]
  fn test_prefers_highest_ranked_unused_candidate() {
    let pick = find_stand_in("E", &names(&["A", "B", "C"]), &[], 1);
    assert_eq!(pick.as_deref(), Some("A"));
  }

  #[test]
  fn test_skips_candidates_at_the_cap() {
    let history = vec![friendly("X", "A")];
    let pick = find_stand_in("E", &names(&["A", "B"]), &history, 1);
    assert_eq!(pick.as_deref(), Some("B"));
    assert_eq!(find_stand_in("E", &names(&["A"]), &history, 1), None);
    assert_eq!(find_stand_in("E", &names(&["A"]), &history, 2).as_deref(), Some("A"));
  }

  #[test]
  fn test_avoids_previous_opponent_when_possible() {
    let history = vec![official("E", "A")];
    let pick = find_stand_in("E", &names(&["A", "B"]), &history, 1);
    assert_eq!(pick.as_deref(), Some("B"));
    let pick = find_stand_in("E", &names(&["A"]), &history, 1);
    assert_eq!(pick.as_deref(), Some("A"));
  }

  #[test]
  fn test_leftover_becomes_friendly_or_walkover() {
    let pairing = TeamPairing {
      team1: "E".to_string(),
      team2: None,
      forced: false,
    };
    let friendly = LeftoverResolution::Friendly { stand_in: "A".to_string() };
    let m = match_for_pairing(3, &pairing, Some(&friendly));
    assert_eq!(m.team2.as_deref(), Some("A"));
    assert!(m.is_friendly_for_team2);
    assert_eq!(m.winner, Winner::Undecided);

    let m = match_for_pairing(3, &pairing, Some(&LeftoverResolution::Walkover));
    assert!(m.is_walkover());
    assert_eq!(m.winner, Winner::Team("E".to_string()));
    assert_eq!(resolve_leftover("E", &[], &[], 1), LeftoverResolution::Walkover);
  }
}
