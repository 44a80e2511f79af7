use std::cmp::Ordering;

use crate::error::{Result, TournamentError};
use crate::ledger::Ledger;
use crate::types::{Match, MatchSlot, Team, Winner, POINTS_PER_DRAW, POINTS_PER_WIN};

pub fn score(ledger: &Ledger, name: &str) -> i32 {
    score_in(&ledger.matches, name)
}

pub fn point_differential(ledger: &Ledger, name: &str) -> i32 {
    point_differential_in(&ledger.matches, name)
}

pub(crate) fn score_in(matches: &[Match], name: &str) -> i32 {
    matches
        .iter()
        .filter(|m| m.counts_for(name))
        .map(|m| match &m.winner {
            Winner::Team(winner) if winner == name => POINTS_PER_WIN,
            Winner::Draw => POINTS_PER_DRAW,
            _ => 0,
        })
        .sum()
}

pub(crate) fn point_differential_in(matches: &[Match], name: &str) -> i32 {
    let total: i64 = matches
        .iter()
        .filter(|m| m.counts_for(name))
        .map(|m| {
            let (own, other) = if m.team1 == name {
                (m.score_team1, m.score_team2)
            } else {
                (m.score_team2, m.score_team1)
            };
            i64::from(own) - i64::from(other)
        })
        .sum();
    total.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

pub fn ranked_teams(ledger: &Ledger) -> Vec<Team> {
    rank_teams(ledger.teams.iter().cloned().collect(), &ledger.matches)
}

/// Rank `teams` against `matches`, refreshing their score fields on the way.
///
/// Sorted by score, then point differential. Teams tied on both are ordered by
/// their direct results: the winner of a decided match between two of them
/// comes first. Everything else keeps the incoming order.
pub(crate) fn rank_teams(mut teams: Vec<Team>, matches: &[Match]) -> Vec<Team> {
    for team in teams.iter_mut() {
        team.score = score_in(matches, &team.name);
        team.point_differential = point_differential_in(matches, &team.name);
    }
    teams.sort_by(compare_standing);

    let mut out = Vec::with_capacity(teams.len());
    let mut group: Vec<Team> = Vec::new();
    for team in teams {
        let same = group
            .last()
            .map(|last| compare_standing(last, &team) == Ordering::Equal)
            .unwrap_or(true);
        if !same {
            out.extend(order_tie_group(std::mem::take(&mut group), matches));
        }
        group.push(team);
    }
    out.extend(order_tie_group(group, matches));
    out
}

fn compare_standing(a: &Team, b: &Team) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.point_differential.cmp(&a.point_differential))
}

fn order_tie_group(group: Vec<Team>, matches: &[Match]) -> Vec<Team> {
    if group.len() < 2 {
        return group;
    }
    let n = group.len();
    let mut beats = vec![vec![false; n]; n];
    let mut beaten_by = vec![0usize; n];
    for i in 0..n {
        for j in 0..n {
            if i != j && head_to_head_winner(matches, &group[i].name, &group[j].name)
                == Some(group[i].name.as_str())
            {
                beats[i][j] = true;
                beaten_by[j] += 1;
            }
        }
    }

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut order = Vec::with_capacity(n);
    while !remaining.is_empty() {
        // On a head-to-head cycle nobody is unbeaten; fall back to the earliest team.
        let pos = remaining
            .iter()
            .position(|&idx| beaten_by[idx] == 0)
            .unwrap_or(0);
        let picked = remaining.remove(pos);
        for &other in &remaining {
            if beats[picked][other] {
                beaten_by[other] -= 1;
            }
        }
        order.push(picked);
    }

    let mut slots: Vec<Option<Team>> = group.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect()
}

pub fn head_to_head_winner<'a>(matches: &'a [Match], a: &str, b: &str) -> Option<&'a str> {
    matches
        .iter()
        .filter(|m| !m.is_friendly_for_team2 && m.pairs(a, b))
        .filter_map(|m| match &m.winner {
            Winner::Team(name) => Some((m.round, name.as_str())),
            _ => None,
        })
        .max_by_key(|(round, _)| *round)
        .map(|(_, name)| name)
}

pub fn recalculate_all(ledger: &mut Ledger) {
    let matches = &ledger.matches;
    for team in ledger.teams.iter_mut() {
        team.score = score_in(matches, &team.name);
        team.point_differential = point_differential_in(matches, &team.name);
    }
}

fn recalculate_team(ledger: &mut Ledger, name: &str) {
    let matches = &ledger.matches;
    if let Some(team) = ledger.teams.iter_mut().find(|t| t.name == name) {
        team.score = score_in(matches, name);
        team.point_differential = point_differential_in(matches, name);
    }
}

pub fn winner_from_scores(m: &Match) -> Winner {
    match m.score_team1.cmp(&m.score_team2) {
        Ordering::Equal => Winner::Draw,
        Ordering::Greater => Winner::Team(m.team1.clone()),
        Ordering::Less => match &m.team2 {
            Some(team2) => Winner::Team(team2.clone()),
            None => Winner::Team(m.team1.clone()),
        },
    }
}

pub fn set_match_result(
    ledger: &mut Ledger,
    slot: MatchSlot,
    score_team1: u32,
    score_team2: u32,
) -> Result<Match> {
    let m = ledger
        .matches
        .iter_mut()
        .find(|m| m.slot() == slot)
        .ok_or(TournamentError::UnknownMatch(slot))?;
    if m.is_walkover() {
        return Err(TournamentError::WalkoverResult(slot));
    }
    m.score_team1 = score_team1;
    m.score_team2 = score_team2;
    m.winner = winner_from_scores(m);
    let updated = m.clone();

    tracing::info!(
        "result {slot}: {} {}-{} {} -> {}",
        updated.team1,
        score_team1,
        score_team2,
        updated.team2.as_deref().unwrap_or("-"),
        updated.winner
    );

    recalculate_team(ledger, &updated.team1);
    if let Some(team2) = updated.team2.as_deref() {
        recalculate_team(ledger, team2);
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: u32, name: &str) -> Team {
        Team::new(id, name).ready()
    }

    fn result(round: u32, phase: u32, a: &str, b: &str, sa: u32, sb: u32) -> Match {
        let mut m = Match {
            round,
            phase,
            field: 1,
            team1: a.to_string(),
            team2: Some(b.to_string()),
            score_team1: sa,
            score_team2: sb,
            winner: Winner::Undecided,
            is_friendly_for_team2: false,
            forced_rematch: false,
        };
        m.winner = winner_from_scores(&m);
        m
    }

    fn ledger(names: &[&str], matches: Vec<Match>) -> Ledger {
        Ledger {
            teams: names
                .iter()
                .enumerate()
                .map(|(i, n)| team(i as u32 + 1, n))
                .collect(),
            matches,
        }
    }

    #[test]
    fn test_score_counts_wins_and_draws() {
        let l = ledger(
            &["A", "B", "C"],
            vec![
                result(1, 1, "A", "B", 13, 5),
                result(2, 1, "C", "A", 7, 7),
                result(3, 1, "B", "C", 2, 11),
            ],
        );
        assert_eq!(score(&l, "A"), 4);
        assert_eq!(score(&l, "B"), 0);
        assert_eq!(score(&l, "C"), 4);
        assert_eq!(point_differential(&l, "A"), 8);
        assert_eq!(point_differential(&l, "B"), -17);
        assert_eq!(point_differential(&l, "C"), 9);
    }

    #[test]
    fn test_differential_saturates_on_huge_scores() {
        let l = ledger(
            &["A", "B"],
            vec![
                result(1, 1, "A", "B", u32::MAX, 0),
                result(2, 1, "A", "B", u32::MAX, 0),
            ],
        );
        assert_eq!(point_differential(&l, "A"), i32::MAX);
        assert_eq!(point_differential(&l, "B"), i32::MIN);
    }

    #[test]
    fn test_score_is_independent_of_entry_order() {
        let mut forward = ledger(
            &["A", "B", "C", "D"],
            vec![
                result(1, 1, "A", "B", 0, 0),
                result(1, 2, "C", "D", 0, 0),
                result(2, 1, "A", "C", 0, 0),
                result(2, 2, "B", "D", 0, 0),
            ],
        );
        for m in forward.matches.iter_mut() {
            m.winner = Winner::Undecided;
        }
        let mut backward = forward.clone();
        let entries = [
            (MatchSlot { round: 1, phase: 1, field: 1 }, 9, 4),
            (MatchSlot { round: 1, phase: 2, field: 1 }, 6, 6),
            (MatchSlot { round: 2, phase: 1, field: 1 }, 3, 10),
            (MatchSlot { round: 2, phase: 2, field: 1 }, 8, 1),
        ];
        for (slot, a, b) in entries {
            set_match_result(&mut forward, slot, a, b).unwrap();
        }
        for (slot, a, b) in entries.iter().rev() {
            set_match_result(&mut backward, *slot, *a, *b).unwrap();
        }
        assert_eq!(forward.teams, backward.teams);
        let a = forward.team("A").unwrap();
        assert_eq!((a.score, a.point_differential), (3, -2));
        let c = forward.team("C").unwrap();
        assert_eq!((c.score, c.point_differential), (4, 7));
    }

    #[test]
    fn test_friendly_result_leaves_stand_in_untouched() {
        let mut l = ledger(&["A", "B"], vec![result(1, 2, "A", "B", 0, 0)]);
        l.matches[0].is_friendly_for_team2 = true;
        l.matches[0].winner = Winner::Undecided;
        set_match_result(&mut l, MatchSlot { round: 1, phase: 2, field: 1 }, 2, 9).unwrap();
        assert_eq!(l.matches[0].winner, Winner::Team("B".to_string()));
        let b = l.team("B").unwrap();
        assert_eq!((b.score, b.point_differential), (0, 0));
        let a = l.team("A").unwrap();
        assert_eq!((a.score, a.point_differential), (0, -7));
    }

    #[test]
    fn test_result_entry_refusals() {
        let mut l = ledger(&["A"], Vec::new());
        let slot = MatchSlot { round: 1, phase: 1, field: 1 };
        assert!(matches!(
            set_match_result(&mut l, slot, 1, 0),
            Err(TournamentError::UnknownMatch(_))
        ));
        l.matches.push(Match {
            round: 1,
            phase: 1,
            field: 1,
            team1: "A".to_string(),
            team2: None,
            score_team1: 0,
            score_team2: 0,
            winner: Winner::Team("A".to_string()),
            is_friendly_for_team2: false,
            forced_rematch: false,
        });
        assert!(matches!(
            set_match_result(&mut l, slot, 1, 0),
            Err(TournamentError::WalkoverResult(_))
        ));
    }

    #[test]
    fn test_ranked_by_score_then_differential() {
        let l = ledger(
            &["A", "B", "C", "D"],
            vec![
                result(1, 1, "A", "B", 13, 12),
                result(1, 2, "C", "D", 13, 2),
            ],
        );
        let names: Vec<String> = ranked_teams(&l).into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["C", "A", "B", "D"]);
    }

    #[test]
    fn test_head_to_head_breaks_exact_tie() {
        // A and B both end on 3 points and +0; B won their direct match.
        let l = ledger(
            &["A", "B", "C", "D"],
            vec![
                result(1, 1, "A", "C", 10, 5),
                result(1, 2, "D", "B", 10, 5),
                result(2, 1, "A", "B", 5, 10),
                result(2, 2, "C", "D", 1, 1),
            ],
        );
        let ranked = ranked_teams(&l);
        let a = ranked.iter().find(|t| t.name == "A").unwrap();
        let b = ranked.iter().find(|t| t.name == "B").unwrap();
        assert_eq!((a.score, a.point_differential), (3, 0));
        assert_eq!((b.score, b.point_differential), (3, 0));
        let names: Vec<&str> = ranked.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["D", "B", "A", "C"]);
    }

    #[test]
    fn test_head_to_head_cycle_keeps_roster_order() {
        let l = ledger(
            &["A", "B", "C"],
            vec![
                result(1, 1, "A", "B", 5, 3),
                result(2, 1, "B", "C", 5, 3),
                result(3, 1, "C", "A", 5, 3),
            ],
        );
        let names: Vec<String> = ranked_teams(&l).into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_missing_team_reference_is_skipped() {
        let mut l = ledger(&["A"], vec![result(1, 1, "A", "Ghost", 6, 2)]);
        recalculate_all(&mut l);
        assert_eq!(l.team("A").unwrap().score, 3);
        set_match_result(&mut l, MatchSlot { round: 1, phase: 1, field: 1 }, 1, 4).unwrap();
        assert_eq!(l.team("A").unwrap().score, 0);
        assert_eq!(l.teams.len(), 1);
    }
}
