use crate::types::Match;

/// Renumber the phases of a freshly generated final round so the first
/// generated pairings (the top of the ranking) land in the last phase.
///
/// `matches` must be in assignment order. Phases are counted down from
/// `split` to 1, one step per original phase boundary, then the matches are
/// re-sorted by (phase, field).
pub fn reorder_final_round(matches: &mut Vec<Match>, split: u32) {
  let Some(first_phase) = matches.first().map(|m| m.phase) else {
    return;
  };
  let mut current_original = first_phase;
  let mut new_phase = split.max(1);
  for m in matches.iter_mut() {
    if m.phase != current_original {
      current_original = m.phase;
      new_phase = new_phase.saturating_sub(1).max(1);
    }
    m.phase = new_phase;
  }
  matches.sort_by_key(|m| (m.phase, m.field));
  tracing::debug!("final round reordered over {split} phase(s)");
}
