use crate::types::TeamPairing;

pub const MAX_REORGANIZATION_STEPS: usize = 10_000;

// Candidate slot for "this team sits out".
const BYE: usize = usize::MAX;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PairingOutcome {
  pub pairings: Vec<TeamPairing>,
  pub reorganizations: usize,
}

impl PairingOutcome {
  pub fn forced_count(&self) -> usize {
    self.pairings.iter().filter(|p| p.forced).count()
  }
}

#[derive(Clone, Debug)]
struct Frame {
  top: usize,
  candidates: Vec<usize>,
  cursor: usize,
}

impl Frame {
  fn choice(&self) -> Option<usize> {
    self.candidates.get(self.cursor).copied()
  }
}

enum Search {
  Complete(Vec<Frame>),
  Exhausted,
}

/// Pair a rank-ordered pool, strongest remaining team first.
///
/// Each team takes the best-ranked opponent it has not met. In an odd pool a
/// team may also sit out, after every opponent has been tried. Dead ends undo
/// the latest pairing and retry it with its next option; if nothing works the
/// pool is paired greedily and the rematches are flagged as forced. The team
/// without an opponent always comes last.
pub fn generate_pairings<F>(pool: &[String], has_played: F) -> PairingOutcome
where
  F: Fn(&str, &str) -> bool,
{
  let mut reorganizations = 0usize;
  match search(pool, &has_played, &mut reorganizations) {
    Search::Complete(frames) => {
      let mut pairings = Vec::with_capacity(frames.len());
      let mut bye = None;
      for frame in &frames {
        match frame.choice() {
          Some(BYE) | None => bye = Some(frame.top),
          Some(opponent) => pairings.push(TeamPairing {
            team1: pool[frame.top].clone(),
            team2: Some(pool[opponent].clone()),
            forced: false,
          }),
        }
      }
      if let Some(idx) = bye {
        pairings.push(TeamPairing {
          team1: pool[idx].clone(),
          team2: None,
          forced: false,
        });
      }
      if reorganizations > 0 {
        tracing::debug!("pairing needed {reorganizations} reorganization(s)");
      }
      PairingOutcome { pairings, reorganizations }
    }
    Search::Exhausted => {
      tracing::warn!(
        "no rematch-free pairing for {} teams after {reorganizations} reorganization(s), forcing rematches",
        pool.len()
      );
      PairingOutcome {
        pairings: greedy_with_forced(pool, &has_played),
        reorganizations,
      }
    }
  }
}

fn search<F>(pool: &[String], has_played: &F, reorganizations: &mut usize) -> Search
where
  F: Fn(&str, &str) -> bool,
{
  let n = pool.len();
  let mut used = vec![false; n];
  let mut frames: Vec<Frame> = Vec::with_capacity(n / 2 + 1);
  let mut steps = 0usize;

  loop {
    let Some(top) = used.iter().position(|u| !u) else {
      return Search::Complete(frames);
    };
    let mut candidates = (top + 1..n)
      .filter(|&j| !used[j] && !has_played(&pool[top], &pool[j]))
      .collect::<Vec<_>>();
    // An odd remainder means nobody has sat out yet.
    if used.iter().filter(|u| !**u).count() % 2 == 1 {
      candidates.push(BYE);
    }
    frames.push(Frame { top, candidates, cursor: 0 });

    loop {
      steps += 1;
      if steps > MAX_REORGANIZATION_STEPS {
        return Search::Exhausted;
      }
      let Some(frame) = frames.last() else {
        return Search::Exhausted;
      };
      if let Some(choice) = frame.choice() {
        used[frame.top] = true;
        if choice != BYE {
          used[choice] = true;
        }
        break;
      }

      // Stuck: drop this level and move the previous choice to its next option.
      let stuck = frames.pop().map(|f| f.top);
      let Some(previous) = frames.last_mut() else {
        return Search::Exhausted;
      };
      let undone = previous.choice();
      used[previous.top] = false;
      if let Some(opponent) = undone.filter(|&o| o != BYE) {
        used[opponent] = false;
      }
      previous.cursor += 1;
      *reorganizations += 1;
      if let Some(stuck) = stuck {
        tracing::debug!("{} has only rematches left, undoing the choice for {}", pool[stuck], pool[previous.top]);
      }
    }
  }
}

fn greedy_with_forced<F>(pool: &[String], has_played: &F) -> Vec<TeamPairing>
where
  F: Fn(&str, &str) -> bool,
{
  let mut remaining: Vec<&String> = pool.iter().collect();
  let mut pairings = Vec::with_capacity(pool.len() / 2 + 1);
  while !remaining.is_empty() {
    let team1 = remaining.remove(0);
    if remaining.is_empty() {
      pairings.push(TeamPairing {
        team1: team1.clone(),
        team2: None,
        forced: false,
      });
      break;
    }
    let (pos, forced) = match remaining.iter().position(|t| !has_played(team1, t)) {
      Some(pos) => (pos, false),
      None => (0, true),
    };
    let team2 = remaining.remove(pos);
    if forced {
      tracing::warn!("forced rematch: {team1} vs {team2}");
    }
    pairings.push(TeamPairing {
      team1: team1.clone(),
      team2: Some(team2.clone()),
      forced,
    });
  }
  pairings
}
