use crate::config::{apply_env_defaults, TournamentConfig};
use crate::error::{Result, TournamentError};
use crate::ledger::Ledger;
use crate::types::{Match, Team};
use serde::{de::DeserializeOwned, Serialize};
use std::{
  collections::HashMap,
  fs,
  path::{Path, PathBuf},
};

pub const TEAMS_KEY: &str = "teams";
pub const MATCHES_KEY: &str = "matches";
pub const ROUNDS_KEY: &str = "rounds";
pub const FIELDS_KEY: &str = "fields";
pub const BEST_TEAM_END_KEY: &str = "bestTeamEnd";
pub const MAX_STAND_IN_KEY: &str = "maxStandInAppearances";
pub const SAVED_AT_KEY: &str = "savedAt";

/// Key/value storage for JSON blobs.
pub trait BlobStore: Send {
  fn get(&self, key: &str) -> Result<Option<String>>;
  fn put(&mut self, key: &str, value: &str) -> Result<()>;

  /// Where the blobs live, if they live on disk.
  fn location(&self) -> Option<&Path> {
    None
  }
}

/// One `<key>.json` file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
  dir: PathBuf,
}

impl FileBlobStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    FileBlobStore { dir: dir.into() }
  }

  fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{key}.json"))
  }
}

impl BlobStore for FileBlobStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let path = self.path_for(key);
    if !path.is_file() {
      return Ok(None);
    }
    fs::read_to_string(&path)
      .map(Some)
      .map_err(|e| storage_error(key, format!("read {}: {e}", path.display())))
  }

  fn put(&mut self, key: &str, value: &str) -> Result<()> {
    fs::create_dir_all(&self.dir)
      .map_err(|e| storage_error(key, format!("create {}: {e}", self.dir.display())))?;
    let path = self.path_for(key);
    fs::write(&path, value).map_err(|e| storage_error(key, format!("write {}: {e}", path.display())))
  }

  fn location(&self) -> Option<&Path> {
    Some(self.dir.as_path())
  }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
  entries: HashMap<String, String>,
}

impl MemoryBlobStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl BlobStore for MemoryBlobStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    Ok(self.entries.get(key).cloned())
  }

  fn put(&mut self, key: &str, value: &str) -> Result<()> {
    self.entries.insert(key.to_string(), value.to_string());
    Ok(())
  }
}

fn storage_error(key: &str, message: String) -> TournamentError {
  TournamentError::Storage {
    key: key.to_string(),
    message,
  }
}

pub fn get_json<T: DeserializeOwned>(store: &dyn BlobStore, key: &str) -> Result<Option<T>> {
  match store.get(key)? {
    Some(raw) if !raw.trim().is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
    _ => Ok(None),
  }
}

pub fn put_json<T: Serialize + ?Sized>(store: &mut dyn BlobStore, key: &str, value: &T) -> Result<()> {
  let payload = serde_json::to_string_pretty(value)?;
  store.put(key, &payload)
}

/// Defaults, then whatever the store holds, then environment overrides.
pub fn load_config(store: &dyn BlobStore) -> Result<TournamentConfig> {
  let mut config = TournamentConfig::default();
  if let Some(rounds) = get_json(store, ROUNDS_KEY)? {
    config.total_rounds = rounds;
  }
  if let Some(fields) = get_json(store, FIELDS_KEY)? {
    config.field_count = fields;
  }
  if let Some(best_team_end) = get_json(store, BEST_TEAM_END_KEY)? {
    config.best_team_end = best_team_end;
  }
  if let Some(max) = get_json(store, MAX_STAND_IN_KEY)? {
    config.max_stand_in_appearances = max;
  }
  Ok(apply_env_defaults(config))
}

pub fn save_config(store: &mut dyn BlobStore, config: &TournamentConfig) -> Result<()> {
  put_json(store, ROUNDS_KEY, &config.total_rounds)?;
  put_json(store, FIELDS_KEY, &config.field_count)?;
  put_json(store, BEST_TEAM_END_KEY, &config.best_team_end)?;
  put_json(store, MAX_STAND_IN_KEY, &config.max_stand_in_appearances)
}

pub fn load_ledger(store: &dyn BlobStore) -> Result<Ledger> {
  let teams: Vec<Team> = get_json(store, TEAMS_KEY)?.unwrap_or_default();
  let matches: Vec<Match> = get_json(store, MATCHES_KEY)?.unwrap_or_default();
  tracing::debug!("loaded {} team(s) and {} match(es)", teams.len(), matches.len());
  Ok(Ledger { teams, matches })
}

/// Write the roster and match list and stamp the save time, which is returned.
pub fn save_ledger(store: &mut dyn BlobStore, ledger: &Ledger) -> Result<String> {
  put_json(store, TEAMS_KEY, &ledger.teams)?;
  put_json(store, MATCHES_KEY, &ledger.matches)?;
  let saved_at = chrono::Local::now().to_rfc3339();
  put_json(store, SAVED_AT_KEY, &saved_at)?;
  Ok(saved_at)
}

pub fn saved_at(store: &dyn BlobStore) -> Result<Option<String>> {
  get_json(store, SAVED_AT_KEY)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Winner;

  fn sample_ledger() -> Ledger {
    let mut ledger = Ledger::with_teams(vec![Team::new(1, "Otters").ready(), Team::new(2, "Herons")]);
    ledger.matches.push(Match {
      round: 1,
      phase: 1,
      field: 1,
      team1: "Otters".to_string(),
      team2: None,
      score_team1: 0,
      score_team2: 0,
      winner: Winner::Team("Otters".to_string()),
      is_friendly_for_team2: false,
      forced_rematch: false,
    });
    ledger
  }

  #[test]
  fn test_file_store_round_trips_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileBlobStore::new(dir.path().join("data"));
    let ledger = sample_ledger();

    let stamp = save_ledger(&mut store, &ledger).unwrap();
    assert!(dir.path().join("data").join("teams.json").is_file());
    assert!(dir.path().join("data").join("matches.json").is_file());
    assert_eq!(saved_at(&store).unwrap(), Some(stamp));

    let reopened = FileBlobStore::new(dir.path().join("data"));
    assert_eq!(load_ledger(&reopened).unwrap(), ledger);
  }

  #[test]
  fn test_missing_keys_give_empty_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileBlobStore::new(dir.path());
    let ledger = load_ledger(&store).unwrap();
    assert!(ledger.teams.is_empty());
    assert!(ledger.matches.is_empty());
    assert_eq!(saved_at(&store).unwrap(), None);
  }

  #[test]
  fn test_corrupt_blob_is_an_error() {
    let mut store = MemoryBlobStore::new();
    store.put(TEAMS_KEY, "{not json").unwrap();
    assert!(matches!(load_ledger(&store), Err(TournamentError::Json(_))));
  }

  #[test]
  fn test_config_keys_are_stored_separately() {
    let mut store = MemoryBlobStore::new();
    let config = TournamentConfig {
      field_count: 3,
      total_rounds: 6,
      best_team_end: false,
      max_stand_in_appearances: 2,
    };
    save_config(&mut store, &config).unwrap();
    assert_eq!(store.get(FIELDS_KEY).unwrap().as_deref(), Some("3"));
    assert_eq!(store.get(BEST_TEAM_END_KEY).unwrap().as_deref(), Some("false"));
    assert_eq!(load_config(&store).unwrap(), config);
  }
}
