use crate::error::{Result, TournamentError};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::{
  env,
  fs,
  path::PathBuf,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TournamentConfig {
  pub field_count: u32,
  pub total_rounds: u32,
  /// Reschedule the final round so the top pairings play in the last phase.
  pub best_team_end: bool,
  pub max_stand_in_appearances: u32,
}

impl Default for TournamentConfig {
  fn default() -> Self {
    TournamentConfig {
      field_count: DEFAULT_FIELD_COUNT,
      total_rounds: DEFAULT_TOTAL_ROUNDS,
      best_team_end: true,
      max_stand_in_appearances: DEFAULT_MAX_STAND_IN_APPEARANCES,
    }
  }
}

impl TournamentConfig {
  pub fn validate(&self) -> Result<()> {
    if self.field_count == 0 {
      return Err(TournamentError::InvalidConfig("field count must be at least 1".to_string()));
    }
    if self.total_rounds == 0 {
      return Err(TournamentError::InvalidConfig("total rounds must be at least 1".to_string()));
    }
    Ok(())
  }

  /// Clamp counts the engine divides or iterates by.
  pub fn normalize(mut self) -> Self {
    if self.field_count == 0 {
      tracing::warn!("field count 0 is not usable, using 1");
      self.field_count = 1;
    }
    if self.total_rounds == 0 {
      tracing::warn!("total rounds 0 is not usable, using 1");
      self.total_rounds = 1;
    }
    self
  }
}

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    repo_root().join(path)
  }
}

pub fn data_dir() -> PathBuf {
  match env_default("TOURNAMENT_DATA_DIR") {
    Some(raw) => resolve_repo_path(&raw),
    None => repo_root().join("data"),
  }
}

pub fn logs_dir() -> PathBuf {
  repo_root().join("logs")
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn env_flag(key: &str) -> Option<bool> {
  let value = env_default(key)?.to_ascii_lowercase();
  match value.as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => {
      tracing::warn!("{key}={value} is not a boolean, ignoring");
      None
    }
  }
}

pub fn env_u32(key: &str) -> Option<u32> {
  let value = env_default(key)?;
  match value.parse::<u32>() {
    Ok(parsed) => Some(parsed),
    Err(_) => {
      tracing::warn!("{key}={value} is not a positive integer, ignoring");
      None
    }
  }
}

pub fn apply_env_defaults(mut config: TournamentConfig) -> TournamentConfig {
  if let Some(value) = env_u32("TOURNAMENT_ROUNDS") {
    config.total_rounds = value;
  }
  if let Some(value) = env_u32("TOURNAMENT_FIELDS") {
    config.field_count = value;
  }
  if let Some(value) = env_flag("TOURNAMENT_BEST_TEAM_END") {
    config.best_team_end = value;
  }
  if let Some(value) = env_u32("TOURNAMENT_MAX_STAND_IN") {
    config.max_stand_in_appearances = value;
  }
  config.normalize()
}

/// Export `KEY=value` pairs from `<crate root>/.env` that the process
/// environment does not already define.
pub fn load_env_file() {
  let path = repo_root().join(".env");
  let Ok(contents) = fs::read_to_string(&path) else {
    return;
  };
  let mut applied = 0;
  for (key, value) in contents.lines().filter_map(parse_env_line) {
    if env::var_os(&key).is_some() {
      continue;
    }
    env::set_var(&key, value);
    applied += 1;
  }
  tracing::debug!("applied {applied} value(s) from {}", path.display());
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let line = line.trim();
  if line.is_empty() || line.starts_with('#') {
    return None;
  }
  let line = line.strip_prefix("export ").unwrap_or(line);
  let (key, rest) = line.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  Some((key.to_string(), env_value(rest.trim()).to_string()))
}

/// Strip matching quotes, or a trailing `# comment` from an unquoted value.
fn env_value(raw: &str) -> &str {
  for quote in ['"', '\''] {
    if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
      return &raw[1..raw.len() - 1];
    }
  }
  match raw.split_once('#') {
    Some((value, _)) => value.trim_end(),
    None => raw,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_env_line() {
    assert_eq!(
      parse_env_line("export TOURNAMENT_FIELDS=4"),
      Some(("TOURNAMENT_FIELDS".to_string(), "4".to_string()))
    );
    assert_eq!(
      parse_env_line("TOURNAMENT_DATA_DIR=\"./saves\""),
      Some(("TOURNAMENT_DATA_DIR".to_string(), "./saves".to_string()))
    );
    assert_eq!(
      parse_env_line("TOURNAMENT_ROUNDS=5 # five rounds"),
      Some(("TOURNAMENT_ROUNDS".to_string(), "5".to_string()))
    );
    assert_eq!(parse_env_line("# comment"), None);
    assert_eq!(parse_env_line("   "), None);
    assert_eq!(parse_env_line("=value"), None);
  }

  #[test]
  fn test_normalize_clamps_zero_counts() {
    let config = TournamentConfig {
      field_count: 0,
      total_rounds: 0,
      ..TournamentConfig::default()
    };
    assert!(config.validate().is_err());
    let config = config.normalize();
    assert_eq!(config.field_count, 1);
    assert_eq!(config.total_rounds, 1);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_config_deserializes_partial_json() {
    let config: TournamentConfig = serde_json::from_str(r#"{"fieldCount":3}"#).unwrap();
    assert_eq!(config.field_count, 3);
    assert_eq!(config.total_rounds, DEFAULT_TOTAL_ROUNDS);
    assert!(config.best_team_end);
  }
}
