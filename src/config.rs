use crate::error::{Result, ScoreboardError};
use crate::types::*;
use chrono::Local;
use std::{
    env,
    fs,
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

pub fn app_root() -> PathBuf {
  if let Some(raw) = env_default("SCOREBOARD_ROOT") {
    return PathBuf::from(raw);
  }
  env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn resolve_root_path(root: &Path, raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    root.join(path)
  }
}

pub fn config_path(root: &Path) -> PathBuf {
  root.join("config.json")
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn env_flag_true(key: &str) -> bool {
  match env::var(key) {
    Ok(value) => {
      let value = value.trim().to_ascii_lowercase();
      matches!(value.as_str(), "1" | "true" | "yes" | "on")
    }
    Err(_) => false,
  }
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  if config.output_dir.trim().is_empty() {
    config.output_dir = env_default("SCOREBOARD_OUTPUT_DIR").unwrap_or_else(|| AppConfig::default().output_dir);
  }
  if config.asset_dir.trim().is_empty() {
    config.asset_dir = env_default("SCOREBOARD_ASSET_DIR").unwrap_or_else(|| AppConfig::default().asset_dir);
  }
  if config.save_file.trim().is_empty() {
    config.save_file = env_default("SCOREBOARD_SAVE_FILE").unwrap_or_else(|| AppConfig::default().save_file);
  }
  if config.log_dir.trim().is_empty() {
    config.log_dir = AppConfig::default().log_dir;
  }
  config
}

/// Env vars win over the defaults but never over an explicit config file.
pub fn load_config(root: &Path) -> AppConfig {
  let path = config_path(root);
  if !path.is_file() {
    let blank = AppConfig {
      output_dir: String::new(),
      asset_dir: String::new(),
      save_file: String::new(),
      log_dir: String::new(),
    };
    return apply_env_defaults(blank);
  }
  match read_json::<AppConfig>(&path) {
    Ok(config) => apply_env_defaults(config),
    Err(e) => {
      error!(error = %e, "failed to load config, using defaults");
      apply_env_defaults(AppConfig::default())
    }
  }
}

/// Resolved locations for one session.
#[derive(Debug, Clone)]
pub struct AppPaths {
  pub root: PathBuf,
  pub output: PathBuf,
  pub assets: PathBuf,
  pub save_file: PathBuf,
  pub logs: PathBuf,
}

impl AppPaths {
  pub fn resolve(root: &Path, config: &AppConfig) -> Self {
    AppPaths {
      root: root.to_path_buf(),
      output: resolve_root_path(root, &config.output_dir),
      assets: resolve_root_path(root, &config.asset_dir),
      save_file: resolve_root_path(root, &config.save_file),
      logs: resolve_root_path(root, &config.log_dir),
    }
  }
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
  let data = fs::read_to_string(path).map_err(|e| ScoreboardError::io(path, e))?;
  serde_json::from_str::<T>(&data).map_err(|e| ScoreboardError::json(path, e))
}

pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
  if let Some(parent) = path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent).map_err(|e| ScoreboardError::io(parent, e))?;
    }
  }
  let payload = serde_json::to_string_pretty(value).map_err(|e| ScoreboardError::json(path, e))?;
  fs::write(path, payload).map_err(|e| ScoreboardError::io(path, e))
}

/// Never fails: a missing file is a first run, a broken one is moved aside
/// and replaced by defaults.
pub fn load_state(path: &Path) -> SavedState {
  if !path.is_file() {
    info!(path = %path.display(), "no saved state, starting fresh");
    return SavedState::default();
  }
  info!(path = %path.display(), "loading saved state");
  match read_json::<SavedState>(path) {
    Ok(state) => state,
    Err(e) => {
      error!(error = %e, "failed to load saved state, defaulting");
      preserve_broken_save(path);
      SavedState::default()
    }
  }
}

pub fn save_state(path: &Path, state: &SavedState) -> Result<()> {
  write_json(path, state)?;
  info!(path = %path.display(), "saved state");
  Ok(())
}

fn preserve_broken_save(path: &Path) {
  let timestamp = Local::now().format("%Y%m%d-%H%M%S");
  let file_name = path
    .file_name()
    .map(|name| name.to_string_lossy().to_string())
    .unwrap_or_else(|| "save.json".to_string());
  let backup = path.with_file_name(format!("{file_name}.{timestamp}.bak"));
  match fs::rename(path, &backup) {
    Ok(()) => warn!(backup = %backup.display(), "moved unreadable save aside"),
    Err(e) => warn!(error = %e, "could not move unreadable save aside"),
  }
}

pub fn load_env_file(root: &Path) {
  let env_path = root.join(".env");
  if !env_path.is_file() {
    return;
  }
  let contents = match fs::read_to_string(&env_path) {
    Ok(data) => data,
    Err(_) => return,
  };
  for line in contents.lines() {
    if let Some((key, value)) = parse_env_line(line) {
      if env::var_os(&key).is_none() {
        env::set_var(key, value);
      }
    }
  }
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let trimmed = line.trim();
  if trimmed.is_empty() || trimmed.starts_with('#') {
    return None;
  }
  let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
  let (key, raw_value) = trimmed.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  let mut value = raw_value.trim();
  if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if let Some(idx) = value.find('#') {
    value = value[..idx].trim_end();
  }
  Some((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::ScratchDir;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_parse_env_line() {
    assert_eq!(parse_env_line("# comment"), None);
    assert_eq!(parse_env_line(""), None);
    assert_eq!(
      parse_env_line("export SCOREBOARD_ROOT=\"/srv/cast\""),
      Some(("SCOREBOARD_ROOT".to_string(), "/srv/cast".to_string()))
    );
    assert_eq!(
      parse_env_line("SCOREBOARD_OUTPUT_DIR=out # trailing"),
      Some(("SCOREBOARD_OUTPUT_DIR".to_string(), "out".to_string()))
    );
  }

  #[test]
  fn test_load_state_missing_file_defaults() {
    let dir = ScratchDir::new("config-missing");
    let state = load_state(&dir.path().join("save.json"));
    assert_eq!(state, SavedState::default());
  }

  #[test]
  fn test_load_state_malformed_json_falls_back_and_keeps_backup() {
    let dir = ScratchDir::new("config-malformed");
    let path = dir.path().join("save.json");
    fs::write(&path, "{ not json").unwrap();

    let state = load_state(&path);
    assert_eq!(state, SavedState::default());
    assert!(!path.exists());
    let backups: Vec<_> = fs::read_dir(dir.path())
      .unwrap()
      .filter_map(|entry| entry.ok())
      .filter(|entry| entry.file_name().to_string_lossy().ends_with(".bak"))
      .collect();
    assert_eq!(backups.len(), 1);
  }

  #[test]
  fn test_partial_document_loads_with_defaults() {
    let dir = ScratchDir::new("config-partial");
    let path = dir.path().join("save.json");
    fs::write(&path, r#"{"mapmanager": {"mapset": [{"pool": "Escort"}]}}"#).unwrap();

    let state = load_state(&path);
    assert_eq!(state.mapmanager.mapset.len(), 1);
    assert_eq!(state.mapmanager.mapset[0].score1, "0");
    assert_eq!(state.mapmanager.mapstyle, DEFAULT_MAP_STYLE);
    assert_eq!(state.customdatamanager.entries, None);
  }

  #[test]
  fn test_save_then_load_state() {
    let dir = ScratchDir::new("config-save");
    let path = dir.path().join("nested").join("save.json");
    let mut state = SavedState::default();
    state.livemanager.title = "Grand Final".to_string();
    save_state(&path, &state).unwrap();
    assert_eq!(load_state(&path), state);
  }

  #[test]
  fn test_app_paths_resolve_relative_to_root() {
    let root = PathBuf::from("/srv/cast");
    let paths = AppPaths::resolve(&root, &AppConfig::default());
    assert_eq!(paths.output, root.join("output"));
    assert_eq!(paths.assets, root.join("assets"));
    assert_eq!(paths.save_file, root.join("save.json"));
  }
}
