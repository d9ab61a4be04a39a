//! Configuration loader and validator for the Steam news watcher.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::model::Game;

pub const USER_ID_PLACEHOLDER: &str = "DISCORD USER ID HERE";
pub const WEBHOOK_URL_PLACEHOLDER: &str = "WEBHOOK URL HERE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub app: App,
    pub discord: Discord,
    #[serde(default)]
    pub steam: Steam,
    #[serde(default)]
    pub games: Vec<Game>,
}

/// Run-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Maximum number of apps fetched at once.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Maximum number of announcements per webhook message.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Delay between runs in `--watch` mode.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

/// Discord webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Discord {
    /// User mentioned at the top of every message.
    pub user_id: String,
    pub webhook_url: String,
    #[serde(default = "default_discord_timeout_secs")]
    pub timeout_secs: u64,
}

/// Steam Web API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Steam {
    #[serde(default = "default_steam_base_url")]
    pub base_url: String,
    /// Body truncation sent as `maxlength`; only title, url and date are read.
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default = "default_steam_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_data_dir() -> String {
    "./data".into()
}

fn default_workers() -> usize {
    8
}

fn default_batch_size() -> usize {
    5
}

fn default_poll_interval_secs() -> u64 {
    900
}

fn default_discord_timeout_secs() -> u64 {
    3
}

fn default_steam_base_url() -> String {
    "https://api.steampowered.com".into()
}

fn default_max_length() -> u32 {
    10
}

fn default_steam_timeout_secs() -> u64 {
    5
}

impl Default for App {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            workers: default_workers(),
            batch_size: default_batch_size(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Default for Steam {
    fn default() -> Self {
        Self {
            base_url: default_steam_base_url(),
            max_length: default_max_length(),
            timeout_secs: default_steam_timeout_secs(),
        }
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    /// True while the Discord credentials still hold the placeholders written
    /// by [`write_example`]. Runs must not start against such a config.
    pub fn is_unconfigured(&self) -> bool {
        self.discord.user_id.trim() == USER_ID_PLACEHOLDER
            || self.discord.webhook_url.trim() == WEBHOOK_URL_PLACEHOLDER
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.app.poll_interval_secs)
    }

    pub fn database_url(&self) -> String {
        format!(
            "sqlite://{}/steam_news.db",
            self.app.data_dir.trim_end_matches('/')
        )
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Write the example configuration to `path`, creating parent directories.
pub fn write_example(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, example())?;
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.app.workers == 0 {
        return Err(ConfigError::Invalid("app.workers must be > 0"));
    }
    if cfg.app.batch_size == 0 {
        return Err(ConfigError::Invalid("app.batch_size must be > 0"));
    }
    if cfg.app.poll_interval_secs == 0 {
        return Err(ConfigError::Invalid("app.poll_interval_secs must be > 0"));
    }

    if cfg.discord.user_id.trim().is_empty() {
        return Err(ConfigError::Invalid("discord.user_id must be non-empty"));
    }
    let webhook = cfg.discord.webhook_url.trim();
    if webhook != WEBHOOK_URL_PLACEHOLDER && !is_http_url(webhook) {
        return Err(ConfigError::Invalid(
            "discord.webhook_url must be an http(s) URL",
        ));
    }
    if cfg.discord.timeout_secs == 0 {
        return Err(ConfigError::Invalid("discord.timeout_secs must be > 0"));
    }

    if !is_http_url(cfg.steam.base_url.trim()) {
        return Err(ConfigError::Invalid("steam.base_url must be an http(s) URL"));
    }
    if cfg.steam.timeout_secs == 0 {
        return Err(ConfigError::Invalid("steam.timeout_secs must be > 0"));
    }

    let mut seen = HashSet::new();
    for game in &cfg.games {
        if game.name.trim().is_empty() {
            return Err(ConfigError::Invalid("games[].name must be non-empty"));
        }
        if game.appid <= 0 {
            return Err(ConfigError::Invalid("games[].appid must be positive"));
        }
        if !seen.insert(game.appid) {
            return Err(ConfigError::Invalid("games[].appid must be unique"));
        }
    }

    Ok(())
}

/// Returns the example YAML written on first start.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  workers: 8
  batch_size: 5
  poll_interval_secs: 900

discord:
  user_id: "DISCORD USER ID HERE"
  webhook_url: "WEBHOOK URL HERE"
  timeout_secs: 3

steam:
  base_url: "https://api.steampowered.com"
  max_length: 10
  timeout_secs: 5

games:
  - name: "Dyson Sphere Program"
    appid: 1366540
  - name: "Factorio"
    appid: 427520
  - name: "Metro 2033"
    appid: 43110
  - name: "Dead Space: Remastered"
    appid: 1693980
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn configured() -> Config {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.discord.user_id = "123456789".into();
        cfg.discord.webhook_url = "https://discord.com/api/webhooks/1/abc".into();
        cfg
    }

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.games.len(), 4);
        assert_eq!(cfg.app.batch_size, 5);
    }

    #[test]
    fn example_is_unconfigured() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        assert!(cfg.is_unconfigured());
        assert!(!configured().is_unconfigured());

        let mut cfg = configured();
        cfg.discord.user_id = USER_ID_PLACEHOLDER.into();
        assert!(cfg.is_unconfigured());
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let yaml = r#"discord:
  user_id: "1"
  webhook_url: "https://example.com/hook"
games:
  - name: "Factorio"
    appid: "427520"
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.app, App::default());
        assert_eq!(cfg.steam, Steam::default());
        assert_eq!(cfg.discord.timeout_secs, 3);
        assert_eq!(cfg.games[0].appid, 427520);
    }

    #[test]
    fn invalid_webhook_url() {
        let mut cfg = configured();
        cfg.discord.webhook_url = "discord.com/hook".into();
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("webhook_url")), _ => panic!("wrong error") }
    }

    #[test]
    fn invalid_app_limits() {
        let mut cfg = configured();
        cfg.app.workers = 0;
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("workers")), _ => panic!("wrong error") }

        let mut cfg = configured();
        cfg.app.batch_size = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = configured();
        cfg.steam.timeout_secs = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn duplicate_appids_rejected() {
        let mut cfg = configured();
        cfg.games.push(Game::new("Factorio again", 427520));
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("unique")), _ => panic!("wrong error") }
    }

    #[test]
    fn ensure_dirs_creates_data_dir() {
        let td = tempdir().unwrap();
        let data_path = td.path().join("data");
        let mut cfg = configured();
        cfg.app.data_dir = data_path.to_string_lossy().to_string();
        cfg.ensure_dirs().unwrap();
        assert!(data_path.exists());
    }

    #[test]
    fn write_example_then_load() {
        let td = tempdir().unwrap();
        let p = td.path().join("nested").join("config.yaml");
        write_example(&p).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert!(cfg.is_unconfigured());
        assert_eq!(cfg.games[1], Game::new("Factorio", 427520));
    }
}
