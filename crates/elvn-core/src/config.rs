use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the data directory.
pub const HOME_ENV: &str = "ELVN_HOME";

/// Data directory name under the user's home.
pub const DEFAULT_DIR_NAME: &str = ".11";

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "sync.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub journal: JournalConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Journal file name, relative to the data directory.
    #[serde(default = "default_journal_file")]
    pub file: String,
    /// Events older than this many days are pruned.
    #[serde(default = "default_stale_days")]
    pub stale_days: i64,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            file: default_journal_file(),
            stale_days: default_stale_days(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl JournalConfig {
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Absolute journal path under `base`.
    #[must_use]
    pub fn journal_path(&self, base: &Path) -> PathBuf {
        base.join(&self.file)
    }
}

/// Resolve the data directory: `$ELVN_HOME`, else `~/.11`.
///
/// # Errors
///
/// Fails when `ELVN_HOME` is unset and no home directory can be found.
pub fn base_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(DEFAULT_DIR_NAME))
}

/// Load `<base>/sync.toml`, falling back to defaults when it is absent.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or parsed.
pub fn load_sync_config(base: &Path) -> Result<SyncConfig> {
    load_config_file(&base.join(CONFIG_FILE))
}

/// Load a config file at an explicit path. A missing file yields defaults.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or parsed.
pub fn load_config_file(path: &Path) -> Result<SyncConfig> {
    if !path.exists() {
        return Ok(SyncConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<SyncConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn default_journal_file() -> String {
    "history".to_string()
}

const fn default_stale_days() -> i64 {
    30
}

const fn default_lock_timeout_ms() -> u64 {
    2_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_sync_config(dir.path()).expect("defaults");
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.journal.file, "history");
        assert_eq!(config.journal.stale_days, 30);
        assert_eq!(config.journal.lock_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), "[journal]\nstale_days = 7\n")
            .expect("write config");

        let config = load_sync_config(dir.path()).expect("parse");
        assert_eq!(config.journal.stale_days, 7);
        assert_eq!(config.journal.file, "history");
        assert_eq!(config.journal.lock_timeout_ms, 2_000);
    }

    #[test]
    fn journal_path_joins_base() {
        let config = JournalConfig {
            file: "events.log".into(),
            ..JournalConfig::default()
        };
        assert_eq!(
            config.journal_path(Path::new("/data/elvn")),
            PathBuf::from("/data/elvn/events.log")
        );
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[journal\n").expect("write config");

        let err = load_sync_config(dir.path()).expect_err("should fail");
        assert!(format!("{err}").contains("Failed to parse"));
    }
}
