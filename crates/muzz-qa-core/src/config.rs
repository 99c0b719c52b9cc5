//! Persistent configuration for muzz-qa.
//!
//! Stores suite settings in `~/.muzz-qa/config.json`: where the device agent
//! listens and the timeouts used by waits and polls. Every field has a
//! default, so a partial file (or none at all) is fine.
//!
//! # Example
//!
//! ```no_run
//! use muzz_qa_core::config::SuiteConfig;
//!
//! // Load (returns defaults if file doesn't exist)
//! let config = SuiteConfig::load();
//! println!("agent at {}:{}", config.agent_host, config.agent_port);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_DIRNAME: &str = ".muzz-qa";
const CONFIG_FILENAME: &str = "config.json";

/// Errors reading an explicitly requested config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot determine home directory")]
    NoHome,

    #[error("cannot write config: {0}")]
    Write(#[from] std::io::Error),
}

/// Persistent suite configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Host the device agent is reachable on (usually a forwarded port).
    pub agent_host: String,
    /// TCP port of the device agent.
    pub agent_port: u16,
    /// Default bound for silent element waits.
    pub default_wait_ms: u64,
    /// How long a login attempt may take to show its outcome.
    pub login_timeout_ms: u64,
    /// Bound passed to the driver's idle wait after each interaction.
    pub idle_timeout_ms: u64,
    /// Delay between polls in waits.
    pub poll_interval_ms: u64,
    /// Pause after each like so the backend records it before the next click.
    pub like_pacing_ms: u64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            agent_host: "127.0.0.1".to_string(),
            agent_port: 9800,
            default_wait_ms: 5_000,
            login_timeout_ms: 5_000,
            idle_timeout_ms: 5_000,
            poll_interval_ms: 100,
            like_pacing_ms: 500,
        }
    }
}

/// Returns `~/.muzz-qa`, if the home directory is known.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIRNAME))
}

impl SuiteConfig {
    /// Load config from `~/.muzz-qa/config.json`.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        config_dir()
            .map(|dir| dir.join(CONFIG_FILENAME))
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Load config from an explicit path, reporting why it failed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config to `~/.muzz-qa/config.json`, returning the path written.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let dir = config_dir().ok_or(ConfigError::NoHome)?;
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(CONFIG_FILENAME);
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to an explicit path, creating missing parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn default_wait(&self) -> Duration {
        Duration::from_millis(self.default_wait_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn like_pacing(&self) -> Duration {
        Duration::from_millis(self.like_pacing_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_suite_timeouts() {
        let config = SuiteConfig::default();
        assert_eq!(config.default_wait_ms, 5_000);
        assert_eq!(config.login_timeout_ms, 5_000);
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.like_pacing(), Duration::from_millis(500));
    }

    #[test]
    fn deserialize_empty_json() {
        let loaded: SuiteConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(loaded, SuiteConfig::default());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let loaded: SuiteConfig =
            serde_json::from_str(r#"{"agent_port": 7001, "like_pacing_ms": 0}"#).unwrap();
        assert_eq!(loaded.agent_port, 7001);
        assert_eq!(loaded.like_pacing_ms, 0);
        assert_eq!(loaded.agent_host, "127.0.0.1");
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = SuiteConfig {
            agent_host: "10.0.2.2".into(),
            ..SuiteConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(SuiteConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn save_to_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("muzz").join("config.json");
        SuiteConfig::default().save_to(&path).unwrap();
        assert_eq!(SuiteConfig::load_from(&path).unwrap(), SuiteConfig::default());
    }

    #[test]
    fn load_from_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SuiteConfig::load_from(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_from_garbage_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        let err = SuiteConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_returns_default_for_missing_file() {
        // Should not panic whether or not a real config file exists.
        let _ = SuiteConfig::load();
    }
}
