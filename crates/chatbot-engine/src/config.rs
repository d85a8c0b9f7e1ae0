//! Configuration for the chatbot engine.
//!
//! Settings come from a JSON config file and are then overridden by
//! environment variables (`GEMINI_API_KEY`, `CHATBOT_MODEL`).

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::session::is_valid_name;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the model id.
pub const MODEL_ENV: &str = "CHATBOT_MODEL";

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Model id passed to the generation endpoint.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the generation API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout in seconds for a single generation request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Key under which the transcript is stored in the session store.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// API key. Usually supplied through `GEMINI_API_KEY` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_storage_key() -> String {
    "chatHistory".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
            storage_key: default_storage_key(),
            api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration from a file, or use defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Apply overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    #[must_use]
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.model = model;
        }
        self
    }

    /// Copy of the config that is safe to print.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}

/// Well-known locations for config, session state and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// JSON config file.
    pub config_file: PathBuf,
    /// Directory holding one subdirectory per session.
    pub sessions_dir: PathBuf,
    /// Log file used while the TUI owns the terminal.
    pub log_file: PathBuf,
}

impl Paths {
    /// Resolve the platform directories for the application.
    pub fn discover() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("", "", "chatbot").ok_or(ConfigError::NoHomeDir)?;
        Ok(Self::rooted(dirs.config_dir(), dirs.data_local_dir()))
    }

    /// Build paths under explicit config and data directories.
    pub fn rooted(config_dir: &Path, data_dir: &Path) -> Self {
        Self {
            config_file: config_dir.join("config.json"),
            sessions_dir: data_dir.join("sessions"),
            log_file: data_dir.join("chatbot.log"),
        }
    }

    /// Directory of a named session.
    ///
    /// The name must stay a single path component under `sessions_dir`.
    pub fn session_dir(&self, session: &str) -> Result<PathBuf, ConfigError> {
        if !is_valid_name(session) {
            return Err(ConfigError::InvalidSession(session.to_string()));
        }
        Ok(self.sessions_dir.join(session))
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// No home directory to derive default locations from.
    #[error("could not determine a home directory")]
    NoHomeDir,

    /// Session name that is not a plain `[A-Za-z0-9_-]` identifier.
    #[error("invalid session name {0:?} (use letters, digits, '-' or '_')")]
    InvalidSession(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.storage_key, "chatHistory");
        assert_eq!(config.request_timeout_seconds, 120);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"model": "gemini-2.5-pro"}"#).unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.base_url, default_base_url());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.json");

        let config = Config {
            model: "gemini-2.0-flash".into(),
            ..Config::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_or_default(&temp.path().join("missing.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default().with_overrides_from(|name| match name {
            API_KEY_ENV => Some("secret".into()),
            MODEL_ENV => Some("gemini-2.5-pro".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.model, "gemini-2.5-pro");
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let config = Config {
            api_key: Some("from-file".into()),
            ..Config::default()
        }
        .with_overrides_from(|_| Some("  ".into()));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_redacted_hides_key() {
        let config = Config {
            api_key: Some("secret".into()),
            ..Config::default()
        };
        let json = serde_json::to_string(&config.redacted()).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("********"));
    }

    #[test]
    fn test_rooted_paths() {
        let paths = Paths::rooted(Path::new("/cfg"), Path::new("/data"));
        assert_eq!(paths.config_file, Path::new("/cfg/config.json"));
        assert_eq!(paths.session_dir("work").unwrap(), Path::new("/data/sessions/work"));
        assert_eq!(paths.log_file, Path::new("/data/chatbot.log"));
    }

    #[test]
    fn test_session_name_cannot_escape_sessions_dir() {
        let paths = Paths::rooted(Path::new("/cfg"), Path::new("/data"));
        for name in ["../../x", "a/b", "..", "", "with space"] {
            assert!(
                matches!(paths.session_dir(name), Err(ConfigError::InvalidSession(_))),
                "{name:?} accepted"
            );
        }
        assert!(paths.session_dir("work_2-b").is_ok());
    }
}
