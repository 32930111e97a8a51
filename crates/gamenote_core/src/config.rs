//! Application configuration resolved from environment variables.
//!
//! # Responsibility
//! - Resolve the mentor credential, storage path and logging settings.
//! - Apply defaults so every setting except the API key is optional.
//!
//! # Invariants
//! - A missing API key is not a startup error; it only disables the mentor
//!   (see `MentorClient::is_configured`).
//! - Blank variables are treated as unset.

use crate::logging::{default_log_level, LoggingConfig};
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

pub const ENV_API_KEY: &str = "GAMENOTE_GEMINI_API_KEY";
pub const ENV_MODEL: &str = "GAMENOTE_GEMINI_MODEL";
pub const ENV_BASE_URL: &str = "GAMENOTE_GEMINI_BASE_URL";
pub const ENV_DB_PATH: &str = "GAMENOTE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "GAMENOTE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "GAMENOTE_LOG_DIR";

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_DB_FILE_NAME: &str = "gamenote.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "gamenote-logs";

/// Gemini endpoint settings.
#[derive(Clone, PartialEq, Eq)]
pub struct MentorSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl Default for MentorSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

// Keeps the key out of debug output and logs.
impl Debug for MentorSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentorSettings")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Fully resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub mentor: MentorSettings,
    pub db_path: PathBuf,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through `lookup` (variable name -> value).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = MentorSettings::default();
        let mentor = MentorSettings {
            api_key: read(ENV_API_KEY).unwrap_or_default(),
            model: read(ENV_MODEL).unwrap_or(defaults.model),
            base_url: read(ENV_BASE_URL).unwrap_or(defaults.base_url),
        };
        let db_path = read(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        let logging = LoggingConfig::new(
            read(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            read(ENV_LOG_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME)),
        );

        Self {
            mentor,
            db_path,
            logging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, ENV_API_KEY, ENV_DB_PATH, ENV_MODEL};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert!(config.mentor.api_key.is_empty());
        assert_eq!(config.mentor.model, DEFAULT_MODEL);
        assert_eq!(config.mentor.base_url, DEFAULT_BASE_URL);
        assert!(config.db_path.ends_with("gamenote.sqlite3"));
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_MODEL, "   "), (ENV_API_KEY, " k ")]));
        assert_eq!(config.mentor.model, DEFAULT_MODEL);
        assert_eq!(config.mentor.api_key, "k");
    }

    #[test]
    fn explicit_db_path_wins() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_DB_PATH, "/data/notes.db")]));
        assert_eq!(config.db_path, PathBuf::from("/data/notes.db"));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_API_KEY, "AIza-secret")]));
        let rendered = format!("{:?}", config.mentor);
        assert!(!rendered.contains("AIza-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
