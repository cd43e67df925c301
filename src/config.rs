//! Configuration file parser for ~/.config/newsdesk/config.toml.
//!
//! The file is optional; a missing or empty file yields `Config::default()`.
//! Unknown keys are accepted but logged, since they are usually typos.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::controller::flows::{DEFAULT_ARTICLE_LENGTH, DEFAULT_WORKERS};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Application configuration. Every key is optional.
///
/// `Debug` masks `api_key`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service root, e.g. `http://127.0.0.1:5000`. Plain HTTP only for localhost.
    pub base_url: String,

    /// Theme variant: "dark" or "light".
    pub theme: String,

    /// Initial scraper worker count (clamped to 1..=10).
    pub default_workers: u8,

    /// Initial target article length in words (clamped to 100..=5000).
    pub default_max_length: u32,

    /// Where downloads are written. Defaults to the current directory.
    pub download_dir: Option<PathBuf>,

    /// Topics offered in the topic selector.
    pub topics: Vec<String>,

    /// Generation templates offered in the template selector.
    pub templates: Vec<String>,

    /// Keybinding overrides: action name → key string.
    pub keybindings: HashMap<String, String>,

    /// API key used when none has been saved from the UI.
    pub api_key: Option<String>,
}

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            theme: "dark".to_string(),
            default_workers: DEFAULT_WORKERS,
            default_max_length: DEFAULT_ARTICLE_LENGTH,
            download_dir: None,
            topics: ["all", "technology", "business", "telecom", "general"]
                .map(String::from)
                .to_vec(),
            templates: [
                "telecom_news",
                "digital_inclusion",
                "tech_trends",
                "customer_focus",
            ]
            .map(String::from)
            .to_vec(),
            keybindings: HashMap::new(),
            api_key: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("theme", &self.theme)
            .field("default_workers", &self.default_workers)
            .field("default_max_length", &self.default_max_length)
            .field("download_dir", &self.download_dir)
            .field("topics", &self.topics)
            .field("templates", &self.templates)
            .field("keybindings", &self.keybindings)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "base_url",
        "theme",
        "default_workers",
        "default_max_length",
        "download_dir",
        "topics",
        "templates",
        "keybindings",
        "api_key",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → defaults
    /// - Invalid TOML → `ConfigError::Parse` with line information
    /// - Over 1 MB → `ConfigError::TooLarge`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let mut config: Config = toml::from_str(&content)?;
        config.normalize();
        tracing::info!(
            path = %path.display(),
            base_url = %config.base_url,
            theme = %config.theme,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Restores defaults for lists left empty and drops blank entries.
    fn normalize(&mut self) {
        let defaults = Self::default();
        self.topics.retain(|t| !t.trim().is_empty());
        if self.topics.is_empty() {
            self.topics = defaults.topics;
        }
        self.templates.retain(|t| !t.trim().is_empty());
        if self.templates.is_empty() {
            self.templates = defaults.templates;
        }
        if self.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.api_key = None;
        }
    }

    /// Download directory, falling back to the working directory.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_config(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.theme, "dark");
        assert_eq!(config.default_workers, 5);
        assert_eq!(config.default_max_length, 800);
        assert_eq!(config.topics[0], "all");
        assert_eq!(config.templates.len(), 4);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/newsdesk_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.theme, "dark");
    }

    #[test]
    fn test_empty_file_returns_default() {
        let path = write_config("newsdesk_config_test_empty", "  \n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_full_config() {
        let path = write_config(
            "newsdesk_config_test_full",
            r#"
base_url = "https://news.example.com"
theme = "light"
default_workers = 8
default_max_length = 1200
download_dir = "/tmp/newsdesk-downloads"
topics = ["telecom", "business"]
templates = ["tech_trends"]
api_key = "sk-config"

[keybindings]
scrape = "S"
"#,
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_url, "https://news.example.com");
        assert_eq!(config.theme, "light");
        assert_eq!(config.default_workers, 8);
        assert_eq!(config.default_max_length, 1200);
        assert_eq!(
            config.download_dir(),
            PathBuf::from("/tmp/newsdesk-downloads")
        );
        assert_eq!(config.topics, vec!["telecom", "business"]);
        assert_eq!(config.templates, vec!["tech_trends"]);
        assert_eq!(config.keybindings.get("scrape").map(String::as_str), Some("S"));
        assert_eq!(config.api_key.as_deref(), Some("sk-config"));
    }

    #[test]
    fn test_empty_lists_fall_back() {
        let path = write_config(
            "newsdesk_config_test_empty_lists",
            "topics = []\ntemplates = [\"\"]\napi_key = \"\"\n",
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.topics, Config::default().topics);
        assert_eq!(config.templates, Config::default().templates);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let path = write_config("newsdesk_config_test_invalid", "base_url = [unterminated");
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_wrong_type_is_error() {
        let path = write_config("newsdesk_config_test_wrongtype", "default_workers = \"five\"");
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_config(
            "newsdesk_config_test_unknown",
            "theme = \"light\"\nrefresh_interval = 5\n",
        );
        assert_eq!(Config::load(&path).unwrap().theme, "light");
    }

    #[test]
    fn test_too_large_rejected() {
        let big = format!("theme = \"dark\"\n# {}\n", "x".repeat(1_100_000));
        let path = write_config("newsdesk_config_test_too_large", &big);
        assert!(matches!(Config::load(&path), Err(ConfigError::TooLarge(_))));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config {
            api_key: Some("sk-secret".into()),
            ..Config::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
