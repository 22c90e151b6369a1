//! Bridge configuration persistence
//!
//! Stores highlighting preferences in `~/.config/pastelit/config.yaml`.
//! Missing or unreadable config falls back to defaults with a warning.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::syntax::LanguageId;

/// Worker timeout before the escaped plain-text fallback kicks in.
/// Matches the 5 second budget the snippet viewer always shipped with.
const DEFAULT_TIMEOUT_MS: u64 = 5000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Highlighting pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Milliseconds to wait for the worker before falling back
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Default language hint name (e.g. "rust"); None means detect
    #[serde(default)]
    pub language: Option<String>,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            language: None,
        }
    }
}

impl HighlightConfig {
    /// Load config from the default location, or defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!("Config file not found at {}, using defaults", path.display());
            return Self::default();
        }

        Self::load_from(&path)
    }

    /// Load config from an explicit path, or defaults on any error
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Worker timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve the configured default language hint, if any and valid
    pub fn default_language(&self) -> Option<LanguageId> {
        let name = self.language.as_deref()?;
        let resolved = LanguageId::from_name(name);
        if resolved.is_none() {
            tracing::warn!("Unknown language hint in config: {}", name);
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HighlightConfig::default();
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.default_language(), None);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "timeout_ms: 250\nlanguage: rust\n").unwrap();

        let config = HighlightConfig::load_from(&path);
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.default_language(), Some(LanguageId::Rust));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "language: go\n").unwrap();

        let config = HighlightConfig::load_from(&path);
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.default_language(), Some(LanguageId::Go));
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, ": not yaml [").unwrap();

        let config = HighlightConfig::load_from(&path);
        assert_eq!(config.timeout_ms, 5000);
    }

    #[test]
    fn test_unknown_language_hint_ignored() {
        let config = HighlightConfig {
            timeout_ms: 100,
            language: Some("cobol".to_string()),
        };
        assert_eq!(config.default_language(), None);
    }
}
