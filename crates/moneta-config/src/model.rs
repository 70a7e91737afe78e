//! Configuration schema for Moneta.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root config for the Moneta client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MonetaConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub survey: SurveyConfig,
}

/// Remote advisor backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL for the advisor endpoints.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Local persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory for the chat log and metadata; defaults to the user data
    /// directory when unset.
    #[serde(default)]
    pub path: Option<String>,
}

/// Chat behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatConfig {
    /// Mode used for new sessions until the user toggles it.
    #[serde(default)]
    pub default_mode: ChatMode,
}

/// Survey behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// Open the risk-profile survey on startup.
    #[serde(default = "default_true")]
    pub auto_start: bool,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self { auto_start: true }
    }
}

fn default_true() -> bool {
    true
}

/// Chat request mode selected by the user-facing toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Threaded mode: the backend keeps the conversation under a thread id.
    #[default]
    Assistant,
    /// Stateless mode: each request stands alone, optionally carrying a
    /// one-shot product choice.
    Plain,
}

impl ChatMode {
    /// Return the mode as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Assistant => "assistant",
            ChatMode::Plain => "plain",
        }
    }

    /// The other mode, for the UI toggle.
    pub fn toggled(&self) -> Self {
        match self {
            ChatMode::Assistant => ChatMode::Plain,
            ChatMode::Plain => ChatMode::Assistant,
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatMode, MonetaConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_usable() {
        let config = MonetaConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.chat.default_mode, ChatMode::Assistant);
        assert!(config.survey.auto_start);
        assert_eq!(config.storage.path, None);
    }

    #[test]
    fn chat_mode_round_trips_lowercase() {
        let mode: ChatMode = serde_json::from_str("\"plain\"").expect("parse");
        assert_eq!(mode, ChatMode::Plain);
        assert_eq!(mode.as_str(), "plain");
        assert_eq!(mode.toggled(), ChatMode::Assistant);
    }
}
