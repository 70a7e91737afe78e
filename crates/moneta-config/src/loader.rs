//! Layered configuration loader.
//!
//! Discovers the user config file and a cwd-local file, merges them
//! (cwd wins), and produces the effective `MonetaConfig`. A single explicit
//! path can also be loaded without layering.

use crate::{ConfigError, MonetaConfig};
use directories::UserDirs;
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "moneta.json5";
/// Default config directory under the user home.
const DEFAULT_CONFIG_DIR: &str = ".moneta";

/// Effective config plus the layer paths that contributed to it.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged config.
    pub config: MonetaConfig,
    /// Paths of the layers that were found and merged, in precedence order.
    pub layers: Vec<PathBuf>,
}

impl MonetaConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value)
    }

    /// Load the layered config stack for the given working directory.
    ///
    /// Layer precedence (low -> high): user (`~/.moneta/moneta.json5`),
    /// cwd (`./moneta.json5`).
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        let cwd = cwd.as_ref();
        let mut layers = Vec::new();
        let mut merged = Value::Object(serde_json::Map::new());

        let candidates = [default_user_config_path(), Some(cwd.join(DEFAULT_CONFIG_FILE))];
        for path in candidates.into_iter().flatten() {
            if !path.exists() {
                debug!("skipping missing config layer (path={})", path.display());
                continue;
            }
            let contents = fs::read_to_string(&path)?;
            let value: Value = json5::from_str(&contents)?;
            merge_json_values(&mut merged, &value);
            layers.push(path);
        }

        let config = config_from_value(merged)?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }
}

/// Default user config path under the home directory.
fn default_user_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE)
    })
}

fn config_from_value(value: Value) -> Result<MonetaConfig, ConfigError> {
    let config: MonetaConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

/// Merge overlay values into the base, recursively overriding objects.
fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

impl MonetaConfig {
    /// Validate invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "backend.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{ChatMode, MonetaConfig};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_json5_with_comments() {
        let config = MonetaConfig::load_from_str(
            r#"{
                // local dev backend
                backend: { base_url: "http://127.0.0.1:9000" },
                chat: { default_mode: "plain" },
            }"#,
        )
        .expect("parse");
        assert_eq!(config.backend.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.chat.default_mode, ChatMode::Plain);
        assert!(config.survey.auto_start);
    }

    #[test]
    fn rejects_empty_base_url() {
        let result = MonetaConfig::load_from_str(r#"{ backend: { base_url: "  " } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn cwd_layer_overrides_nothing_when_absent() {
        let temp = tempdir().expect("tempdir");
        let layered = MonetaConfig::load_layered(temp.path()).expect("load");
        assert_eq!(layered.config.backend.base_url, "http://localhost:8000");
    }

    #[test]
    fn cwd_layer_is_merged() {
        let temp = tempdir().expect("tempdir");
        fs::write(
            temp.path().join("moneta.json5"),
            r#"{ survey: { auto_start: false } }"#,
        )
        .expect("write layer");
        let layered = MonetaConfig::load_layered(temp.path()).expect("load");
        assert!(!layered.config.survey.auto_start);
        // Untouched sections keep their defaults.
        assert_eq!(layered.config.backend.base_url, "http://localhost:8000");
    }
}
