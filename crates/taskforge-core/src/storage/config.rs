//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Focus session length and the daily focus goal
//! - The local identity (uid + email) used as the acting user
//! - Insights display options
//!
//! Configuration is stored at `~/.config/taskforge/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::focus::{DEFAULT_FOCUS_MINUTES, MAX_FOCUS_MINUTES};
use crate::insights::DEFAULT_DAILY_FOCUS_GOAL_MINUTES;

/// Focus timer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusConfig {
    #[serde(default = "default_focus_duration")]
    pub default_duration_min: u64,
    #[serde(default = "default_daily_goal")]
    pub daily_goal_min: u64,
}

/// Local identity. Unset until `user register` runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsConfig {
    #[serde(default = "default_true")]
    pub show_suggestions: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/taskforge/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub focus: FocusConfig,
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
}

fn default_focus_duration() -> u64 {
    DEFAULT_FOCUS_MINUTES
}
fn default_daily_goal() -> u64 {
    DEFAULT_DAILY_FOCUS_GOAL_MINUTES
}
fn default_true() -> bool {
    true
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            default_duration_min: default_focus_duration(),
            daily_goal_min: default_daily_goal(),
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            show_suggestions: default_true(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }
        key.split('.').try_fold(root, |current, part| current.get(part))
    }

    /// Replace the leaf at `key`, keeping the JSON type of the existing value.
    /// Optional strings (`null`) accept any text; an empty value clears them.
    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => value
                .parse::<bool>()
                .map(serde_json::Value::Bool)
                .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            serde_json::Value::Number(_) => value
                .parse::<u64>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
            serde_json::Value::Object(_) => return Err(unknown()),
            serde_json::Value::Null | serde_json::Value::String(_) if value.is_empty() => {
                serde_json::Value::Null
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults if the file doesn't exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    ///
    /// Unset optional values come back as `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null | serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the value doesn't fit the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// All leaf keys with their current values, sorted by key.
    /// Unset optionals are listed with an empty value.
    pub fn entries(&self) -> Vec<(String, String)> {
        let json = match serde_json::to_value(self) {
            Ok(json) => json,
            Err(_) => return Vec::new(),
        };
        let mut out = Vec::new();
        if let serde_json::Value::Object(sections) = json {
            for (section, fields) in sections {
                if let serde_json::Value::Object(fields) = fields {
                    for (field, value) in fields {
                        let shown = match value {
                            serde_json::Value::String(s) => s,
                            serde_json::Value::Null => String::new(),
                            other => other.to_string(),
                        };
                        out.push((format!("{section}.{field}"), shown));
                    }
                }
            }
        }
        out
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let minutes = [
            ("focus.default_duration_min", self.focus.default_duration_min),
            ("focus.daily_goal_min", self.focus.daily_goal_min),
        ];
        for (key, value) in minutes {
            if !(1..=MAX_FOCUS_MINUTES).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: format!("must be between 1 and {MAX_FOCUS_MINUTES} minutes"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.focus.default_duration_min, 25);
        assert_eq!(cfg.focus.daily_goal_min, 120);
        assert!(cfg.insights.show_suggestions);
        assert!(cfg.user.id.is_none());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: Config = toml::from_str("[focus]\ndefault_duration_min = 50\n").unwrap();
        assert_eq!(cfg.focus.default_duration_min, 50);
        assert_eq!(cfg.focus.daily_goal_min, 120);
        assert!(cfg.insights.show_suggestions);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("focus.default_duration_min").as_deref(), Some("25"));
        assert_eq!(cfg.get("insights.show_suggestions").as_deref(), Some("true"));
        assert_eq!(cfg.get("user.email"), None);
        assert_eq!(cfg.get("focus"), None);
        assert_eq!(cfg.get("focus.nope"), None);
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("focus.daily_goal_min", "90").unwrap();
        cfg.set("insights.show_suggestions", "false").unwrap();
        cfg.set("user.email", "alice@example.com").unwrap();
        assert_eq!(cfg.focus.daily_goal_min, 90);
        assert!(!cfg.insights.show_suggestions);
        assert_eq!(cfg.user.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("focus.nonexistent_key", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("focus", "1"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(cfg.set("", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        let err = cfg.set("insights.show_suggestions", "not_a_bool").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(cfg.set("focus.default_duration_min", "-5").is_err());
        assert!(cfg.set("focus.default_duration_min", "0").is_err());
        assert!(cfg.set("focus.default_duration_min", "1000000000000000").is_err());
        assert!(cfg.set("focus.daily_goal_min", "1441").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_writes_defaults_then_reads_saved_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut cfg = cfg;
        cfg.set("focus.default_duration_min", "45").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().focus.default_duration_min, 45);
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "focus = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn entries_list_every_leaf() {
        let mut cfg = Config::default();
        cfg.set("user.id", "u-1").unwrap();
        let entries = cfg.entries();
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"focus.default_duration_min"));
        assert!(keys.contains(&"user.email"));
        assert!(entries.contains(&("user.id".to_string(), "u-1".to_string())));
        assert!(entries.contains(&("user.email".to_string(), String::new())));
    }

    #[test]
    fn load_rejects_out_of_range_minutes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[focus]\ndefault_duration_min = 1000000000000000\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
