//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Cue settings (sound, vibration, countdown)
//! - Tick and status-surface intervals
//! - The default interval plan
//!
//! Configuration is stored at `~/.config/intervalroom/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, PlanError};
use crate::settings::{CueSettings, CueSettingsSource};
use crate::timer::Plan;

/// Recomputation cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Minimum gap between status-surface redraws.
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
}

/// Default plan parameters, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    #[serde(default = "default_warmup")]
    pub warmup: u32,
    #[serde(default = "default_work")]
    pub work: u32,
    #[serde(default = "default_rest")]
    pub rest: u32,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    #[serde(default = "default_cooldown")]
    pub cooldown: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cues: CueSettings,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub plan: PlanConfig,
}

fn default_tick_interval_ms() -> u64 {
    500
}
fn default_status_interval_ms() -> u64 {
    1000
}
fn default_warmup() -> u32 {
    10
}
fn default_work() -> u32 {
    20
}
fn default_rest() -> u32 {
    10
}
fn default_rounds() -> u32 {
    8
}
fn default_cooldown() -> u32 {
    30
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            status_interval_ms: default_status_interval_ms(),
        }
    }
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            warmup: default_warmup(),
            work: default_work(),
            rest: default_rest(),
            rounds: default_rounds(),
            cooldown: default_cooldown(),
        }
    }
}

impl PlanConfig {
    pub fn plan(&self) -> Result<Plan, PlanError> {
        Plan::new(self.warmup, self.work, self.rest, self.rounds, self.cooldown)
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

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

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

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// `<data_dir>/config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse as
    /// the key's type. A plan edit that would leave zero rounds is rejected.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated
            .plan
            .plan()
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save to the default location.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

/// Settings collaborator backed by the config file.
///
/// Re-reads the file on every call, so edits made by another process
/// (`config set cues.sound false`) apply to the next cue.
#[derive(Debug, Clone)]
pub struct ConfigSettings {
    path: PathBuf,
}

impl ConfigSettings {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn from_default_path() -> Result<Self, ConfigError> {
        Ok(Self::new(Config::path()?))
    }
}

impl CueSettingsSource for ConfigSettings {
    fn cue_settings(&self) -> CueSettings {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(cfg) => cfg.cues,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "unreadable config, using default cue settings");
                    CueSettings::default()
                }
            },
            Err(_) => CueSettings::default(),
        }
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
    fn missing_sections_take_defaults() {
        let parsed: Config = toml::from_str("[cues]\nsound = false\n").unwrap();
        assert!(!parsed.cues.sound);
        assert!(parsed.cues.vibration);
        assert_eq!(parsed.timer.tick_interval_ms, 500);
        assert_eq!(parsed.plan.plan().unwrap().total_duration(), 270);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("cues.countdown").as_deref(), Some("true"));
        assert_eq!(cfg.get("timer.status_interval_ms").as_deref(), Some("1000"));
        assert!(cfg.get("cues.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_nested_bool_and_number() {
        let mut cfg = Config::default();
        cfg.apply("cues.vibration", "false").unwrap();
        cfg.apply("plan.work", "45").unwrap();
        assert!(!cfg.cues.vibration);
        assert_eq!(cfg.plan.work, 45);
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("cues.nonexistent", "true"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.apply("cues", "true"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("cues.sound", "loud"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.apply("plan.rest", "-5"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn apply_rejects_zero_rounds() {
        let mut cfg = Config::default();
        assert!(cfg.apply("plan.rounds", "0").is_err());
        assert_eq!(cfg.plan.rounds, 8);
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn config_settings_rereads_file_each_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let settings = ConfigSettings::new(path.clone());
        assert!(settings.cue_settings().countdown);

        let mut cfg = Config::default();
        cfg.cues.countdown = false;
        cfg.save_to(&path).unwrap();
        assert!(!settings.cue_settings().countdown);
    }
}
