//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Tracking cadence
//! - The daily intervention threshold
//! - Intervention tuning (nudge ratio, milestone cadence, duration weights)
//! - Mascot selection
//!
//! Configuration is stored at `~/.config/scrolljail/config.toml`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::policy::{DurationWeight, Mascot, PolicyConfig};

/// Threshold presets offered at registration, in seconds (30 to 150 minutes).
pub const THRESHOLD_PRESETS_SECS: [i64; 5] = [1800, 3600, 5400, 7200, 9000];

/// Watch-time tracking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Daily threshold configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Zero or negative disables interventions.
    #[serde(default = "default_threshold_secs")]
    pub daily_threshold_secs: i64,
}

/// One entry of the regular-intervention duration distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub duration_secs: u64,
    pub weight: f64,
}

/// Intervention tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionConfig {
    #[serde(default = "default_nudge_ratio")]
    pub nudge_ratio: f64,
    #[serde(default = "default_milestone_every")]
    pub milestone_every: u32,
    #[serde(default = "default_milestone_duration_secs")]
    pub milestone_duration_secs: u64,
    #[serde(default = "default_countdown_interval_ms")]
    pub countdown_interval_ms: u64,
    #[serde(default = "default_weights")]
    pub weights: Vec<WeightEntry>,
}

/// Mascot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MascotConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub kind: Mascot,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/scrolljail/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub threshold: ThresholdConfig,
    #[serde(default)]
    pub intervention: InterventionConfig,
    #[serde(default)]
    pub mascot: MascotConfig,
}

// Default functions
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_threshold_secs() -> i64 {
    THRESHOLD_PRESETS_SECS[0]
}
fn default_nudge_ratio() -> f64 {
    0.6
}
fn default_milestone_every() -> u32 {
    5
}
fn default_milestone_duration_secs() -> u64 {
    6
}
fn default_countdown_interval_ms() -> u64 {
    1000
}
fn default_weights() -> Vec<WeightEntry> {
    [(3, 0.5), (5, 0.2), (6, 0.1), (7, 0.1), (8, 0.1)]
        .into_iter()
        .map(|(duration_secs, weight)| WeightEntry {
            duration_secs,
            weight,
        })
        .collect()
}
fn default_true() -> bool {
    true
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            daily_threshold_secs: default_threshold_secs(),
        }
    }
}

impl Default for InterventionConfig {
    fn default() -> Self {
        Self {
            nudge_ratio: default_nudge_ratio(),
            milestone_every: default_milestone_every(),
            milestone_duration_secs: default_milestone_duration_secs(),
            countdown_interval_ms: default_countdown_interval_ms(),
            weights: default_weights(),
        }
    }
}

impl Default for MascotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: Mascot::default(),
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
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
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

    /// Apply a dot-path update in memory. Returns error if key is unknown or
    /// the resulting configuration no longer deserializes.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// the policy section becomes invalid, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut updated = self.clone();
        updated.apply(key, value)?;
        updated.policy_config().validate()?;
        *self = updated;
        self.save()
    }

    /// Daily threshold; non-positive values collapse to zero ("disabled").
    pub fn threshold(&self) -> Duration {
        Duration::from_secs(self.threshold.daily_threshold_secs.max(0) as u64)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tracking.tick_interval_ms)
    }

    /// Policy tuning derived from the `intervention` and `mascot` sections.
    pub fn policy_config(&self) -> PolicyConfig {
        let i = &self.intervention;
        PolicyConfig {
            nudge_ratio: i.nudge_ratio,
            milestone_every: i.milestone_every,
            milestone_duration: Duration::from_secs(i.milestone_duration_secs),
            countdown_interval: Duration::from_millis(i.countdown_interval_ms),
            weights: i
                .weights
                .iter()
                .map(|w| DurationWeight {
                    duration: Duration::from_secs(w.duration_secs),
                    weight: w.weight,
                })
                .collect(),
            mascot: self.mascot.enabled.then_some(self.mascot.kind),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed = Config::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.threshold.daily_threshold_secs, 1800);
        assert_eq!(parsed.intervention.weights, cfg.intervention.weights);
        assert_eq!(parsed.mascot.kind, Mascot::Owl);
    }

    #[test]
    fn partial_document_fills_defaults() {
        let parsed = Config::from_toml("[threshold]\ndaily_threshold_secs = 3600\n").unwrap();
        assert_eq!(parsed.threshold.daily_threshold_secs, 3600);
        assert_eq!(parsed.tracking.tick_interval_ms, 1000);
        assert_eq!(parsed.intervention.milestone_every, 5);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("mascot.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("threshold.daily_threshold_secs").as_deref(), Some("1800"));
        assert_eq!(cfg.get("mascot.kind").as_deref(), Some("owl"));
        assert!(cfg.get("mascot.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("threshold.daily_threshold_secs", "5400").unwrap();
        cfg.apply("mascot.kind", "fox").unwrap();
        cfg.apply("intervention.nudge_ratio", "0.75").unwrap();
        assert_eq!(cfg.threshold(), Duration::from_secs(5400));
        assert_eq!(cfg.mascot.kind, Mascot::Fox);
        assert_eq!(cfg.intervention.nudge_ratio, 0.75);
    }

    #[test]
    fn apply_accepts_json_for_weight_table() {
        let mut cfg = Config::default();
        cfg.apply(
            "intervention.weights",
            r#"[{"duration_secs": 4, "weight": 1.0}]"#,
        )
        .unwrap();
        assert_eq!(cfg.intervention.weights.len(), 1);
        assert_eq!(cfg.intervention.weights[0].duration_secs, 4);
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "mascot.nonexistent_key", "value");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "mascot.enabled", "not_a_bool");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn apply_rejects_unknown_mascot() {
        let mut cfg = Config::default();
        assert!(cfg.apply("mascot.kind", "dragon").is_err());
        assert_eq!(cfg.mascot.kind, Mascot::Owl);
    }

    #[test]
    fn negative_threshold_collapses_to_zero() {
        let mut cfg = Config::default();
        cfg.threshold.daily_threshold_secs = -60;
        assert_eq!(cfg.threshold(), Duration::ZERO);
    }

    #[test]
    fn disabled_mascot_maps_to_none() {
        let mut cfg = Config::default();
        cfg.mascot.enabled = false;
        assert!(cfg.policy_config().mascot.is_none());
    }

    #[test]
    fn presets_are_thirty_minute_steps() {
        for pair in THRESHOLD_PRESETS_SECS.windows(2) {
            assert_eq!(pair[1] - pair[0], 1800);
        }
    }
}
