use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound for every millisecond setting and test duration
pub const MAX_MS: u64 = 3_600_000;
const MAX_SECS: u32 = (MAX_MS / 1000) as u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimConfig {
    pub duration_secs: u32,
    /// Diameter of a target in pixels
    pub target_size: f32,
    pub target_lifetime_ms: u64,
    pub hit_flash_ms: u64,
    pub miss_marker_ms: u64,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            duration_secs: 30,
            target_size: 50.0,
            target_lifetime_ms: 2000,
            hit_flash_ms: 200,
            miss_marker_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    pub duration_secs: u32,
    /// Clicks closer together than this count as errors
    pub error_threshold_ms: u64,
    pub flash_ms: u64,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            duration_secs: 10,
            error_threshold_ms: 50,
            flash_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    pub max_attempts: u32,
    /// Signal delay is drawn uniformly from `[min, max)`
    pub delay_range_ms: (u64, u64),
    pub false_start_penalty_ms: u64,
    pub inter_round_ms: u64,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay_range_ms: (1000, 4000),
            false_start_penalty_ms: 1500,
            inter_round_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    pub aim: AimConfig,
    pub click: ClickConfig,
    pub reaction: ReactionConfig,
}

impl GamesConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: GamesConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, secs) in [
            ("aim.duration_secs", self.aim.duration_secs),
            ("click.duration_secs", self.click.duration_secs),
        ] {
            if secs > MAX_SECS {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be at most {MAX_SECS}"
                )));
            }
        }
        let (min, max) = self.reaction.delay_range_ms;
        for (name, ms) in [
            ("aim.target_lifetime_ms", self.aim.target_lifetime_ms),
            ("aim.hit_flash_ms", self.aim.hit_flash_ms),
            ("aim.miss_marker_ms", self.aim.miss_marker_ms),
            ("click.error_threshold_ms", self.click.error_threshold_ms),
            ("click.flash_ms", self.click.flash_ms),
            ("reaction.delay_range_ms", max),
            ("reaction.false_start_penalty_ms", self.reaction.false_start_penalty_ms),
            ("reaction.inter_round_ms", self.reaction.inter_round_ms),
        ] {
            if ms > MAX_MS {
                return Err(ConfigError::Invalid(format!("{name} must be at most {MAX_MS}")));
            }
        }

        if self.aim.duration_secs == 0 {
            return Err(ConfigError::Invalid("aim.duration_secs must be > 0".into()));
        }
        if !self.aim.target_size.is_finite() || self.aim.target_size <= 0.0 {
            return Err(ConfigError::Invalid(
                "aim.target_size must be finite and > 0".into(),
            ));
        }
        if self.aim.target_lifetime_ms == 0 {
            return Err(ConfigError::Invalid(
                "aim.target_lifetime_ms must be > 0".into(),
            ));
        }
        if self.click.duration_secs == 0 {
            return Err(ConfigError::Invalid("click.duration_secs must be > 0".into()));
        }
        if self.reaction.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "reaction.max_attempts must be > 0".into(),
            ));
        }
        if min >= max {
            return Err(ConfigError::Invalid(format!(
                "reaction.delay_range_ms is empty: [{min}, {max})"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_the_standard_test_settings() {
        let config = GamesConfig::default();
        assert_eq!(config.aim.duration_secs, 30);
        assert_eq!(config.aim.target_size, 50.0);
        assert_eq!(config.click.duration_secs, 10);
        assert_eq!(config.click.error_threshold_ms, 50);
        assert_eq!(config.reaction.max_attempts, 10);
        assert_eq!(config.reaction.delay_range_ms, (1000, 4000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GamesConfig::from_json(r#"{ "click": { "duration_secs": 5 } }"#).unwrap();
        assert_eq!(config.click.duration_secs, 5);
        assert_eq!(config.click.error_threshold_ms, 50);
        assert_eq!(config.aim, AimConfig::default());
    }

    #[test]
    fn rejects_empty_delay_range() {
        let err = GamesConfig::from_json(r#"{ "reaction": { "delay_range_ms": [500, 500] } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_attempts() {
        let err =
            GamesConfig::from_json(r#"{ "reaction": { "max_attempts": 0 } }"#).unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn rejects_millisecond_settings_that_would_overflow() {
        let err = GamesConfig::from_json(r#"{ "aim": { "hit_flash_ms": 18446744073710 } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("aim.hit_flash_ms"));

        let err = GamesConfig::from_json(
            r#"{ "reaction": { "delay_range_ms": [1000, 18446744073709551615] } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("delay_range_ms"));

        let mut config = GamesConfig::default();
        config.click.flash_ms = MAX_MS;
        assert!(config.validate().is_ok());
        config.click.flash_ms = MAX_MS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_finite_target_size() {
        let mut config = GamesConfig::default();
        config.aim.target_size = f32::INFINITY;
        assert!(config.validate().is_err());
        config.aim.target_size = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_overlong_durations() {
        let mut config = GamesConfig::default();
        config.aim.duration_secs = u32::MAX;
        assert!(config.validate().unwrap_err().to_string().contains("aim.duration_secs"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "aim": {{ "duration_secs": 15 }} }}"#).unwrap();
        let config = GamesConfig::load(file.path()).unwrap();
        assert_eq!(config.aim.duration_secs, 15);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = GamesConfig::load(Path::new("/nonexistent/reflex.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/reflex.json"));
    }
}
