//! Configuration management for standup.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::directory::DEFAULT_MIN_CREDENTIAL_LENGTH;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "standup";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "standup.db";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "STANDUP_";

/// Largest accepted UTC offset, in minutes.
const MAX_UTC_OFFSET_MINUTES: u32 = 18 * 60;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `STANDUP_`, sections separated by
///    `__`, e.g. `STANDUP_STORAGE__BUSY_TIMEOUT_MS`)
/// 2. TOML config file at `~/.config/standup/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Member directory configuration.
    pub directory: DirectoryConfig,
    /// Calendar configuration.
    pub calendar: CalendarConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/standup/standup.db`
    pub database_path: Option<PathBuf>,
    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
}

/// Member directory configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Minimum credential length, in characters.
    pub min_credential_length: usize,
}

/// Calendar configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Offset from UTC, in minutes, used to decide the current calendar day.
    pub utc_offset_minutes: i32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            busy_timeout_ms: 5_000,
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            min_credential_length: DEFAULT_MIN_CREDENTIAL_LENGTH,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing config file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.busy_timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "busy_timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.directory.min_credential_length == 0 {
            return Err(Error::ConfigValidation {
                message: "min_credential_length must be at least 1".to_string(),
            });
        }

        if self.calendar.utc_offset_minutes.unsigned_abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(Error::ConfigValidation {
                message: format!(
                    "utc_offset_minutes ({}) must be within ±{MAX_UTC_OFFSET_MINUTES}",
                    self.calendar.utc_offset_minutes
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the busy timeout as a Duration.
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.busy_timeout_ms)
    }

    /// Get the calendar offset, falling back to UTC if out of range.
    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.calendar.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("failed to create temp config");
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.storage.busy_timeout_ms, 5_000);
        assert_eq!(config.directory.min_credential_length, 4);
        assert_eq!(config.calendar.utc_offset_minutes, 0);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_busy_timeout() {
        let mut config = Config::default();
        config.storage.busy_timeout_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("busy_timeout_ms"));
    }

    #[test]
    fn test_validate_zero_min_credential_length() {
        let mut config = Config::default();
        config.directory.min_credential_length = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("min_credential_length"));
    }

    #[test]
    fn test_validate_offset_range() {
        let mut config = Config::default();
        config.calendar.utc_offset_minutes = 18 * 60;
        assert!(config.validate().is_ok());

        config.calendar.utc_offset_minutes = -(18 * 60) - 1;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("utc_offset_minutes"));
    }

    #[test]
    fn test_validate_extreme_offsets() {
        let mut config = Config::default();
        for minutes in [i32::MIN, i32::MAX, -(18 * 60) - 1] {
            config.calendar.utc_offset_minutes = minutes;
            assert!(
                matches!(config.validate(), Err(Error::ConfigValidation { .. })),
                "offset {minutes} should be rejected"
            );
        }

        config.calendar.utc_offset_minutes = -(18 * 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("standup.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_busy_timeout() {
        let config = Config::default();
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_utc_offset() {
        let mut config = Config::default();
        assert_eq!(config.utc_offset().local_minus_utc(), 0);

        config.calendar.utc_offset_minutes = 330;
        assert_eq!(config.utc_offset().local_minus_utc(), 330 * 60);

        config.calendar.utc_offset_minutes = -360;
        assert_eq!(config.utc_offset().local_minus_utc(), -360 * 60);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("standup"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let file = write_config(
            r#"
            [storage]
            database_path = "/tmp/team.db"
            busy_timeout_ms = 250

            [directory]
            min_credential_length = 8

            [calendar]
            utc_offset_minutes = 330
            "#,
        );

        let config = Config::load_from(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/team.db"));
        assert_eq!(config.storage.busy_timeout_ms, 250);
        assert_eq!(config.directory.min_credential_length, 8);
        assert_eq!(config.calendar.utc_offset_minutes, 330);
    }

    #[test]
    fn test_load_partial_toml_keeps_defaults() {
        let file = write_config("[directory]\nmin_credential_length = 6\n");

        let config = Config::load_from(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.directory.min_credential_length, 6);
        assert_eq!(config.storage.busy_timeout_ms, 5_000);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let file = write_config("[storage]\nbusy_timeout_ms = 0\n");

        let err = Config::load_from(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let file = write_config("[storage\nbusy_timeout_ms = ");

        let err = Config::load_from(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, Error::ConfigLoad(_)));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("busy_timeout_ms"));
        assert!(json.contains("min_credential_length"));
        assert!(json.contains("utc_offset_minutes"));
    }

    #[test]
    fn test_storage_config_deserialize() {
        let json = r#"{"busy_timeout_ms": 100}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.busy_timeout_ms, 100);
        assert!(storage.database_path.is_none());
    }
}
