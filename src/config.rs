use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::schedule::{InstantOptions, DEFAULT_SET_MINUTES};
use crate::utils;

pub const DEFAULT_SITE_NAME: &str = "NYC Jazz";
pub const DEFAULT_SITE_URL: &str = "http://127.0.0.1:4100";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:4100";
pub const DEFAULT_LOOK_AHEAD_DAYS: i64 = 30;
pub const MAX_LOOK_AHEAD_DAYS: i64 = 3650;
pub const MAX_SET_MINUTES: i64 = 1440;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SiteConfig {
    pub site_name: String,
    /// Absolute origin used for canonical links and the sitemap, no trailing slash.
    pub site_url: String,
    pub bind_addr: String,
    pub database_path: Option<PathBuf>,
    pub look_ahead_days: i64,
    pub set_duration_minutes: i64,
    pub roll_end_past_midnight: bool,
    pub seed_sample_data: bool,
    pub log_level: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database_path: None,
            look_ahead_days: DEFAULT_LOOK_AHEAD_DAYS,
            set_duration_minutes: DEFAULT_SET_MINUTES,
            roll_end_past_midnight: false,
            seed_sample_data: false,
            log_level: "info".to_string(),
        }
    }
}

impl SiteConfig {
    /// Reads `config.json` from the data root, writing defaults on first run,
    /// then applies `JAZZ_NYC_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&utils::config_path(), |name| std::env::var(name).ok())
    }

    /// Same as [`SiteConfig::load`] with an explicit file and variable source.
    pub fn load_from<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            read_config(path)?
        } else {
            let config = SiteConfig::default();
            write_config(path, &config)?;
            info!("wrote default config to {:?}", path);
            config
        };
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Range checks for values that feed date arithmetic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("look_ahead_days", self.look_ahead_days, 0, MAX_LOOK_AHEAD_DAYS)?;
        check_range(
            "set_duration_minutes",
            self.set_duration_minutes,
            1,
            MAX_SET_MINUTES,
        )
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("JAZZ_NYC_BIND") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("JAZZ_NYC_SITE_URL") {
            self.site_url = value;
        }
        if let Some(value) = lookup("JAZZ_NYC_DATABASE") {
            self.database_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("JAZZ_NYC_LOOK_AHEAD_DAYS") {
            self.look_ahead_days = value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| *days >= 0)
                .ok_or(ConfigError::Env {
                    name: "JAZZ_NYC_LOOK_AHEAD_DAYS",
                    value,
                })?;
        }
        if let Some(value) = lookup("JAZZ_NYC_LOG") {
            self.log_level = value;
        }
        self.site_url = self.site_url.trim_end_matches('/').to_string();
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(utils::database_path)
    }

    pub fn instant_options(&self) -> InstantOptions {
        InstantOptions {
            set_duration: Duration::try_minutes(self.set_duration_minutes)
                .unwrap_or_else(|| Duration::minutes(DEFAULT_SET_MINUTES)),
            roll_end_past_midnight: self.roll_end_past_midnight,
        }
    }

    pub fn page_url(&self, path: &str) -> String {
        format!("{}{}", self.site_url.trim_end_matches('/'), path)
    }
}

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn read_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

fn write_config(path: &Path, config: &SiteConfig) -> Result<(), ConfigError> {
    utils::ensure_parent(path);
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test_log::test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "site_name": "Jazz Tonight", "look_ahead_days": 14 }"#).unwrap();

        let config = read_config(&path).unwrap();

        assert_eq!(config.site_name, "Jazz Tonight");
        assert_eq!(config.look_ahead_days, 14);
        assert_eq!(config.set_duration_minutes, 90);
        assert!(!config.roll_end_past_midnight);
    }

    #[test_log::test]
    fn written_config_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = SiteConfig {
            roll_end_past_midnight: true,
            ..SiteConfig::default()
        };

        write_config(&path, &config).unwrap();

        assert_eq!(read_config(&path).unwrap(), config);
    }

    #[test_log::test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("JAZZ_NYC_SITE_URL", "https://jazz.example.com/"),
            ("JAZZ_NYC_LOOK_AHEAD_DAYS", "45"),
            ("JAZZ_NYC_DATABASE", "/tmp/listings.sqlite"),
        ]
        .into_iter()
        .collect();
        let mut config = SiteConfig::default();

        config
            .apply_env(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.site_url, "https://jazz.example.com");
        assert_eq!(config.look_ahead_days, 45);
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/listings.sqlite")
        );
        assert_eq!(config.page_url("/events/x"), "https://jazz.example.com/events/x");
    }

    #[test_log::test]
    fn bad_horizon_is_rejected() {
        let mut config = SiteConfig::default();

        let err = config
            .apply_env(|name| (name == "JAZZ_NYC_LOOK_AHEAD_DAYS").then(|| "soon".to_string()))
            .unwrap_err();

        assert!(matches!(err, ConfigError::Env { value, .. } if value == "soon"));
    }

    #[test_log::test]
    fn out_of_range_file_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "look_ahead_days": 200000000 }"#).unwrap();

        let err = SiteConfig::load_from(&path, |_| None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange { field: "look_ahead_days", value: 200000000, .. }
        ));

        fs::write(&path, r#"{ "look_ahead_days": -1 }"#).unwrap();
        assert!(SiteConfig::load_from(&path, |_| None).is_err());

        fs::write(&path, r#"{ "set_duration_minutes": 9000000000000000 }"#).unwrap();
        let err = SiteConfig::load_from(&path, |_| None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange { field: "set_duration_minutes", .. }
        ));
    }

    #[test_log::test]
    fn env_horizon_is_range_checked_too() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let err = SiteConfig::load_from(&path, |name| {
            (name == "JAZZ_NYC_LOOK_AHEAD_DAYS").then(|| "99999".to_string())
        })
        .unwrap_err();

        assert!(matches!(err, ConfigError::OutOfRange { value: 99999, .. }));
        assert!(path.exists());
    }

    #[test_log::test]
    fn first_load_writes_valid_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = SiteConfig::load_from(&path, |_| None).unwrap();

        assert_eq!(config, SiteConfig::default());
        assert_eq!(read_config(&path).unwrap(), config);
    }

    #[test_log::test]
    fn oversized_duration_falls_back_to_default_set() {
        let config = SiteConfig {
            set_duration_minutes: i64::MAX,
            ..SiteConfig::default()
        };

        assert_eq!(
            config.instant_options().set_duration,
            Duration::minutes(DEFAULT_SET_MINUTES)
        );
    }
}
