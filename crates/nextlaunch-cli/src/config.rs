//! Application configuration management.
//!
//! Configuration is stored at `~/.config/nextlaunch/config.json`. Every
//! field has a default, so a missing file means "track everything from
//! the Teamup feed, refreshing hourly". `NEXTLAUNCH_ROCKET_NAME` and
//! `NEXTLAUNCH_FEED_URL` override the file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use nextlaunch_core::models::ALL_ROCKETS;

/// Application name used for the config directory path
const APP_NAME: &str = "nextlaunch";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Public Teamup calendar of orbital launches
pub const DEFAULT_FEED_URL: &str = "https://ics.teamup.com/feed/ks9mo8bt5a2he89r6j/0.ics";

/// Default selector refresh cadence. The feed itself is throttled separately.
const DEFAULT_SCAN_INTERVAL_MINUTES: u64 = 60;

const ENV_ROCKET_NAME: &str = "NEXTLAUNCH_ROCKET_NAME";
const ENV_FEED_URL: &str = "NEXTLAUNCH_FEED_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// One selector per entry; a bare string is accepted for a single filter.
    #[serde(deserialize_with = "one_or_many")]
    pub rocket_name: Vec<String>,
    pub feed_url: String,
    pub scan_interval_minutes: u64,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rocket_name: vec![ALL_ROCKETS.to_string()],
            feed_url: DEFAULT_FEED_URL.to_string(),
            scan_interval_minutes: DEFAULT_SCAN_INTERVAL_MINUTES,
            log_dir: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
    })
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    /// An explicit path must exist; the default one may not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => {
                let path = Self::config_path()?;
                if path.exists() {
                    Self::read(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(
            std::env::var(ENV_ROCKET_NAME).ok(),
            std::env::var(ENV_FEED_URL).ok(),
        );
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Apply environment-style overrides. Rocket names are comma-separated.
    fn apply_overrides(&mut self, rocket_name: Option<String>, feed_url: Option<String>) {
        if let Some(names) = rocket_name {
            self.rocket_name = names
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(url) = feed_url.filter(|u| !u.trim().is_empty()) {
            self.feed_url = url.trim().to_string();
        }
    }

    fn validate(&mut self) -> Result<()> {
        if self.rocket_name.is_empty() {
            self.rocket_name = vec![ALL_ROCKETS.to_string()];
        }
        if self.scan_interval_minutes == 0 {
            bail!("scan_interval_minutes must be at least 1");
        }
        if self.feed_url.is_empty() {
            bail!("feed_url must not be empty");
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
