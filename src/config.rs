//! Environment-driven runtime settings.

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DEFAULT_DATA_PATH: &str = "predictions.csv";
pub const DEFAULT_LOG_FILE_PATH: &str = "logs/urbanguard.log";

/// Runtime settings taken from the environment (and `.env`, once loaded).
///
/// | Variable          | Default               |
/// |-------------------|-----------------------|
/// | `URBANGUARD_DATA` | `predictions.csv`     |
/// | `URBANGUARD_SEED` | unset (OS entropy)    |
/// | `LOG_FILE_PATH`   | `logs/urbanguard.log` |
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_path: PathBuf,
    pub seed: Option<u64>,
    pub log_file_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            seed: None,
            log_file_path: PathBuf::from(DEFAULT_LOG_FILE_PATH),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let seed = match lookup("URBANGUARD_SEED").filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("URBANGUARD_SEED must be an unsigned integer, got '{raw}'"))?,
            ),
            None => None,
        };

        Ok(Self {
            data_path: lookup("URBANGUARD_DATA")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            seed,
            log_file_path: lookup("LOG_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file_path),
        })
    }
}
