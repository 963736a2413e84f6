//! Configuration support for wayshare.
//!
//! Settings come from three layers, later ones winning:
//! 1. the optional file at `~/.config/wayshare/config.toml`
//! 2. `WAYSHARE_*` environment variables
//! 3. command-line overrides
//!
//! The merged result is validated once and never mutated afterwards.

pub mod types;

pub use types::{SoundConfig, StorageConfig, StorageTarget, UploadConfig};

use anyhow::{Context, Result};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while assembling configuration. These are reported before
/// any pipeline starts and never reach the failure handler.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("missing configuration: {0} is not set")]
    ConfigurationMissing(&'static str),
}

/// Environment variables read by [`Config::apply_env_from`].
pub const ENV_ENDPOINT: &str = "WAYSHARE_S3_ENDPOINT";
pub const ENV_ACCESS_KEY: &str = "WAYSHARE_S3_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "WAYSHARE_S3_SECRET_KEY";
pub const ENV_BUCKET: &str = "WAYSHARE_S3_BUCKET";
pub const ENV_REGION: &str = "WAYSHARE_S3_REGION";
pub const ENV_URL_BASE: &str = "WAYSHARE_URL_BASE";
pub const ENV_VOLUME: &str = "WAYSHARE_VOLUME";
pub const ENV_FILENAME_LENGTH: &str = "WAYSHARE_FILENAME_LENGTH";

/// Main configuration structure.
///
/// # Example TOML
/// ```toml
/// [storage]
/// endpoint = "https://s3.example.com"
/// access_key = "AKIA..."
/// secret_key = "..."
/// bucket = "shots"
/// url_base = "https://i.example.com"
///
/// [upload]
/// filename_length = 8
///
/// [sound]
/// volume = 0.4
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Object-store endpoint, credentials and public URL
    #[serde(default)]
    pub storage: StorageConfig,

    /// Naming and large-file policy
    #[serde(default)]
    pub upload: UploadConfig,

    /// Audible feedback
    #[serde(default)]
    pub sound: SoundConfig,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub volume: Option<f64>,
    pub filename_length: Option<usize>,
}

impl Config {
    /// Returns the path to the configuration file (`~/.config/wayshare/config.toml`).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("wayshare");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads the config file, or defaults when it does not exist.
    ///
    /// `path` replaces the default location when given.
    pub fn load_file(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::get_config_path()?,
        };

        if !config_path.exists() {
            info!("Config file not found, using defaults and environment");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        info!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Full startup load: file, then process environment, then CLI overrides.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env_from(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        config.validate()?;
        debug!("Config: {:?}", config.redacted());
        Ok(config)
    }

    /// Applies `WAYSHARE_*` variables resolved through `lookup`.
    ///
    /// Numeric variables that fail to parse are reported as invalid
    /// configuration rather than silently ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = &mut self.storage;
        for (key, slot) in [
            (ENV_ENDPOINT, &mut storage.endpoint),
            (ENV_ACCESS_KEY, &mut storage.access_key),
            (ENV_SECRET_KEY, &mut storage.secret_key),
            (ENV_BUCKET, &mut storage.bucket),
            (ENV_REGION, &mut storage.region),
            (ENV_URL_BASE, &mut storage.url_base),
        ] {
            if let Some(value) = lookup(key) {
                *slot = Some(value);
            }
        }

        if let Some(raw) = lookup(ENV_VOLUME) {
            self.sound.volume = raw.trim().parse().map_err(|_| {
                ConfigError::InvalidConfiguration(format!("{ENV_VOLUME} is not a number: '{raw}'"))
            })?;
        }

        if let Some(raw) = lookup(ENV_FILENAME_LENGTH) {
            self.upload.filename_length = raw.trim().parse().map_err(|_| {
                ConfigError::InvalidConfiguration(format!(
                    "{ENV_FILENAME_LENGTH} is not a positive integer: '{raw}'"
                ))
            })?;
        }

        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(volume) = overrides.volume {
            self.sound.volume = volume;
        }
        if let Some(length) = overrides.filename_length {
            self.upload.filename_length = length;
        }
    }

    /// Checks option ranges and that the storage target is complete.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.sound.volume) {
            return Err(ConfigError::InvalidConfiguration(format!(
                "volume must be between 0.0 and 1.0, got {}",
                self.sound.volume
            )));
        }

        if self.upload.filename_length == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "filename length must be a positive integer".to_string(),
            ));
        }

        self.storage.target()?;
        Ok(())
    }

    /// JSON schema of the config file, printed by `dump_config_schema`.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }

    /// Copy with credentials masked, for debug logging.
    fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.storage.secret_key.is_some() {
            copy.storage.secret_key = Some("***".to_string());
        }
        copy
    }
}
