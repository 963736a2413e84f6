//! Configuration type definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;

/// Object-store connection settings.
///
/// Every field may be left out of the file and supplied through the
/// environment instead; all but `region` must be present after merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StorageConfig {
    /// S3-compatible endpoint, e.g. `https://s3.example.com`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Access key id
    #[serde(default)]
    pub access_key: Option<String>,

    /// Secret access key
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Bucket that receives uploads
    #[serde(default)]
    pub bucket: Option<String>,

    /// Signing region (defaults to `us-east-1`, which most S3-compatible servers accept)
    #[serde(default)]
    pub region: Option<String>,

    /// Public URL prefix under which uploaded objects are reachable
    #[serde(default)]
    pub url_base: Option<String>,
}

/// Fully resolved storage settings, produced once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTarget {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    pub url_base: String,
}

impl StorageConfig {
    /// Resolves the optional fields into a [`StorageTarget`].
    ///
    /// Returns [`ConfigError::ConfigurationMissing`] naming the first absent value.
    pub fn target(&self) -> Result<StorageTarget, ConfigError> {
        fn required(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(ConfigError::ConfigurationMissing(name))
        }

        Ok(StorageTarget {
            endpoint: required(&self.endpoint, "storage endpoint")?,
            access_key: required(&self.access_key, "storage access key")?,
            secret_key: required(&self.secret_key, "storage secret key")?,
            bucket: required(&self.bucket, "storage bucket")?,
            region: self
                .region
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(default_region),
            url_base: required(&self.url_base, "public URL base")?
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Upload naming and policy settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadConfig {
    /// Length of the random public filename, extension excluded (must be at least 1)
    #[serde(default = "default_filename_length")]
    pub filename_length: usize,

    /// Files larger than this ask for confirmation before uploading
    #[serde(default = "default_confirm_threshold")]
    pub confirm_threshold_bytes: u64,

    /// Where published URLs are appended; defaults to `~/.local/share/wayshare/history.log`
    #[serde(default)]
    pub history_file: Option<PathBuf>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            filename_length: default_filename_length(),
            confirm_threshold_bytes: default_confirm_threshold(),
            history_file: None,
        }
    }
}

impl UploadConfig {
    /// Returns the configured history file, or the per-user default.
    pub fn history_path(&self) -> PathBuf {
        if let Some(path) = &self.history_file {
            return path.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("wayshare")
            .join("history.log")
    }
}

pub const DEFAULT_FILENAME_LENGTH: usize = 8;
pub const DEFAULT_CONFIRM_THRESHOLD_BYTES: u64 = 64 * 1024 * 1024; // 64 MiB

fn default_filename_length() -> usize {
    DEFAULT_FILENAME_LENGTH
}

fn default_confirm_threshold() -> u64 {
    DEFAULT_CONFIRM_THRESHOLD_BYTES
}

/// Audible feedback settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SoundConfig {
    /// Playback volume (valid range: 0.0 - 1.0)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Sound played after a successful upload
    #[serde(default = "default_success_sound")]
    pub success_sound: PathBuf,

    /// Sound played when a pipeline fails
    #[serde(default = "default_failure_sound")]
    pub failure_sound: PathBuf,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            success_sound: default_success_sound(),
            failure_sound: default_failure_sound(),
        }
    }
}

fn default_volume() -> f64 {
    0.5
}

fn default_success_sound() -> PathBuf {
    PathBuf::from("/usr/share/sounds/freedesktop/stereo/complete.oga")
}

fn default_failure_sound() -> PathBuf {
    PathBuf::from("/usr/share/sounds/freedesktop/stereo/dialog-error.oga")
}
