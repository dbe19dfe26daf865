//! Run configuration.
//!
//! # Layering
//!
//! Lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. YAML config file (`~/.cgarchive/config.yaml`, or an explicit path)
//! 3. [`ConfigOverrides`]: flags and environment variables, collected by the CLI
//!
//! The resolved [`Config`] is a plain value handed to the sync core; nothing
//! below the CLI reads the environment.
//!
//! Like the rest of the crate, every filesystem-touching helper has an
//! `_at(home: &Path, …)` form so tests never depend on the real home dir.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Handle;

/// Remote service root used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://www.codingame.com/services";

/// Archive root used when nothing else is configured.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Per-request timeout used when nothing else is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Opaque session token attached to every request as the `cookie` header.
    pub session_token: String,
    pub user_id: i64,
    pub data_dir: PathBuf,
    pub base_url: String,
    pub timeout: Duration,
    /// Handles to archive even though neither list call returns them.
    pub extra_handles: Vec<Handle>,
    /// When set, only these handles are processed.
    pub test_handles: Option<Vec<Handle>>,
}

/// On-disk YAML shape. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_handles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_handles: Vec<String>,
}

/// Values supplied by flags or environment variables.
///
/// List fields hold the raw comma-separated strings; `user_id` stays a
/// string so a malformed value surfaces as [`ConfigError::InvalidUserId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub session_token: Option<String>,
    pub user_id: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub extra_handles: Option<String>,
    pub test_handles: Option<String>,
}

// ---------------------------------------------------------------------------
// Handle lists
// ---------------------------------------------------------------------------

/// Split a comma-separated handle list, trimming entries and dropping blanks.
pub fn parse_handle_list(raw: &str) -> Vec<Handle> {
    raw.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(Handle::from)
        .collect()
}

fn owned_handles(raw: &[String]) -> Vec<Handle> {
    raw.iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty())
        .map(Handle::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

/// `<home>/.cgarchive/config.yaml`: pure, no I/O.
pub fn default_config_path_at(home: &Path) -> PathBuf {
    home.join(".cgarchive").join("config.yaml")
}

/// Read and parse a config file.
pub fn load_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the config file to layer under the overrides.
///
/// An explicit path must exist. Without one, the default file under `home`
/// is used only when present.
pub fn load_optional_at(
    home: &Path,
    explicit: Option<&Path>,
) -> Result<Option<ConfigFile>, ConfigError> {
    load_optional_in(Some(home), explicit)
}

/// [`load_optional_at`] rooted at `dirs::home_dir()`.
pub fn load_optional(explicit: Option<&Path>) -> Result<Option<ConfigFile>, ConfigError> {
    load_optional_in(dirs::home_dir().as_deref(), explicit)
}

/// No home directory means no default file, not an error.
fn load_optional_in(
    home: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = explicit {
        return load_file(path).map(Some);
    }
    let Some(home) = home else {
        return Ok(None);
    };
    let path = default_config_path_at(home);
    if !path.exists() {
        return Ok(None);
    }
    load_file(&path).map(Some)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

impl Config {
    /// Merge defaults, the optional config file, and overrides.
    pub fn resolve(
        file: Option<ConfigFile>,
        overrides: ConfigOverrides,
    ) -> Result<Config, ConfigError> {
        let file = file.unwrap_or_default();

        let session_token = overrides
            .session_token
            .or(file.session_token)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingSessionToken)?;

        let user_id = match overrides.user_id.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => {
                let trimmed = raw.trim();
                trimmed
                    .parse::<i64>()
                    .map_err(|_| ConfigError::InvalidUserId {
                        value: trimmed.to_string(),
                    })?
            }
            None => file.user_id.ok_or(ConfigError::MissingUserId)?,
        };

        let data_dir = overrides
            .data_dir
            .or(file.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let base_url = overrides
            .base_url
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout = Duration::from_secs(
            overrides
                .timeout_secs
                .or(file.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        let extra_handles = match overrides.extra_handles {
            Some(raw) => parse_handle_list(&raw),
            None => owned_handles(&file.extra_handles),
        };

        let test_handles = match overrides.test_handles {
            Some(raw) => parse_handle_list(&raw),
            None => owned_handles(&file.test_handles),
        };
        let test_handles = (!test_handles.is_empty()).then_some(test_handles);

        Ok(Config {
            session_token,
            user_id,
            data_dir,
            base_url,
            timeout,
            extra_handles,
            test_handles,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
