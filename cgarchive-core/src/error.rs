//! Error types for cgarchive-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving the run configuration.
///
/// Every variant is fatal: it is reported before any network or archive
/// activity takes place.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No session token was supplied (flag, `CG_COOKIE`, or config file).
    #[error("session token is not set; pass --cookie or set CG_COOKIE")]
    MissingSessionToken,

    /// No user id was supplied (flag, `CG_USER_ID`, or config file).
    #[error("user id is not set; pass --user-id or set CG_USER_ID")]
    MissingUserId,

    /// The user id was supplied but is not an integer.
    #[error("user id must be a number, got '{value}'")]
    InvalidUserId { value: String },

    /// An explicitly named config file does not exist.
    #[error("config file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Underlying I/O failure while reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with file path and serde_yaml's line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
