//! Error types for cgarchive-api.

use thiserror::Error;

use crate::operation::Operation;

/// Result alias for gateway calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// The single failure kind surfaced by the gateway.
///
/// Whether a failure is fatal is decided by the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure, non-2xx status, or an undecodable response body.
    ///
    /// `status` is `None` when no HTTP response was received.
    #[error("{operation} request failed{}: {message}", status_suffix(.status))]
    RequestFailed {
        operation: Operation,
        status: Option<u16>,
        message: String,
    },
}

impl ApiError {
    pub fn operation(&self) -> Operation {
        match self {
            ApiError::RequestFailed { operation, .. } => *operation,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RequestFailed { status, .. } => *status,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}
