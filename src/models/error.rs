//! Error types for syncpoint.
//!
//! The barrier core never raises: unknown checkpoint names, double starts and
//! post-completion mutations all degrade to silent no-ops by design. Errors
//! exist only at the resource-loader seam, where a fetch can genuinely fail.

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for syncpoint.
#[derive(Debug, Error)]
pub enum SyncpointError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status} fetching {uri}")]
    Http { status: u16, uri: String },
}

impl SyncpointError {
    /// Check if this error was caused by a request timing out.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Network(e) => e.is_timeout(),
            Self::Http { .. } => false,
        }
    }
}

/// Result type alias for syncpoint.
pub type Result<T> = std::result::Result<T, SyncpointError>;
