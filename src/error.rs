//! Error taxonomy for the settings synchronization core
//!
//! Validation failures are resolved at the mutation point and surfaced as bus
//! events; transport failures propagate to the caller as `Result`s. Nothing is
//! silently swallowed except subscriber errors inside the event bus, which are
//! logged and isolated.

use thiserror::Error;

use crate::state::OperationKind;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Bad value for a declared setting key; never reaches the server
    #[error("invalid value for '{key}': {message}")]
    Validation { key: String, message: String },

    /// Atomic multi-key apply failed validation; no partial state change
    #[error("bundle rejected: {} invalid entries", .errors.len())]
    BundleRejected { errors: Vec<(String, String)> },

    /// A second request of the same kind while one is in flight
    #[error("{kind} already in progress")]
    DuplicateOperation { kind: OperationKind },

    /// Transport-level failure (connect, timeout, DNS)
    #[error("network error: {0}")]
    Network(String),

    /// The server rejected the anti-forgery token (HTTP 403)
    #[error("authentication rejected by server")]
    Auth,

    /// Server-side failure (HTTP 5xx)
    #[error("server error (HTTP {status})")]
    Server { status: u16 },

    /// Request rejected by the backend (other HTTP 4xx)
    #[error("request rejected (HTTP {status}): {message}")]
    Api { status: u16, message: String },
}

impl SyncError {
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            key: key.into(),
            message: message.into(),
        }
    }

    /// True for failures a caller may meaningfully retry later
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
