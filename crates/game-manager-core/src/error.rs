//! Error types for the game manager bridge

use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Bridge error types
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Host explicitly rejected the request; the reason is passed through untouched
    #[error("Host rejected request: {0}")]
    Rejected(serde_json::Value),

    /// Host dropped the request without resolving or rejecting it
    #[error("Host dropped the request without replying")]
    HostGone,

    /// IPC communication error
    #[error("IPC error: {0}")]
    Ipc(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl BridgeError {
    /// Rejection reason, if the host rejected the request
    pub fn rejection(&self) -> Option<&serde_json::Value> {
        match self {
            BridgeError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}
