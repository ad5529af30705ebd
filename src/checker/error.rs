//! Checker failure type.

use thiserror::Error;

/// Why a checker operation failed.
#[derive(Debug, Error)]
pub enum CheckerError {
    /// The service is reachable but behaved incorrectly
    #[error("Service is broken: {0}")]
    Mumble(String),

    /// The service is explicitly considered unreachable
    #[error("Service is offline: {0}")]
    Offline(String),

    /// HTTP client failure while talking to the service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Socket-level failure while talking to the service
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bug or unexpected condition in the checker itself
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CheckerError {
    pub fn mumble(message: impl Into<String>) -> Self {
        Self::Mumble(message.into())
    }

    pub fn offline(message: impl Into<String>) -> Self {
        Self::Offline(message.into())
    }

    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self::Internal(anyhow::anyhow!("{}", message))
    }
}
