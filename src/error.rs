// File: ./src/error.rs
//! Failure taxonomy shared by the store, the remote client and the CLI.
use thiserror::Error;

/// Result type alias for journal operations.
pub type Result<T> = std::result::Result<T, JournalError>;

#[derive(Debug, Error)]
pub enum JournalError {
    /// The remote path was required but the session, URL or TLS setup is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network failure, timeout, non-2xx status or malformed response body.
    #[error("Remote call failed: {0}")]
    RemoteCall(String),

    /// Local persistence could not be read, parsed or written.
    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl JournalError {
    pub fn config(msg: impl Into<String>) -> Self {
        JournalError::Config(msg.into())
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        JournalError::RemoteCall(msg.into())
    }

    /// True for failures the store recovers from by switching to local storage.
    pub fn is_remote(&self) -> bool {
        matches!(self, JournalError::RemoteCall(_))
    }
}
