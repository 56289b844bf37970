//! Terminal error types.
//!
//! Only failures the caller must handle out-of-band live here. Outcomes of a
//! one-shot command (timeout, non-zero exit, spawn failure) are values of
//! [`ExecuteCommandResult`](crate::ExecuteCommandResult) instead.

use hostshell_core::ConfigError;
use std::io;
use thiserror::Error;

/// Errors raised by the terminal provider.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// Provider construction failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The session id is unknown or was terminated.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// PTY error.
    #[error("PTY error: {0}")]
    Pty(String),

    /// Process could not be started.
    #[error("Failed to spawn process: {0}")]
    Spawn(String),
}

impl TerminalError {
    /// Create a new PTY error.
    pub fn pty(msg: impl Into<String>) -> Self {
        Self::Pty(msg.into())
    }

    /// Create a new spawn error.
    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::Spawn(msg.into())
    }

    /// Check if this error reports a missing session.
    pub fn is_session_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound(_))
    }
}
