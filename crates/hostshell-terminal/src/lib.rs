//! Controlled shell access for automated agents.
//!
//! This crate runs commands on the host inside a bounded working directory,
//! optionally confined by a bubblewrap sandbox:
//! - [`isolation`]: decides once whether commands run unconfined or sandboxed
//! - [`wrapper`]: rewrites an invocation into its sandboxed equivalent
//! - [`executor`]: one-shot commands and scripts with timeout and merged output
//! - [`session`]: long-lived PTY sessions with cursor-based incremental reads
//! - [`provider`]: the façade a host application talks to

pub mod buffer;
pub mod error;
pub mod executor;
pub mod isolation;
pub mod provider;
pub mod pty;
pub mod session;
pub mod wait;
pub mod wrapper;

pub use error::TerminalError;
pub use executor::{CommandExecutor, ExecuteCommandOptions, ExecuteCommandResult};
pub use isolation::IsolationMode;
pub use provider::TerminalProvider;
pub use session::{CollectedOutput, SessionManager, SessionOptions, SessionStatus};
pub use wait::WaitOptions;
pub use wrapper::Invocation;

/// Result type for terminal operations.
pub type Result<T> = std::result::Result<T, TerminalError>;
