//! Isolation mode resolution.
//!
//! The mode is decided once, when a provider is built, and never checked again.

use hostshell_core::config::IsolationSetting;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Program used for sandbox confinement.
pub const SANDBOX_PROGRAM: &str = "bwrap";

/// How commands are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationMode {
    /// Commands run directly on the host.
    None,
    /// Commands run inside the sandbox tool.
    Sandbox,
}

impl IsolationMode {
    /// Lowercase name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sandbox => "sandbox",
        }
    }
}

impl fmt::Display for IsolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a configured setting, checking the host when it is `auto`.
pub fn resolve(setting: IsolationSetting) -> IsolationMode {
    resolve_with(setting, sandbox_available)
}

/// Resolve a configured setting with a caller-supplied availability check.
///
/// The check runs only for [`IsolationSetting::Auto`]. An explicit `sandbox`
/// is taken at its word; a missing tool then shows up as a spawn failure.
pub fn resolve_with<F>(setting: IsolationSetting, detect: F) -> IsolationMode
where
    F: FnOnce() -> bool,
{
    let mode = match setting {
        IsolationSetting::None => IsolationMode::None,
        IsolationSetting::Sandbox => IsolationMode::Sandbox,
        IsolationSetting::Auto => {
            if detect() {
                IsolationMode::Sandbox
            } else {
                IsolationMode::None
            }
        }
    };

    info!(requested = %setting, mode = %mode, "Terminal isolation resolved");
    mode
}

/// Check whether the sandbox tool can be executed on this host.
pub fn sandbox_available() -> bool {
    let available = Command::new(SANDBOX_PROGRAM)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false);

    debug!(program = SANDBOX_PROGRAM, available, "Checked for sandbox tool");
    available
}
