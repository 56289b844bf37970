//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main hostshell configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Terminal provider settings.
    #[serde(default)]
    pub terminal: TerminalConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Terminal provider configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Root directory every command and session runs relative to.
    #[serde(default = "default_working_directory")]
    pub working_directory: PathBuf,

    /// Requested isolation.
    #[serde(default)]
    pub isolation: IsolationSetting,

    /// Timeout applied when a caller does not supply one.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Upper bound on captured output of a one-shot command.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Delay after spawning a session before its id is handed back.
    #[serde(default = "default_startup_grace_ms")]
    pub startup_grace_ms: u64,

    /// Pseudo-terminal geometry.
    #[serde(default)]
    pub pty: PtyGeometry,

    /// Default quiescence polling parameters.
    #[serde(default)]
    pub wait: WaitConfig,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            working_directory: default_working_directory(),
            isolation: IsolationSetting::default(),
            default_timeout_secs: default_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
            startup_grace_ms: default_startup_grace_ms(),
            pty: PtyGeometry::default(),
            wait: WaitConfig::default(),
        }
    }
}

fn default_working_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_output_bytes() -> usize {
    1024 * 1024 // 1 MiB
}

fn default_startup_grace_ms() -> u64 {
    100
}

/// Requested isolation for command execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationSetting {
    /// Run unconfined.
    None,
    /// Always run through the sandbox tool.
    Sandbox,
    /// Check the host and use the sandbox tool when present.
    #[default]
    Auto,
}

impl std::str::FromStr for IsolationSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "sandbox" => Ok(Self::Sandbox),
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "unknown isolation '{}', expected one of: none, sandbox, auto",
                other
            )),
        }
    }
}

impl std::fmt::Display for IsolationSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Sandbox => "sandbox",
            Self::Auto => "auto",
        };
        f.write_str(s)
    }
}

/// Pseudo-terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PtyGeometry {
    /// Columns.
    #[serde(default = "default_cols")]
    pub cols: u16,

    /// Rows.
    #[serde(default = "default_rows")]
    pub rows: u16,
}

impl Default for PtyGeometry {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
        }
    }
}

fn default_cols() -> u16 {
    80
}

fn default_rows() -> u16 {
    24
}

/// Quiescence polling defaults, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitConfig {
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    #[serde(default = "default_settle_interval_ms")]
    pub settle_interval_ms: u64,

    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
            settle_interval_ms: default_settle_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
        }
    }
}

fn default_min_interval_ms() -> u64 {
    50
}

fn default_settle_interval_ms() -> u64 {
    300
}

fn default_max_interval_ms() -> u64 {
    5000
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}
