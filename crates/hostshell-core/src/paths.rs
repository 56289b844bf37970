//! Path resolution utilities.

use crate::env;
use crate::error::ConfigError;
use std::path::{Component, Path, PathBuf};

/// Get the hostshell base directory (`$HOSTSHELL_HOME` or `~/.hostshell`).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = env::get_var(env::vars::HOME) {
        return Ok(expand_tilde(&home));
    }
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".hostshell"))
}

/// Get the main config file path (`~/.hostshell/hostshell.json5`).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("hostshell.json5"))
}

/// Get the interactive shell history file path (`~/.hostshell/history`).
pub fn history_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("history"))
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Resolve `relative` against `root`.
///
/// Absolute inputs replace the root. `.` and `..` components are folded
/// lexically; no escape check is done here.
pub fn resolve_against(root: &Path, relative: Option<&Path>) -> PathBuf {
    let joined = match relative {
        Some(rel) => root.join(rel),
        None => root.to_path_buf(),
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
