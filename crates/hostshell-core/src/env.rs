//! Environment variable handling.

use std::collections::HashMap;
use std::env;

/// Shell used when `$SHELL` is unset or empty.
pub const FALLBACK_SHELL: &str = "/bin/bash";

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
pub fn get_var_or(name: &str, default: &str) -> String {
    get_var(name).unwrap_or_else(|| default.to_string())
}

/// The user's login shell (`$SHELL`, falling back to `/bin/bash`).
pub fn user_shell() -> String {
    get_var_or(vars::SHELL, FALLBACK_SHELL)
}

/// Overlay `overrides` on top of `base`; override values win.
pub fn overlay(
    base: HashMap<String, String>,
    overrides: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut merged = base;
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// The current process environment overlaid with `overrides`.
pub fn inherited_with(overrides: &HashMap<String, String>) -> HashMap<String, String> {
    overlay(env::vars().collect(), overrides)
}

/// Common environment variable names.
pub mod vars {
    /// Login shell.
    pub const SHELL: &str = "SHELL";

    /// Terminal type.
    pub const TERM: &str = "TERM";

    /// Colour suppression convention honoured by most CLIs.
    pub const NO_COLOR: &str = "NO_COLOR";

    /// hostshell config file override.
    pub const CONFIG: &str = "HOSTSHELL_CONFIG";

    /// hostshell working directory override.
    pub const WORKDIR: &str = "HOSTSHELL_WORKDIR";

    /// hostshell isolation override.
    pub const ISOLATION: &str = "HOSTSHELL_ISOLATION";

    /// hostshell home directory override.
    pub const HOME: &str = "HOSTSHELL_HOME";
}
