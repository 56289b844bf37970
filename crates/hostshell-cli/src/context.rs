//! Configuration and provider setup shared by commands.

use crate::GlobalArgs;
use hostshell_core::config::Config;
use hostshell_core::ConfigError;
use hostshell_terminal::TerminalProvider;

/// Load configuration and apply command-line overrides.
pub fn load_config(global: &GlobalArgs) -> Result<Config, ConfigError> {
    let mut config = Config::load_or_default(global.config.as_deref())?;

    if let Some(dir) = &global.working_dir {
        config.terminal.working_directory = dir.clone();
    }
    if let Some(isolation) = global.isolation {
        config.terminal.isolation = isolation;
    }

    Ok(config)
}

/// Load and validate configuration, then build a provider from it.
pub fn provider(global: &GlobalArgs) -> anyhow::Result<TerminalProvider> {
    let config = load_config(global)?;
    config.validate()?;
    Ok(TerminalProvider::new(&config.terminal)?)
}
