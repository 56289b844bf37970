//! Configuration management commands.

use crate::context;
use crate::GlobalArgs;
use clap::Args;
use hostshell_core::config::Config;
use hostshell_core::paths;
use std::path::PathBuf;

/// Config command arguments.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Validate configuration
    Validate,
}

/// Run the config command.
pub fn run(global: &GlobalArgs, args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = context::load_config(global)?;
            println!("{}", config.to_json5()?);
        }

        ConfigCommand::Path => {
            println!("{}", config_path(global)?.display());
        }

        ConfigCommand::Init { force } => {
            let path = config_path(global)?;

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {}. Use --force to overwrite.",
                    path.display()
                );
            }

            // Picks up HOSTSHELL_WORKDIR and HOSTSHELL_ISOLATION
            let config = Config::from_env_defaults();
            config.save(&path)?;

            println!("Created config file: {}", path.display());
        }

        ConfigCommand::Validate => {
            let path = config_path(global)?;
            let config = Config::load(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
            println!("Configuration is valid");
        }
    }

    Ok(())
}

fn config_path(global: &GlobalArgs) -> anyhow::Result<PathBuf> {
    match &global.config {
        Some(path) => Ok(path.clone()),
        None => Ok(paths::config_file()?),
    }
}
