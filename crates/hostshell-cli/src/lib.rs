//! hostshell command-line interface.

pub mod commands;
pub mod context;
pub mod render;

use clap::{Args, Parser, Subcommand};
use hostshell_core::config::IsolationSetting;
use std::path::PathBuf;

/// hostshell - controlled shell access inside a bounded working directory
#[derive(Parser)]
#[command(name = "hostshell")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "HOSTSHELL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Working directory commands are confined to
    #[arg(short = 'w', long, env = "HOSTSHELL_WORKDIR", global = true)]
    pub working_dir: Option<PathBuf>,

    /// Isolation mode: none, sandbox, or auto
    #[arg(long, env = "HOSTSHELL_ISOLATION", global = true)]
    pub isolation: Option<IsolationSetting>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a command to completion
    Exec(commands::exec::ExecArgs),

    /// Run a shell script to completion
    Script(commands::exec::ScriptArgs),

    /// Open an interactive session
    Shell(commands::shell::ShellArgs),

    /// Run diagnostics
    Doctor,

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// Run the CLI and return the process exit code.
pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    let global = cli.global;
    match cli.command {
        Commands::Exec(args) => commands::exec::run_exec(&global, args).await,
        Commands::Script(args) => commands::exec::run_script(&global, args).await,
        Commands::Shell(args) => commands::shell::run(&global, args).await.map(|_| 0),
        Commands::Doctor => commands::doctor::run(&global).map(|_| 0),
        Commands::Config(args) => commands::config::run(&global, args).map(|_| 0),
        Commands::Version => {
            println!("hostshell {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}
