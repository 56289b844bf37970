//! Diagnostic commands.

use crate::context;
use crate::GlobalArgs;
use console::{style, Emoji};
use hostshell_core::config::IsolationSetting;
use hostshell_core::{env, paths, ConfigError};
use hostshell_terminal::isolation::{self, SANDBOX_PROGRAM};

static CHECK: Emoji = Emoji("✓", "+");
static CROSS: Emoji = Emoji("✗", "x");
static WARN: Emoji = Emoji("⚠", "!");

/// Run the doctor command.
pub fn run(global: &GlobalArgs) -> anyhow::Result<()> {
    println!("hostshell Doctor\n");

    let mut errors = 0;
    let mut warnings = 0;

    println!("Checking configuration...");

    let config_path = match &global.config {
        Some(path) => Ok(path.clone()),
        None => paths::config_file(),
    };
    match &config_path {
        Ok(path) if path.exists() => {
            println!("  {} Config file: {}", style(CHECK).green(), path.display());
        }
        Ok(path) => {
            println!(
                "  {} Config file not found, using defaults: {}",
                style(WARN).yellow(),
                path.display()
            );
            println!("    Run 'hostshell config init' to create one");
            warnings += 1;
        }
        Err(e) => {
            println!("  {} Failed to determine config path: {}", style(CROSS).red(), e);
            errors += 1;
        }
    }

    let config = match context::load_config(global) {
        Ok(config) => {
            match config.validate() {
                Ok(()) => println!("  {} Configuration valid", style(CHECK).green()),
                Err(e) => {
                    println!("  {} Configuration invalid: {}", style(CROSS).red(), e);
                    errors += 1;
                }
            }
            Some(config)
        }
        Err(e) => {
            println!("  {} Configuration error: {}", style(CROSS).red(), e);
            errors += 1;
            None
        }
    };

    println!("\nChecking working directory...");

    if let Some(config) = &config {
        let dir = &config.terminal.working_directory;
        if dir.is_dir() {
            println!("  {} Working directory exists: {}", style(CHECK).green(), dir.display());
        } else {
            let err = ConfigError::MissingWorkingDirectory(dir.clone());
            println!("  {} {}", style(CROSS).red(), err);
            errors += 1;
        }
    }

    println!("\nChecking shell...");

    let shell = env::user_shell();
    if std::path::Path::new(&shell).exists() {
        println!("  {} Shell: {}", style(CHECK).green(), shell);
    } else {
        println!("  {} Shell not found: {}", style(CROSS).red(), shell);
        errors += 1;
    }

    println!("\nChecking isolation...");

    let available = isolation::sandbox_available();
    if available {
        println!("  {} {} is available", style(CHECK).green(), SANDBOX_PROGRAM);
    } else {
        println!("  {} {} not found", style(WARN).yellow(), SANDBOX_PROGRAM);
        warnings += 1;
    }

    if let Some(config) = &config {
        let setting = config.terminal.isolation;
        let mode = isolation::resolve_with(setting, || available);
        println!("  {} Isolation: {} (configured {})", style(CHECK).green(), mode, setting);
        if setting == IsolationSetting::Sandbox && !available {
            println!(
                "  {} Sandbox isolation is forced but {} is missing; commands will fail to spawn",
                style(CROSS).red(),
                SANDBOX_PROGRAM
            );
            errors += 1;
        }
    }

    println!("\n{}", style("Summary").bold());
    println!("  Errors: {}", if errors > 0 { style(errors).red() } else { style(errors).green() });
    println!("  Warnings: {}", if warnings > 0 { style(warnings).yellow() } else { style(warnings).green() });

    if errors > 0 {
        anyhow::bail!("{} error(s) found", errors);
    }

    Ok(())
}
