//! Interactive `shell` command.
//!
//! Each line read is sent to a PTY session, then output is collected once
//! the session has gone quiet. Lines starting with `:` are local commands.

use crate::context;
use crate::render;
use crate::GlobalArgs;
use clap::Args;
use console::style;
use hostshell_core::{env, paths};
use hostshell_terminal::{SessionOptions, TerminalProvider};
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor, EditMode};
use std::io::Write;

/// Shell command arguments.
#[derive(Args, Debug)]
pub struct ShellArgs {
    /// Shell to run (defaults to $SHELL)
    #[arg(long)]
    pub shell: Option<String>,
}

/// A line of user input, classified.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Empty,
    Status,
    Quit,
    Help,
    Unknown(&'a str),
    Input(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Empty;
    }
    match trimmed {
        ":status" => Line::Status,
        ":quit" | ":exit" => Line::Quit,
        ":help" => Line::Help,
        cmd if cmd.starts_with(':') => Line::Unknown(cmd),
        // keep leading whitespace, the shell may care
        _ => Line::Input(line),
    }
}

/// Run the shell command.
pub async fn run(global: &GlobalArgs, args: ShellArgs) -> anyhow::Result<()> {
    let provider = context::provider(global)?;
    let shell = args.shell.unwrap_or_else(env::user_shell);

    let id = provider
        .start_session(&shell, &[], &SessionOptions::default())
        .await?;
    eprintln!(
        "{} {} ({}, isolation: {})",
        style("Started").green(),
        id,
        shell,
        provider.get_isolation_level()
    );
    eprintln!("{}", style("Type :help for local commands").dim());

    let result = repl(&provider, &id).await;
    provider.terminate_session(&id);
    result
}

async fn repl(provider: &TerminalProvider, id: &str) -> anyhow::Result<()> {
    let wait = provider.default_wait_options();
    let mut position = print_new_output(provider, id, 0).await?;

    let rl_config = Config::builder()
        .history_ignore_space(true)
        .edit_mode(EditMode::Emacs)
        .build();
    let mut rl = DefaultEditor::with_config(rl_config)?;
    let history = paths::history_file().ok();
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }

    loop {
        match rl.readline("") {
            Ok(line) => match classify(&line) {
                Line::Empty => {
                    provider.send_input(id, "").await?;
                }
                Line::Status => {
                    match provider.get_session_status(id) {
                        Some(status) => render::render_status(&status),
                        None => eprintln!("{}", style("Session is gone").red()),
                    }
                    continue;
                }
                Line::Quit => break,
                Line::Help => {
                    render_help();
                    continue;
                }
                Line::Unknown(cmd) => {
                    eprintln!("{}: {}", style("Unknown command").red(), cmd);
                    render_help();
                    continue;
                }
                Line::Input(input) => {
                    let _ = rl.add_history_entry(input);
                    provider.send_input(id, input).await?;
                }
            },
            Err(ReadlineError::Interrupted) => {
                eprintln!("{}", style("^C (type :quit to exit)").dim());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}: {}", style("Error").red(), err);
                break;
            }
        }

        let collected = provider.collect_output(id, position, &wait).await?;
        print!("{}", collected.output);
        std::io::stdout().flush()?;
        position = collected.new_position;

        if collected.is_complete {
            let code = collected
                .exit_code
                .map_or_else(|| "unknown".to_string(), |c| c.to_string());
            eprintln!("\n{} (exit code {})", style("Session ended").yellow(), code);
            break;
        }
    }

    if let Some(path) = &history {
        let _ = rl.save_history(path);
    }
    Ok(())
}

async fn print_new_output(
    provider: &TerminalProvider,
    id: &str,
    from: usize,
) -> anyhow::Result<usize> {
    let collected = provider
        .collect_output(id, from, &provider.default_wait_options())
        .await?;
    print!("{}", collected.output);
    std::io::stdout().flush()?;
    Ok(collected.new_position)
}

fn render_help() {
    eprintln!("  {}  show session status", style(":status").cyan());
    eprintln!("  {}    terminate the session and exit", style(":quit").cyan());
    eprintln!("  {}    show this help", style(":help").cyan());
}
