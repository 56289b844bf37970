//! One-shot `exec` and `script` commands.

use crate::context;
use crate::render;
use crate::GlobalArgs;
use clap::Args;
use hostshell_terminal::{ExecuteCommandOptions, ExecuteCommandResult};
use std::path::PathBuf;

/// Options shared by `exec` and `script`.
#[derive(Args, Debug, Clone)]
pub struct RunOptionsArgs {
    /// Timeout in seconds (defaults to terminal.default_timeout_secs)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Extra environment variable as KEY=VALUE (repeatable)
    #[arg(short, long = "env", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Directory relative to the working directory
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Print the result as JSON instead of plain output
    #[arg(long)]
    pub json: bool,
}

/// Exec command arguments.
#[derive(Args, Debug)]
pub struct ExecArgs {
    #[command(flatten)]
    pub common: RunOptionsArgs,

    /// Text fed to the command's standard input
    #[arg(long)]
    pub input: Option<String>,

    /// Command followed by its arguments
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Script command arguments.
#[derive(Args, Debug)]
pub struct ScriptArgs {
    /// Script text run with the user's shell
    pub script: String,

    #[command(flatten)]
    pub common: RunOptionsArgs,
}

/// Run the exec command.
pub async fn run_exec(global: &GlobalArgs, args: ExecArgs) -> anyhow::Result<i32> {
    let provider = context::provider(global)?;
    let mut options = command_options(&args.common, provider.default_command_options());
    if let Some(input) = args.input {
        options = options.with_input(input);
    }

    let (program, rest) = args
        .command
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("No command given"))?;
    let result = provider.execute_command(program, rest, &options).await;
    report(&result, &options, args.common.json)
}

/// Run the script command.
pub async fn run_script(global: &GlobalArgs, args: ScriptArgs) -> anyhow::Result<i32> {
    let provider = context::provider(global)?;
    let options = command_options(&args.common, provider.default_command_options());

    let result = provider.run_script(&args.script, &options).await;
    report(&result, &options, args.common.json)
}

fn command_options(args: &RunOptionsArgs, defaults: ExecuteCommandOptions) -> ExecuteCommandOptions {
    let mut options = defaults;
    if let Some(timeout) = args.timeout {
        options.timeout_secs = timeout;
    }
    for (key, value) in &args.env {
        options = options.with_env(key, value);
    }
    if let Some(cwd) = &args.cwd {
        options = options.with_working_directory(cwd);
    }
    options
}

fn report(
    result: &ExecuteCommandResult,
    options: &ExecuteCommandOptions,
    json: bool,
) -> anyhow::Result<i32> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        Ok(render::exit_code_for(result))
    } else {
        Ok(render::render_result(result, options.timeout_secs))
    }
}

/// Parse a `KEY=VALUE` pair.
pub fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}
