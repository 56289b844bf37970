//! Terminal rendering utilities.

use console::style;
use hostshell_terminal::{ExecuteCommandResult, SessionStatus};

/// Exit code reported when a command hits its timeout, as `timeout(1)` does.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Print a one-shot result and return the exit code the CLI should use.
pub fn render_result(result: &ExecuteCommandResult, timeout_secs: u64) -> i32 {
    match result {
        ExecuteCommandResult::Success { output } => print_output(output),
        ExecuteCommandResult::BadExitCode { output, exit_code } => {
            print_output(output);
            eprintln!("{}", style(format!("exit code {}", exit_code)).dim());
        }
        ExecuteCommandResult::Timeout => {
            eprintln!(
                "{}: command timed out after {}s",
                style("Error").red(),
                timeout_secs
            );
        }
        ExecuteCommandResult::UnknownError { error } => {
            eprintln!("{}: {}", style("Error").red(), error);
        }
    }
    exit_code_for(result)
}

/// Exit code for a result without printing anything.
pub fn exit_code_for(result: &ExecuteCommandResult) -> i32 {
    match result {
        ExecuteCommandResult::Success { .. } => 0,
        ExecuteCommandResult::BadExitCode { exit_code, .. } => *exit_code,
        ExecuteCommandResult::Timeout => TIMEOUT_EXIT_CODE,
        ExecuteCommandResult::UnknownError { .. } => 1,
    }
}

/// Render a session status block.
pub fn render_status(status: &SessionStatus) {
    let state = if status.running {
        style("running").green().to_string()
    } else {
        style("exited").yellow().to_string()
    };
    eprintln!("  {} {}", style("session:").dim(), status.id);
    eprintln!("  {} {}", style("state:").dim(), state);
    if let Some(pid) = status.pid {
        eprintln!("  {} {}", style("pid:").dim(), pid);
    }
    eprintln!("  {} {}", style("started:").dim(), status.start_time.to_rfc3339());
    eprintln!("  {} {} bytes", style("output:").dim(), status.output_length);
    if let Some(last) = status.last_output_time {
        eprintln!("  {} {}", style("last output:").dim(), last.to_rfc3339());
    }
    if let Some(code) = status.exit_code {
        eprintln!("  {} {}", style("exit code:").dim(), code);
    }
}

fn print_output(output: &str) {
    if !output.is_empty() {
        println!("{}", output);
    }
}
