//! Sandbox wrapping of command invocations.
//!
//! [`wrap`] is pure: it never touches the filesystem. Optional system
//! directories use `--ro-bind-try` so a missing `/lib64` or `/lib32` is
//! skipped by the sandbox tool itself.

use crate::isolation::{IsolationMode, SANDBOX_PROGRAM};
use std::path::Path;

/// System directories exposed read-only inside the sandbox.
const READ_ONLY_SYSTEM_DIRS: &[&str] = &[
    "/usr", "/bin", "/sbin", "/lib", "/lib64", "/lib32", "/etc",
];

/// A program plus its arguments, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute.
    pub program: String,

    /// Arguments passed to the program.
    pub args: Vec<String>,
}

impl Invocation {
    /// Create an invocation.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Produce the invocation that runs `command args` under `mode` with `cwd`
/// as the working directory.
pub fn wrap(command: &str, args: &[String], cwd: &Path, mode: IsolationMode) -> Invocation {
    match mode {
        IsolationMode::None => Invocation::new(command, args.to_vec()),
        IsolationMode::Sandbox => {
            let mut sandbox_args = confinement_args(cwd);
            sandbox_args.push(command.to_string());
            sandbox_args.extend(args.iter().cloned());
            Invocation::new(SANDBOX_PROGRAM, sandbox_args)
        }
    }
}

/// The fixed confinement policy, up to and including the `--` separator.
fn confinement_args(cwd: &Path) -> Vec<String> {
    let cwd = cwd.to_string_lossy().into_owned();
    let mut args = Vec::with_capacity(READ_ONLY_SYSTEM_DIRS.len() * 3 + 16);

    for dir in READ_ONLY_SYSTEM_DIRS {
        args.push("--ro-bind-try".to_string());
        args.push((*dir).to_string());
        args.push((*dir).to_string());
    }

    args.extend(
        [
            "--proc", "/proc",
            "--dev", "/dev",
            "--tmpfs", "/tmp",
        ]
        .iter()
        .map(|s| s.to_string()),
    );

    args.push("--bind".to_string());
    args.push(cwd.clone());
    args.push(cwd.clone());
    args.push("--chdir".to_string());
    args.push(cwd);

    args.extend(
        ["--unshare-all", "--share-net", "--die-with-parent", "--"]
            .iter()
            .map(|s| s.to_string()),
    );

    args
}
