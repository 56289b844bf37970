//! Shared helpers for hostshell integration tests.

use hostshell_core::config::{IsolationSetting, TerminalConfig};
use hostshell_core::LocalFilesystem;
use hostshell_terminal::{
    ExecuteCommandOptions, ExecuteCommandResult, IsolationMode, TerminalProvider,
};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Terminal config rooted at `dir` with isolation off and a short startup grace.
pub fn terminal_config(dir: &Path) -> TerminalConfig {
    TerminalConfig {
        working_directory: dir.to_path_buf(),
        isolation: IsolationSetting::None,
        startup_grace_ms: 50,
        ..TerminalConfig::default()
    }
}

/// Unconfined provider rooted at `dir`.
pub fn provider(dir: &Path) -> TerminalProvider {
    TerminalProvider::new(&terminal_config(dir)).expect("provider")
}

/// Sandboxed provider rooted at `dir`, or `None` when bubblewrap cannot run
/// here (missing binary or user namespaces disabled).
pub async fn sandboxed_provider(dir: &Path) -> Option<TerminalProvider> {
    let provider = TerminalProvider::with_isolation(
        &terminal_config(dir),
        &LocalFilesystem,
        IsolationMode::Sandbox,
    )
    .expect("provider");

    let smoke = provider
        .execute_command("true", &[], &ExecuteCommandOptions::new(10))
        .await;
    match smoke {
        ExecuteCommandResult::Success { .. } => Some(provider),
        other => {
            eprintln!("skipping: sandbox unusable here: {:?}", other);
            None
        }
    }
}

/// Locate the compiled `hostshell` binary in the workspace target directory.
pub fn hostshell_bin() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // tests/integration -> workspace root
    let workspace_root = manifest_dir
        .parent()
        .expect("tests/ parent")
        .parent()
        .expect("workspace root");
    let bin = workspace_root.join("target").join("debug").join("hostshell");
    assert!(
        bin.exists(),
        "hostshell binary not found at {}; run `cargo build -p hostshell-cli` first",
        bin.display()
    );
    bin
}

/// A `hostshell` command isolated from the user's config and environment.
pub fn hostshell_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(hostshell_bin());
    cmd.env("HOSTSHELL_HOME", home)
        .env_remove("HOSTSHELL_CONFIG")
        .env_remove("HOSTSHELL_WORKDIR")
        .env_remove("HOSTSHELL_ISOLATION")
        .env_remove("RUST_LOG");
    cmd
}
