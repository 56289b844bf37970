//! Tests that need a working bubblewrap. Each skips itself when the sandbox
//! cannot run on this host.

use hostshell_integration_tests::sandboxed_provider;
use hostshell_terminal::{
    ExecuteCommandOptions, ExecuteCommandResult, IsolationMode, SessionOptions, WaitOptions,
};
use tempfile::TempDir;

#[tokio::test]
async fn test_sandbox_runs_in_working_directory() {
    let dir = TempDir::new().unwrap();
    let Some(provider) = sandboxed_provider(dir.path()).await else {
        return;
    };
    assert_eq!(provider.get_isolation_level(), IsolationMode::Sandbox);

    let result = provider
        .execute_command("pwd", &[], &ExecuteCommandOptions::new(10))
        .await;
    assert_eq!(
        result.output(),
        Some(provider.working_directory().to_string_lossy().as_ref())
    );
}

#[tokio::test]
async fn test_sandbox_can_write_working_directory_only() {
    let dir = TempDir::new().unwrap();
    let Some(provider) = sandboxed_provider(dir.path()).await else {
        return;
    };

    let inside = provider
        .run_script("echo kept > inside.txt", &ExecuteCommandOptions::new(10))
        .await;
    assert!(inside.is_success(), "{:?}", inside);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("inside.txt")).unwrap(),
        "kept\n"
    );

    let outside = provider
        .run_script("touch /usr/hostshell-escape", &ExecuteCommandOptions::new(10))
        .await;
    assert!(matches!(outside, ExecuteCommandResult::BadExitCode { .. }));
    assert!(!std::path::Path::new("/usr/hostshell-escape").exists());
}

#[tokio::test]
async fn test_sandbox_tmp_is_private() {
    let dir = TempDir::new().unwrap();
    let Some(provider) = sandboxed_provider(dir.path()).await else {
        return;
    };

    let marker = format!("/tmp/hostshell-private-{}", std::process::id());
    let result = provider
        .run_script(&format!("touch {}", marker), &ExecuteCommandOptions::new(10))
        .await;
    assert!(result.is_success(), "{:?}", result);
    assert!(!std::path::Path::new(&marker).exists());
}

#[tokio::test]
async fn test_sandboxed_session() {
    let dir = TempDir::new().unwrap();
    let Some(provider) = sandboxed_provider(dir.path()).await else {
        return;
    };

    let id = provider
        .start_session("/bin/sh", &[], &SessionOptions::default())
        .await
        .unwrap();
    provider.send_input(&id, "echo sandboxed-$((6 * 7))").await.unwrap();
    let collected = provider
        .collect_output(&id, 0, &WaitOptions::default())
        .await
        .unwrap();
    assert!(collected.output.contains("sandboxed-42"));
    provider.terminate_session(&id);
}
