//! End-to-end tests of the terminal provider without isolation.

use hostshell_integration_tests::provider;
use hostshell_terminal::{
    ExecuteCommandOptions, ExecuteCommandResult, IsolationMode, SessionOptions, TerminalError,
    TerminalProvider, WaitOptions,
};
use std::time::Duration;
use tempfile::TempDir;

fn quick_wait() -> WaitOptions {
    WaitOptions::new(
        Duration::from_millis(20),
        Duration::from_millis(300),
        Duration::from_secs(5),
    )
}

async fn wait_until_exited(provider: &TerminalProvider, id: &str) {
    for _ in 0..100 {
        match provider.get_session_status(id) {
            Some(status) if !status.running => return,
            Some(_) => tokio::time::sleep(Duration::from_millis(50)).await,
            None => panic!("session {} disappeared", id),
        }
    }
    panic!("session {} did not exit", id);
}

#[tokio::test]
async fn test_isolation_level_reports_none() {
    let dir = TempDir::new().unwrap();
    assert_eq!(provider(dir.path()).get_isolation_level(), IsolationMode::None);
}

#[tokio::test]
async fn test_commands_run_in_the_working_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
    let provider = provider(dir.path());

    let result = provider
        .execute_command(
            "cat",
            &["marker.txt".to_string()],
            &ExecuteCommandOptions::new(10),
        )
        .await;
    assert_eq!(
        result,
        ExecuteCommandResult::Success {
            output: "here".to_string()
        }
    );
}

#[tokio::test]
async fn test_script_result_variants() {
    let dir = TempDir::new().unwrap();
    let provider = provider(dir.path());

    let ok = provider
        .run_script("echo ok", &ExecuteCommandOptions::new(10))
        .await;
    assert!(ok.is_success());

    let bad = provider
        .run_script("echo partial; exit 4", &ExecuteCommandOptions::new(10))
        .await;
    assert_eq!(
        bad,
        ExecuteCommandResult::BadExitCode {
            output: "partial".to_string(),
            exit_code: 4
        }
    );

    let slow = provider
        .run_script("sleep 5", &ExecuteCommandOptions::new(1))
        .await;
    assert_eq!(slow, ExecuteCommandResult::Timeout);

    let missing = provider
        .execute_command("definitely-not-a-command-xyz", &[], &ExecuteCommandOptions::new(10))
        .await;
    assert!(matches!(missing, ExecuteCommandResult::UnknownError { .. }));
}

#[tokio::test]
async fn test_results_serialize_with_type_tag() {
    let dir = TempDir::new().unwrap();
    let provider = provider(dir.path());
    let result = provider
        .run_script("exit 2", &ExecuteCommandOptions::new(10))
        .await;

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["type"], "bad_exit_code");
    assert_eq!(json["exit_code"], 2);
}

#[tokio::test]
async fn test_session_cursor_replay() {
    let dir = TempDir::new().unwrap();
    let provider = provider(dir.path());
    let id = provider
        .start_session("/bin/sh", &[], &SessionOptions::default())
        .await
        .unwrap();
    assert!(id.starts_with("term-"));

    provider.send_input(&id, "echo one").await.unwrap();
    let first = provider.collect_output(&id, 0, &quick_wait()).await.unwrap();
    provider.send_input(&id, "echo two").await.unwrap();
    let second = provider
        .collect_output(&id, first.new_position, &quick_wait())
        .await
        .unwrap();

    // Replaying an old cursor returns the same prefix again.
    let replay = provider
        .collect_output(&id, 0, &WaitOptions::immediate())
        .await
        .unwrap();
    assert!(replay.output.starts_with(&first.output));
    assert!(replay.output.contains(&second.output));

    // Positions past the end clamp.
    let past = provider
        .collect_output(&id, usize::MAX / 2, &WaitOptions::immediate())
        .await
        .unwrap();
    assert!(past.output.is_empty());
    assert_eq!(
        past.new_position,
        provider.get_session_status(&id).unwrap().output_length
    );

    provider.terminate_session(&id);
}

#[tokio::test]
async fn test_session_exit_is_reported() {
    let dir = TempDir::new().unwrap();
    let provider = provider(dir.path());
    let id = provider
        .start_session("/bin/sh", &[], &SessionOptions::default())
        .await
        .unwrap();

    provider.send_input(&id, "exit 3").await.unwrap();
    wait_until_exited(&provider, &id).await;

    let collected = provider.collect_output(&id, 0, &quick_wait()).await.unwrap();
    assert!(collected.is_complete);
    assert_eq!(collected.exit_code, Some(3));

    let status = provider.get_session_status(&id).unwrap();
    assert!(!status.running);
    assert_eq!(status.exit_code, Some(3));
}

#[tokio::test]
async fn test_terminate_unresponsive_session() {
    let dir = TempDir::new().unwrap();
    let provider = provider(dir.path());
    let id = provider
        .start_session(
            "/bin/sh",
            &["-c".to_string(), "trap '' INT TERM HUP; while :; do sleep 1; done".to_string()],
            &SessionOptions::default(),
        )
        .await
        .unwrap();
    let pid = provider.get_session_status(&id).unwrap().pid.unwrap();

    provider.terminate_session(&id);
    assert!(provider.get_session_status(&id).is_none());

    let mut gone = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if !std::path::Path::new(&format!("/proc/{}", pid)).exists() {
            gone = true;
            break;
        }
    }
    assert!(gone, "process {} still running after terminate", pid);
}

/// True once `pid` is reaped or left as a zombie.
fn process_gone(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        // state follows the parenthesised command name
        Ok(stat) => stat
            .rsplit_once(") ")
            .map(|(_, rest)| rest.starts_with('Z'))
            .unwrap_or(false),
        Err(_) => true,
    }
}

#[tokio::test]
async fn test_terminate_kills_background_jobs() {
    if !std::path::Path::new("/bin/bash").exists() {
        eprintln!("skipping: /bin/bash not available");
        return;
    }
    let dir = TempDir::new().unwrap();
    let provider = provider(dir.path());
    let id = provider
        .start_session(
            "/bin/bash",
            &["--norc".to_string(), "--noprofile".to_string(), "-i".to_string()],
            &SessionOptions::default(),
        )
        .await
        .unwrap();

    provider.send_input(&id, "sleep 300 & echo BGPID=$!").await.unwrap();

    // The terminal echoes the command line too, so skip the literal `$!`.
    let mut background = None;
    for _ in 0..50 {
        let collected = provider
            .collect_output(&id, 0, &quick_wait())
            .await
            .unwrap();
        background = collected.output.split("BGPID=").skip(1).find_map(|chunk| {
            let digits: String = chunk.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u32>().ok()
        });
        if background.is_some() {
            break;
        }
    }
    let background = background.expect("background job pid never printed");
    assert!(!process_gone(background));

    provider.terminate_session(&id);

    let mut gone = false;
    for _ in 0..50 {
        if process_gone(background) {
            gone = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(gone, "background job {} outlived terminate_session", background);
}

#[tokio::test]
async fn test_concurrent_collects_see_consistent_prefixes() {
    let dir = TempDir::new().unwrap();
    let provider = provider(dir.path());
    let id = provider
        .start_session(
            "/bin/sh",
            &[
                "-c".to_string(),
                "for i in 1 2 3 4 5 6 7 8 9 10; do echo line-$i; sleep 0.1; done".to_string(),
            ],
            &SessionOptions::default(),
        )
        .await
        .unwrap();

    // Returns while the loop is still printing.
    let wait = WaitOptions::new(
        Duration::from_millis(10),
        Duration::from_millis(50),
        Duration::from_millis(300),
    );
    let (a, b) = tokio::join!(
        provider.collect_output(&id, 0, &wait),
        provider.collect_output(&id, 0, &wait)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    wait_until_exited(&provider, &id).await;
    let full = provider
        .collect_output(&id, 0, &quick_wait())
        .await
        .unwrap();
    assert!(full.output.contains("line-10"));
    assert!(full.output.starts_with(&a.output), "{:?} vs {:?}", a.output, full.output);
    assert!(full.output.starts_with(&b.output), "{:?} vs {:?}", b.output, full.output);
    assert!(a.new_position <= full.new_position);
    assert!(b.new_position <= full.new_position);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let dir = TempDir::new().unwrap();
    let provider = provider(dir.path());
    let a = provider
        .start_session("/bin/sh", &[], &SessionOptions::default())
        .await
        .unwrap();
    let b = provider
        .start_session("/bin/sh", &[], &SessionOptions::default())
        .await
        .unwrap();
    assert_ne!(a, b);

    provider.send_input(&a, "echo from-a").await.unwrap();
    provider.send_input(&b, "echo from-b").await.unwrap();

    let wait = quick_wait();
    let (out_a, out_b) = tokio::join!(
        provider.collect_output(&a, 0, &wait),
        provider.collect_output(&b, 0, &wait)
    );
    let (out_a, out_b) = (out_a.unwrap(), out_b.unwrap());
    assert!(out_a.output.contains("from-a") && !out_a.output.contains("from-b"));
    assert!(out_b.output.contains("from-b") && !out_b.output.contains("from-a"));

    // Terminating one leaves the other alone; ids are not reused.
    provider.terminate_session(&a);
    let c = provider
        .start_session("/bin/sh", &[], &SessionOptions::default())
        .await
        .unwrap();
    assert_ne!(c, a);
    assert!(provider.get_session_status(&b).unwrap().running);
}

#[tokio::test]
async fn test_unknown_session_is_an_error() {
    let dir = TempDir::new().unwrap();
    let provider = provider(dir.path());

    let err = provider.send_input("term-77", "ls").await.unwrap_err();
    assert!(matches!(err, TerminalError::SessionNotFound(_)));
    assert!(provider.get_session_status("term-77").is_none());
    provider.terminate_session("term-77");
}
