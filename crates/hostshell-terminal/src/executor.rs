//! One-shot command execution.

use crate::isolation::IsolationMode;
use crate::wrapper::{self, Invocation};
use hostshell_core::{env, paths};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default bound on captured output.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Marker appended when output exceeded the capture bound.
pub const TRUNCATION_MARKER: &str = "[output truncated]";

/// Options for a single command or script.
///
/// There is no default: every invocation needs an explicit timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteCommandOptions {
    /// Wall-clock limit on the whole invocation.
    pub timeout_secs: u64,

    /// Variables overlaid on the inherited environment.
    pub env: HashMap<String, String>,

    /// Directory relative to the provider root. Defaults to the root.
    pub working_directory: Option<PathBuf>,

    /// Data written to standard input. `None` means no input stream.
    pub input: Option<String>,
}

impl ExecuteCommandOptions {
    /// Create options with the given timeout.
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            env: HashMap::new(),
            working_directory: None,
            input: None,
        }
    }

    /// Set an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set multiple environment variables.
    pub fn with_envs(mut self, vars: HashMap<String, String>) -> Self {
        self.env.extend(vars);
        self
    }

    /// Set the working directory, relative to the provider root.
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Set standard input.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }
}

/// Outcome of a command or script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecuteCommandResult {
    /// Exited with status zero.
    Success { output: String },

    /// The timeout elapsed and the process was killed.
    Timeout,

    /// Exited with a non-zero status.
    BadExitCode { output: String, exit_code: i32 },

    /// Spawn failure or anything else that could not be classified.
    UnknownError { error: String },
}

impl ExecuteCommandResult {
    /// Check if the command succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Captured output, when the outcome carries any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Success { output } | Self::BadExitCode { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Exit code, when the process exited on its own.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Success { .. } => Some(0),
            Self::BadExitCode { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    fn unknown(error: impl Into<String>) -> Self {
        Self::UnknownError {
            error: error.into(),
        }
    }
}

/// Runs commands to completion under a fixed root and isolation mode.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    /// Root that relative working directories resolve against.
    root: PathBuf,

    /// Resolved isolation.
    isolation: IsolationMode,

    /// Maximum output size to capture.
    max_output_bytes: usize,
}

impl CommandExecutor {
    /// Create a new executor.
    pub fn new(root: impl Into<PathBuf>, isolation: IsolationMode) -> Self {
        Self {
            root: root.into(),
            isolation,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    /// Set maximum output size.
    pub fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run `command` with `args`.
    pub async fn execute_command(
        &self,
        command: &str,
        args: &[String],
        options: &ExecuteCommandOptions,
    ) -> ExecuteCommandResult {
        let env = env::inherited_with(&options.env);
        self.run(command, args, env, options).await
    }

    /// Run `script` through the user's shell with `-c`.
    ///
    /// `TERM=dumb` and `NO_COLOR=1` are set unless the caller overrides them.
    pub async fn run_script(
        &self,
        script: &str,
        options: &ExecuteCommandOptions,
    ) -> ExecuteCommandResult {
        let shell = env::user_shell();
        let args = vec!["-c".to_string(), script.to_string()];
        let env = env::overlay(env::inherited_with(&script_env()), &options.env);
        self.run(&shell, &args, env, options).await
    }

    async fn run(
        &self,
        command: &str,
        args: &[String],
        env: HashMap<String, String>,
        options: &ExecuteCommandOptions,
    ) -> ExecuteCommandResult {
        let cwd = paths::resolve_against(&self.root, options.working_directory.as_deref());
        let invocation = wrapper::wrap(command, args, &cwd, self.isolation);
        let timeout_duration = Duration::from_secs(options.timeout_secs);
        let start = Instant::now();

        debug!(
            program = %invocation.program,
            command,
            cwd = %cwd.display(),
            timeout_secs = options.timeout_secs,
            "Executing command"
        );

        let result = self
            .spawn_and_wait(&invocation, &cwd, env, options.input.as_deref(), timeout_duration)
            .await;

        debug!(
            command,
            duration_ms = start.elapsed().as_millis() as u64,
            outcome = outcome_name(&result),
            exit_code = ?result.exit_code(),
            "Command finished"
        );
        result
    }

    async fn spawn_and_wait(
        &self,
        invocation: &Invocation,
        cwd: &Path,
        env: HashMap<String, String>,
        input: Option<&str>,
        timeout_duration: Duration,
    ) -> ExecuteCommandResult {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(cwd)
            .env_clear()
            .envs(&env)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so a timeout can take down the whole tree.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExecuteCommandResult::unknown(format!(
                    "Failed to spawn {}: {}",
                    invocation.program, e
                ))
            }
        };

        let pid = child.id();
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let max_output_bytes = self.max_output_bytes;

        let run = async {
            let (fed, captured) = tokio::join!(
                feed_input(stdin, input),
                capture_merged(stdout, stderr, max_output_bytes),
            );
            if let Err(e) = fed {
                // The child may exit without reading its input.
                debug!(error = %e, "Failed to write command input");
            }
            let status = child.wait().await?;
            Ok::<_, io::Error>((status, captured))
        };

        let outcome = timeout(timeout_duration, run).await;

        match outcome {
            Ok(Ok((status, captured))) => classify(status, captured.into_text()),
            Ok(Err(e)) => ExecuteCommandResult::unknown(format!(
                "Failed to wait for {}: {}",
                invocation.program, e
            )),
            Err(_) => {
                warn!(
                    program = %invocation.program,
                    timeout_secs = timeout_duration.as_secs(),
                    "Command timed out, killing process group"
                );
                #[cfg(unix)]
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "Child already reaped after timeout");
                }
                ExecuteCommandResult::Timeout
            }
        }
    }
}

/// Variables forced for scripts so tools do not emit control sequences.
fn script_env() -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert(env::vars::TERM.to_string(), "dumb".to_string());
    vars.insert(env::vars::NO_COLOR.to_string(), "1".to_string());
    vars
}

fn classify(status: ExitStatus, output: String) -> ExecuteCommandResult {
    match exit_code(status) {
        0 => ExecuteCommandResult::Success { output },
        exit_code => ExecuteCommandResult::BadExitCode { output, exit_code },
    }
}

/// Exit code, mapping death-by-signal to the shell convention `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

fn outcome_name(result: &ExecuteCommandResult) -> &'static str {
    match result {
        ExecuteCommandResult::Success { .. } => "success",
        ExecuteCommandResult::Timeout => "timeout",
        ExecuteCommandResult::BadExitCode { .. } => "bad_exit_code",
        ExecuteCommandResult::UnknownError { .. } => "unknown_error",
    }
}

/// Send SIGKILL to the process group led by `pid`.
#[cfg(unix)]
pub(crate) fn kill_process_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => debug!(pid, error = %e, "Failed to signal process group"),
    }
}

async fn feed_input(stdin: Option<ChildStdin>, input: Option<&str>) -> io::Result<()> {
    if let (Some(mut stdin), Some(input)) = (stdin, input) {
        stdin.write_all(input.as_bytes()).await?;
        stdin.shutdown().await?;
    }
    Ok(())
}

/// Output gathered from both streams in arrival order.
#[derive(Debug)]
struct CapturedOutput {
    bytes: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl CapturedOutput {
    fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
            truncated: false,
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        if self.truncated {
            return;
        }
        let room = self.limit.saturating_sub(self.bytes.len());
        if chunk.len() > room {
            self.bytes.extend_from_slice(&chunk[..room]);
            self.truncated = true;
        } else {
            self.bytes.extend_from_slice(chunk);
        }
    }

    fn into_text(self) -> String {
        let text = String::from_utf8_lossy(&self.bytes);
        let mut text = text.trim_end().to_string();
        if self.truncated {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(TRUNCATION_MARKER);
        }
        text
    }
}

/// Merge stdout and stderr into one stream ordered by arrival.
///
/// Both streams are drained to EOF even past the limit so the child never
/// blocks on a full pipe.
async fn capture_merged<O, E>(stdout: Option<O>, stderr: Option<E>, limit: usize) -> CapturedOutput
where
    O: AsyncRead + Unpin + Send + 'static,
    E: AsyncRead + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(64);
    if let Some(stdout) = stdout {
        tokio::spawn(pump(stdout, tx.clone()));
    }
    if let Some(stderr) = stderr {
        tokio::spawn(pump(stderr, tx.clone()));
    }
    drop(tx);

    let mut captured = CapturedOutput::new(limit);
    while let Some(chunk) = rx.recv().await {
        captured.push(&chunk);
    }
    captured
}

async fn pump<R>(mut reader: R, tx: mpsc::Sender<Vec<u8>>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("Error reading stream: {}", e);
                break;
            }
        }
    }
}
