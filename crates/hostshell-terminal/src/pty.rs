//! Pseudo-terminal processes.
//!
//! Each [`PtyProcess`] owns two detached threads: one copying the PTY master
//! into an [`OutputBuffer`], one blocked in `wait()` to record the exit code.

use crate::buffer::OutputBuffer;
use crate::error::TerminalError;
use crate::Result;
use parking_lot::Mutex;
use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, MasterPty, PtySize};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Read size for the PTY output pump.
const READ_CHUNK: usize = 4096;

/// PTY process configuration.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Program to run.
    pub program: String,

    /// Program arguments.
    pub args: Vec<String>,

    /// Working directory.
    pub cwd: PathBuf,

    /// Variables set on top of the inherited environment.
    pub env: HashMap<String, String>,

    /// Initial terminal size (columns).
    pub cols: u16,

    /// Initial terminal size (rows).
    pub rows: u16,

    /// Label used for thread names and logs.
    pub label: String,
}

impl PtyConfig {
    /// Create a config for `program` in `cwd` with an 80x24 terminal.
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: HashMap::new(),
            cols: 80,
            rows: 24,
            label: "pty".to_string(),
        }
    }

    /// Set command arguments.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Set terminal size.
    pub fn with_size(mut self, cols: u16, rows: u16) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }

    /// Set multiple environment variables.
    pub fn with_envs(mut self, vars: HashMap<String, String>) -> Self {
        self.env.extend(vars);
        self
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// A child process attached to a pseudo-terminal.
pub struct PtyProcess {
    master: Mutex<Box<dyn MasterPty + Send>>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    killer: Mutex<Box<dyn ChildKiller + Send + Sync>>,
    pid: Option<u32>,
    label: String,
}

impl PtyProcess {
    /// Spawn the configured program and start pumping its output into `output`.
    pub fn spawn(config: PtyConfig, output: Arc<OutputBuffer>) -> Result<Self> {
        let pair = native_pty_system()
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| TerminalError::pty(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&config.program);
        cmd.args(&config.args);
        cmd.cwd(&config.cwd);
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let mut child = pair.slave.spawn_command(cmd).map_err(|e| {
            TerminalError::spawn(format!("{}: {}", config.program, e))
        })?;
        // Only the child may hold the slave, otherwise EOF never arrives.
        drop(pair.slave);

        let pid = child.process_id();
        let killer = child.clone_killer();

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| TerminalError::pty(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| TerminalError::pty(e.to_string()))?;

        let reader_output = Arc::clone(&output);
        let reader_label = config.label.clone();
        thread::Builder::new()
            .name(format!("{}-output", config.label))
            .spawn(move || {
                let mut chunk = [0u8; READ_CHUNK];
                loop {
                    match reader.read(&mut chunk) {
                        Ok(0) => break,
                        Ok(n) => reader_output.append(&chunk[..n]),
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        // EIO is how Linux reports a hung-up slave
                        Err(e) => {
                            debug!(session_id = %reader_label, error = %e, "PTY output closed");
                            break;
                        }
                    }
                }
                reader_output.close_stream();
            })?;

        let waiter_label = config.label.clone();
        thread::Builder::new()
            .name(format!("{}-wait", config.label))
            .spawn(move || {
                let code = match child.wait() {
                    Ok(status) => status.exit_code() as i32,
                    Err(e) => {
                        warn!(session_id = %waiter_label, error = %e, "Failed to wait for PTY child");
                        -1
                    }
                };
                debug!(session_id = %waiter_label, exit_code = code, "PTY child exited");
                output.record_exit(code);
            })?;

        Ok(Self {
            master: Mutex::new(pair.master),
            writer: Arc::new(Mutex::new(writer)),
            killer: Mutex::new(killer),
            pid,
            label: config.label,
        })
    }

    /// OS process id of the child, when the platform reports one.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Shared handle to the PTY input stream.
    pub fn writer(&self) -> Arc<Mutex<Box<dyn Write + Send>>> {
        Arc::clone(&self.writer)
    }

    /// Resize the PTY.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        self.master
            .lock()
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| TerminalError::pty(e.to_string()))
    }

    /// Kill the child and every process in its terminal session.
    ///
    /// Background jobs of an interactive shell sit in their own process
    /// groups, so signalling the child's group alone is not enough.
    pub fn kill(&self) -> Result<()> {
        // The child leads its own session, so its pid is also the session id.
        #[cfg(unix)]
        if let Some(pid) = self.pid {
            kill_session_members(pid);
            crate::executor::kill_process_group(pid);
        }

        let result = self.killer.lock().kill();

        match result {
            Ok(()) => Ok(()),
            // already gone
            Err(e) if e.kind() == io::ErrorKind::InvalidInput || is_no_such_process(&e) => Ok(()),
            Err(e) => {
                warn!(session_id = %self.label, error = %e, "Failed to kill PTY child");
                Err(e.into())
            }
        }
    }

    /// Kill processes still holding the terminal after the child itself exited.
    pub fn kill_stragglers(&self) {
        #[cfg(unix)]
        if let Some(pid) = self.pid {
            kill_session_members(pid);
        }
    }
}

/// SIGKILL every process whose session id is `leader`.
#[cfg(target_os = "linux")]
fn kill_session_members(leader: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::{getsid, Pid};

    let Ok(raw) = i32::try_from(leader) else {
        return;
    };
    let leader = Pid::from_raw(raw);
    let entries = match std::fs::read_dir("/proc") {
        Ok(entries) => entries,
        Err(e) => {
            debug!(error = %e, "Cannot scan /proc for session members");
            return;
        }
    };

    for entry in entries.flatten() {
        let Some(pid) = entry.file_name().to_str().and_then(|n| n.parse::<i32>().ok()) else {
            continue;
        };
        let pid = Pid::from_raw(pid);
        if getsid(Some(pid)) != Ok(leader) {
            continue;
        }
        match kill(pid, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => debug!(pid = pid.as_raw(), error = %e, "Failed to kill session member"),
        }
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
fn kill_session_members(_leader: u32) {}

#[cfg(unix)]
fn is_no_such_process(e: &io::Error) -> bool {
    e.raw_os_error() == Some(nix::errno::Errno::ESRCH as i32)
}

#[cfg(not(unix))]
fn is_no_such_process(_e: &io::Error) -> bool {
    false
}

/// Write and flush through a shared PTY writer.
pub(crate) fn write_all(writer: &Mutex<Box<dyn Write + Send>>, data: &[u8]) -> io::Result<()> {
    let mut writer = writer.lock();
    writer.write_all(data)?;
    writer.flush()
}

impl std::fmt::Debug for PtyProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyProcess")
            .field("label", &self.label)
            .field("pid", &self.pid)
            .finish()
    }
}
