//! Interactive PTY sessions.
//!
//! A session moves `starting → running → exited` and stays queryable after
//! exit until [`SessionManager::terminate_session`] removes it. Ids have the
//! form `term-<n>` and are never reused by a manager.

use crate::buffer::OutputBuffer;
use crate::error::TerminalError;
use crate::isolation::IsolationMode;
use crate::pty::{self, PtyConfig, PtyProcess};
use crate::wait::{self, WaitOptions};
use crate::wrapper;
use crate::Result;
use chrono::{DateTime, Utc};
use hostshell_core::config::PtyGeometry;
use hostshell_core::{env, paths};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Prefix of every session id.
pub const SESSION_ID_PREFIX: &str = "term-";

/// Default TERM for interactive sessions.
const SESSION_TERM: &str = "xterm-256color";

/// Options for starting a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Directory relative to the provider root. Defaults to the root.
    pub working_directory: Option<PathBuf>,

    /// Variables overlaid on the inherited environment.
    pub env: HashMap<String, String>,

    /// Terminal columns; the manager default when unset.
    pub cols: Option<u16>,

    /// Terminal rows; the manager default when unset.
    pub rows: Option<u16>,
}

impl SessionOptions {
    /// Set the working directory, relative to the provider root.
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Set an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set terminal size.
    pub fn with_size(mut self, cols: u16, rows: u16) -> Self {
        self.cols = Some(cols);
        self.rows = Some(rows);
        self
    }
}

/// Result of [`SessionManager::collect_output`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedOutput {
    /// Output between the requested position and `new_position`.
    pub output: String,

    /// Cursor to pass as the next `from_position`.
    pub new_position: usize,

    /// Whether the process has exited.
    pub is_complete: bool,

    /// Exit code once the process has exited.
    pub exit_code: Option<i32>,
}

/// Snapshot of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub id: String,
    pub running: bool,
    pub start_time: DateTime<Utc>,
    pub output_length: usize,
    pub exit_code: Option<i32>,
    pub last_output_time: Option<DateTime<Utc>>,
    pub pid: Option<u32>,
}

/// One live interactive subprocess.
#[derive(Debug)]
struct Session {
    id: String,
    start_time: DateTime<Utc>,
    output: Arc<OutputBuffer>,
    process: PtyProcess,
}

impl Session {
    fn status(&self) -> SessionStatus {
        let progress = self.output.progress();
        SessionStatus {
            id: self.id.clone(),
            running: progress.exit_code.is_none(),
            start_time: self.start_time,
            output_length: progress.len,
            exit_code: progress.exit_code,
            last_output_time: progress.last_output_at,
            pid: self.process.pid(),
        }
    }
}

/// Owns every live session of one provider.
///
/// Dropping the manager kills all sessions still running.
pub struct SessionManager {
    root: PathBuf,
    isolation: IsolationMode,
    geometry: PtyGeometry,
    startup_grace: Duration,
    next_id: AtomicU64,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionManager {
    /// Create a manager rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, isolation: IsolationMode) -> Self {
        Self {
            root: root.into(),
            isolation,
            geometry: PtyGeometry::default(),
            startup_grace: Duration::from_millis(100),
            next_id: AtomicU64::new(0),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Set the default terminal size.
    pub fn with_geometry(mut self, geometry: PtyGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Set the delay between spawning a session and returning its id.
    pub fn with_startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    /// Spawn `shell args` in a PTY and return the new session id.
    pub async fn start_session(
        &self,
        shell: &str,
        args: &[String],
        options: &SessionOptions,
    ) -> Result<String> {
        let id = format!(
            "{}{}",
            SESSION_ID_PREFIX,
            self.next_id.fetch_add(1, Ordering::Relaxed) + 1
        );

        let cwd = paths::resolve_against(&self.root, options.working_directory.as_deref());
        let invocation = wrapper::wrap(shell, args, &cwd, self.isolation);

        let mut vars = HashMap::new();
        vars.insert(env::vars::TERM.to_string(), SESSION_TERM.to_string());
        let vars = env::overlay(vars, &options.env);

        let config = PtyConfig::new(invocation.program, &cwd)
            .with_args(invocation.args)
            .with_size(
                options.cols.unwrap_or(self.geometry.cols),
                options.rows.unwrap_or(self.geometry.rows),
            )
            .with_envs(vars)
            .with_label(id.clone());

        let output = Arc::new(OutputBuffer::new());
        let process = PtyProcess::spawn(config, Arc::clone(&output))?;

        debug!(
            session_id = %id,
            shell,
            pid = ?process.pid(),
            cwd = %cwd.display(),
            "Started terminal session"
        );

        let session = Arc::new(Session {
            id: id.clone(),
            start_time: Utc::now(),
            output,
            process,
        });
        self.sessions.write().insert(id.clone(), session);

        // Give the shell a moment to print its prompt.
        if !self.startup_grace.is_zero() {
            tokio::time::sleep(self.startup_grace).await;
        }

        Ok(id)
    }

    /// Write `input` followed by a newline to the session.
    pub async fn send_input(&self, session_id: &str, input: &str) -> Result<()> {
        let session = self.get(session_id)?;

        // Nothing drains the terminal once the process is gone, so a write
        // could block forever on a full buffer.
        let progress = session.output.progress();
        if progress.exit_code.is_some() || progress.stream_closed {
            return Err(TerminalError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("session {} has exited", session_id),
            )));
        }

        let mut data = Vec::with_capacity(input.len() + 1);
        data.extend_from_slice(input.as_bytes());
        data.push(b'\n');

        let writer = session.process.writer();
        tokio::task::spawn_blocking(move || pty::write_all(&writer, &data))
            .await
            .map_err(|e| TerminalError::pty(format!("input writer task failed: {}", e)))??;

        debug!(session_id, bytes = input.len() + 1, "Sent session input");
        Ok(())
    }

    /// Read output from `from_position` once the session has gone quiet.
    pub async fn collect_output(
        &self,
        session_id: &str,
        from_position: usize,
        wait_options: &WaitOptions,
    ) -> Result<CollectedOutput> {
        let session = self.get(session_id)?;

        wait::wait_for_quiescence(&session.output, wait_options).await;

        let slice = session.output.read_from(from_position);
        Ok(CollectedOutput {
            output: slice.text,
            new_position: slice.end,
            is_complete: slice.exit_code.is_some(),
            exit_code: slice.exit_code,
        })
    }

    /// Kill the session's process if it is still running and forget the session.
    ///
    /// Unknown ids are ignored.
    pub fn terminate_session(&self, session_id: &str) {
        let removed = self.sessions.write().remove(session_id);
        if let Some(session) = removed {
            shutdown(&session);
        }
    }

    /// Status of a session, or `None` if it does not exist.
    pub fn get_session_status(&self, session_id: &str) -> Option<SessionStatus> {
        self.sessions.read().get(session_id).map(|s| s.status())
    }

    /// Status of every live session, ordered by id number.
    pub fn list_sessions(&self) -> Vec<SessionStatus> {
        let mut statuses: Vec<SessionStatus> =
            self.sessions.read().values().map(|s| s.status()).collect();
        statuses.sort_by_key(|s| session_number(&s.id));
        statuses
    }

    /// Resize a session's terminal.
    pub fn resize_session(&self, session_id: &str, cols: u16, rows: u16) -> Result<()> {
        let session = self.get(session_id)?;
        session.process.resize(cols, rows)?;
        debug!(session_id, cols, rows, "Resized session");
        Ok(())
    }

    /// Number of sessions currently tracked.
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    fn get(&self, session_id: &str) -> Result<Arc<Session>> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| TerminalError::SessionNotFound(session_id.to_string()))
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        let sessions: Vec<Arc<Session>> =
            self.sessions.get_mut().drain().map(|(_, s)| s).collect();
        for session in &sessions {
            shutdown(session);
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("root", &self.root)
            .field("isolation", &self.isolation)
            .field("sessions", &self.session_count())
            .finish()
    }
}

fn shutdown(session: &Session) {
    let progress = session.output.progress();
    if progress.exit_code.is_none() {
        if let Err(e) = session.process.kill() {
            warn!(session_id = %session.id, error = %e, "Failed to kill session");
        }
    } else if !progress.stream_closed {
        // The child is gone but something it started still holds the terminal.
        session.process.kill_stragglers();
    }
    debug!(session_id = %session.id, "Terminated terminal session");
}

fn session_number(id: &str) -> u64 {
    id.strip_prefix(SESSION_ID_PREFIX)
        .and_then(|n| n.parse().ok())
        .unwrap_or(u64::MAX)
}
