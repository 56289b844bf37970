//! The terminal provider façade.

use crate::error::TerminalError;
use crate::executor::{CommandExecutor, ExecuteCommandOptions, ExecuteCommandResult};
use crate::isolation::{self, IsolationMode};
use crate::session::{CollectedOutput, SessionManager, SessionOptions, SessionStatus};
use crate::wait::WaitOptions;
use crate::Result;
use hostshell_core::config::TerminalConfig;
use hostshell_core::{paths, ConfigError, Filesystem, LocalFilesystem};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Shell access bounded to one working directory.
///
/// The isolation mode is resolved once at construction. Dropping the provider
/// kills every session it still owns.
#[derive(Debug)]
pub struct TerminalProvider {
    root: PathBuf,
    isolation: IsolationMode,
    executor: CommandExecutor,
    sessions: SessionManager,
    wait: WaitOptions,
    default_timeout_secs: u64,
}

impl TerminalProvider {
    /// Build a provider against the local filesystem.
    pub fn new(config: &TerminalConfig) -> Result<Self> {
        Self::with_filesystem(config, &LocalFilesystem)
    }

    /// Build a provider, checking the working directory through `fs`.
    pub fn with_filesystem(config: &TerminalConfig, fs: &dyn Filesystem) -> Result<Self> {
        let root = checked_root(config, fs)?;
        let isolation = isolation::resolve(config.isolation);
        Ok(Self::assemble(config, root, isolation))
    }

    /// Build a provider with an already resolved isolation mode.
    pub fn with_isolation(
        config: &TerminalConfig,
        fs: &dyn Filesystem,
        isolation: IsolationMode,
    ) -> Result<Self> {
        let root = checked_root(config, fs)?;
        Ok(Self::assemble(config, root, isolation))
    }

    fn assemble(config: &TerminalConfig, root: PathBuf, isolation: IsolationMode) -> Self {
        info!(
            root = %root.display(),
            isolation = %isolation,
            "Terminal provider ready"
        );

        let executor = CommandExecutor::new(&root, isolation)
            .with_max_output_bytes(config.max_output_bytes);
        let sessions = SessionManager::new(&root, isolation)
            .with_geometry(config.pty)
            .with_startup_grace(Duration::from_millis(config.startup_grace_ms));

        Self {
            root,
            isolation,
            executor,
            sessions,
            wait: WaitOptions::from(config.wait),
            default_timeout_secs: config.default_timeout_secs,
        }
    }

    /// Absolute root every relative working directory resolves against.
    pub fn working_directory(&self) -> &Path {
        &self.root
    }

    /// The isolation mode chosen at construction.
    pub fn get_isolation_level(&self) -> IsolationMode {
        self.isolation
    }

    /// Quiescence options from configuration.
    pub fn default_wait_options(&self) -> WaitOptions {
        self.wait
    }

    /// Command options carrying the configured timeout.
    pub fn default_command_options(&self) -> ExecuteCommandOptions {
        ExecuteCommandOptions::new(self.default_timeout_secs)
    }

    pub async fn execute_command(
        &self,
        command: &str,
        args: &[String],
        options: &ExecuteCommandOptions,
    ) -> ExecuteCommandResult {
        self.executor.execute_command(command, args, options).await
    }

    pub async fn run_script(
        &self,
        script: &str,
        options: &ExecuteCommandOptions,
    ) -> ExecuteCommandResult {
        self.executor.run_script(script, options).await
    }

    pub async fn start_session(
        &self,
        shell: &str,
        args: &[String],
        options: &SessionOptions,
    ) -> Result<String> {
        self.sessions.start_session(shell, args, options).await
    }

    pub async fn send_input(&self, session_id: &str, input: &str) -> Result<()> {
        self.sessions.send_input(session_id, input).await
    }

    pub async fn collect_output(
        &self,
        session_id: &str,
        from_position: usize,
        wait_options: &WaitOptions,
    ) -> Result<CollectedOutput> {
        self.sessions
            .collect_output(session_id, from_position, wait_options)
            .await
    }

    pub fn terminate_session(&self, session_id: &str) {
        self.sessions.terminate_session(session_id)
    }

    pub fn get_session_status(&self, session_id: &str) -> Option<SessionStatus> {
        self.sessions.get_session_status(session_id)
    }

    pub fn list_sessions(&self) -> Vec<SessionStatus> {
        self.sessions.list_sessions()
    }

    pub fn resize_session(&self, session_id: &str, cols: u16, rows: u16) -> Result<()> {
        self.sessions.resize_session(session_id, cols, rows)
    }
}

fn checked_root(config: &TerminalConfig, fs: &dyn Filesystem) -> Result<PathBuf> {
    let configured = &config.working_directory;
    let root = if configured.is_absolute() {
        paths::resolve_against(configured, None)
    } else {
        paths::resolve_against(&std::env::current_dir()?, Some(configured))
    };

    if !fs.is_dir(&root) {
        return Err(TerminalError::Config(ConfigError::MissingWorkingDirectory(
            root,
        )));
    }
    Ok(root)
}
