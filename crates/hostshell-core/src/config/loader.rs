//! Configuration loading and persistence.

use super::{Config, IsolationSetting, LogLevel};
use crate::error::ConfigError;
use crate::{env, paths};
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))?;
        let expanded = paths::expand_tilde(&config.terminal.working_directory.to_string_lossy());
        config.terminal.working_directory = expanded;
        Ok(config)
    }

    /// Save configuration to the default path.
    pub fn save_default(&self) -> Result<(), ConfigError> {
        let path = paths::config_file()?;
        self.save(&path)
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 has no serializer; plain JSON is valid JSON5
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        let terminal = &self.terminal;

        if terminal.default_timeout_secs == 0 {
            errors.push("terminal.default_timeout_secs must be greater than 0".to_string());
        }

        if terminal.max_output_bytes == 0 {
            errors.push("terminal.max_output_bytes must be greater than 0".to_string());
        }

        if terminal.pty.cols == 0 || terminal.pty.rows == 0 {
            errors.push(format!(
                "terminal.pty must have non-zero dimensions, got {}x{}",
                terminal.pty.cols, terminal.pty.rows
            ));
        }

        let wait = &terminal.wait;
        if wait.min_interval_ms == 0 {
            errors.push("terminal.wait.min_interval_ms must be greater than 0".to_string());
        }
        if wait.min_interval_ms > wait.max_interval_ms {
            errors.push(format!(
                "terminal.wait.min_interval_ms ({}) exceeds max_interval_ms ({})",
                wait.min_interval_ms, wait.max_interval_ms
            ));
        }
        if wait.settle_interval_ms > wait.max_interval_ms {
            errors.push(format!(
                "terminal.wait.settle_interval_ms ({}) exceeds max_interval_ms ({})",
                wait.settle_interval_ms, wait.max_interval_ms
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Load configuration from `path` (or the default path), falling back to
    /// defaults when no file exists.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let result = match path {
            Some(p) => Self::load(p),
            None => Self::load_default(),
        };

        match result {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::from_env_defaults()),
            Err(e) => Err(e),
        }
    }

    /// Create a Config from defaults, with environment overrides applied.
    pub fn from_env_defaults() -> Self {
        let mut config = Self::default();

        if let Some(dir) = env::get_var(env::vars::WORKDIR) {
            config.terminal.working_directory = paths::expand_tilde(&dir);
        }
        if let Some(isolation) = env::get_var(env::vars::ISOLATION) {
            match isolation.parse::<IsolationSetting>() {
                Ok(setting) => config.terminal.isolation = setting,
                Err(e) => tracing::warn!("ignoring {}: {}", env::vars::ISOLATION, e),
            }
        }

        config
    }
}

/// Configuration builder for creating configs programmatically.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working directory.
    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.terminal.working_directory = dir.into();
        self
    }

    /// Set the requested isolation.
    pub fn isolation(mut self, isolation: IsolationSetting) -> Self {
        self.config.terminal.isolation = isolation;
        self
    }

    /// Set the captured output bound.
    pub fn max_output_bytes(mut self, bytes: usize) -> Self {
        self.config.terminal.max_output_bytes = bytes;
        self
    }

    /// Set the session startup grace period.
    pub fn startup_grace_ms(mut self, ms: u64) -> Self {
        self.config.terminal.startup_grace_ms = ms;
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Build the config.
    pub fn build(self) -> Config {
        self.config
    }

    /// Validate and build the config, returning an error if validation fails.
    pub fn build_validated(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
