//! # hostshell-core
//!
//! Shared configuration and utilities for hostshell.
//!
//! - **Configuration**: JSON5 loading, validation, and persistence
//! - **Paths**: base directory, config file location, working directory resolution
//! - **Environment**: typed accessors and shell selection
//! - **Filesystem**: the path-existence collaborator used at provider construction

pub mod config;
pub mod env;
pub mod error;
pub mod fs;
pub mod paths;

// Re-exports for convenience
pub use config::Config;
pub use error::ConfigError;
pub use fs::{Filesystem, LocalFilesystem};
