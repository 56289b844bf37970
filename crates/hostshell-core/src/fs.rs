//! Filesystem collaborator.
//!
//! The terminal provider only needs to know whether its working directory
//! exists; file CRUD lives with the host's own filesystem provider.

use std::path::Path;

/// Path queries the terminal provider depends on.
pub trait Filesystem: Send + Sync {
    /// Whether `path` exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;
}

/// [`Filesystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
