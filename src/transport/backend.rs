use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::models::Profile;

/// Flags shared by uploads and downloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOptions {
    /// Copy directories recursively
    pub recursive: bool,
    /// Suppress the progress meter
    pub quiet: bool,
}

/// Trait for the remote transport
/// Receives fully resolved profiles; authentication is the transport's concern
pub trait Transport {
    /// Open an interactive shell, returning the session's exit status
    fn open_shell(&self, profile: &Profile) -> Result<i32>;

    /// Run a command remotely, returning its exit status
    fn run_command(&self, profile: &Profile, command: &[String], args: &[String]) -> Result<i32>;

    /// Copy local sources into `dest` on the server
    fn put(&self, profile: &Profile, sources: &[PathBuf], dest: &str, copy: CopyOptions) -> Result<()>;

    /// Copy remote sources into the local `dest`
    fn get(&self, profile: &Profile, sources: &[String], dest: &Path, copy: CopyOptions) -> Result<()>;

    /// Get the transport name (for logging/debugging)
    fn name(&self) -> &'static str;
}
