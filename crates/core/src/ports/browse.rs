use crate::domain::repo::DirListing;
use anyhow::Result;
use std::path::Path;

/// Port for picking a directory to register as a repository
pub trait DirectoryBrowser: Send + Sync {
    /// List subdirectories of `start`, or of a default location when `None`.
    /// This is blocking - caller should run in spawn_blocking
    fn list(&self, start: Option<&Path>) -> Result<DirListing>;
}
