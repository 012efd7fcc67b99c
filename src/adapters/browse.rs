use anyhow::{bail, Context, Result};
use dedupdash_core::domain::DirListing;
use dedupdash_core::ports::DirectoryBrowser;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists local directories so a repository path can be picked instead of typed
pub struct FsDirectoryBrowser {
    show_hidden: bool,
}

impl FsDirectoryBrowser {
    pub fn new() -> Self {
        Self { show_hidden: false }
    }

    pub fn with_hidden(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }

    fn default_start() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
    }

    fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'))
    }
}

impl DirectoryBrowser for FsDirectoryBrowser {
    fn list(&self, start: Option<&Path>) -> Result<DirListing> {
        let path = start.map(Path::to_path_buf).unwrap_or_else(Self::default_start);
        if !path.is_dir() {
            bail!("{} is not a directory", path.display());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&path).min_depth(1).max_depth(1).follow_links(true) {
            // Unreadable children are skipped, not fatal
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_dir() {
                continue;
            }
            if !self.show_hidden && Self::is_hidden(entry.path()) {
                continue;
            }
            entries.push(entry.into_path());
        }
        entries.sort();

        let path = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        let parent = path.parent().map(Path::to_path_buf);
        let entries = entries
            .into_iter()
            .filter_map(|e| e.file_name().map(|name| path.join(name)))
            .collect();

        Ok(DirListing {
            path,
            parent,
            entries,
        })
    }
}

impl Default for FsDirectoryBrowser {
    fn default() -> Self {
        Self::new()
    }
}
