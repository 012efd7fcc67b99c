use crate::domain::{
    ActivityEntry, ConnectionStatus, DirListing, DuplicateGroup, ErrorRecord, ProgressSnapshot,
    RepoDescriptor,
};

/// Duplicate groups shown for one repository
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuplicateView {
    pub repo: String,
    pub groups: Vec<DuplicateGroup>,
    pub loading: bool,
}

impl DuplicateView {
    /// Bytes that could be reclaimed by keeping one file per group
    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups
            .iter()
            .filter_map(|group| {
                let first = group.first()?;
                Some(first.file.size * (group.len() as u64).saturating_sub(1))
            })
            .sum()
    }
}

/// Collaborator-derived state: what the REST API last told us
#[derive(Debug, Default, Clone)]
pub struct ReadProjection {
    pub repositories: Vec<RepoDescriptor>,
    pub repos_loading: bool,
    pub duplicates: Option<DuplicateView>,
    pub browse: Option<DirListing>,
}

impl ReadProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repository(&self, name: &str) -> Option<&RepoDescriptor> {
        self.repositories.iter().find(|r| r.name == name)
    }

    pub fn remove_repository(&mut self, name: &str) {
        self.repositories.retain(|r| r.name != name);
        if self.duplicates.as_ref().is_some_and(|d| d.repo == name) {
            self.duplicates = None;
        }
    }

    pub fn is_showing_duplicates_for(&self, name: &str) -> bool {
        self.duplicates.as_ref().is_some_and(|d| d.repo == name)
    }
}

/// Immutable snapshot of everything the UI renders
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub connection: ConnectionStatus,
    pub reconnect_attempts: u64,
    pub repositories: Vec<RepoDescriptor>,
    pub repos_loading: bool,
    pub duplicates: Option<DuplicateView>,
    pub browse: Option<DirListing>,
    pub progress: Option<ProgressSnapshot>,
    pub errors: Vec<ErrorRecord>,
    pub unread_errors: usize,
    pub toast: Option<ErrorRecord>,
    pub history_open: bool,
    pub activity: Vec<ActivityEntry>,
}
