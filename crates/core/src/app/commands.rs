use std::path::PathBuf;

use crate::domain::connection::ConnectionId;
use crate::domain::notifications::ErrorId;
use crate::domain::repo::{DirListing, DuplicateGroup, NewRepo, RepoDescriptor};
use crate::ports::api::ApiResult;

/// Commands that can be sent to the dashboard service
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Reload the repository list
    RefreshRepos,

    /// Register a new repository
    CreateRepo(NewRepo),

    /// Unregister a repository
    DeleteRepo { name: String },

    /// Start a background re-index of a repository
    UpdateRepo { name: String },

    /// Load and show duplicate groups for a repository
    ShowDuplicates { name: String },

    /// Leave the duplicate groups view
    CloseDuplicates,

    /// List directories to pick a repository path from
    Browse { start: Option<PathBuf> },

    /// Leave the directory browser
    CloseBrowser,

    /// Toast body clicked: open history
    ClickToast,

    /// Toast dismiss control
    DismissToast,

    OpenHistory,

    CloseHistory,

    /// Empty the error history
    ClearErrors,

    /// Remove a single error record
    DeleteError { id: ErrorId },

    /// Quit the application
    Quit,
}

/// Outbound calls the service should perform on the core's behalf
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ListRepos,
    CreateRepo(NewRepo),
    DeleteRepo(String),
    TriggerUpdate(String),
    Duplicates(String),
    Browse(Option<PathBuf>),
}

/// Side effects requested by the core
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Connect(ConnectionId),
    CloseConnection,
    Call(Request),
}

/// Completion of an outbound call, fed back into the core
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    ReposListed(ApiResult<Vec<RepoDescriptor>>),
    RepoCreated {
        name: String,
        result: ApiResult<RepoDescriptor>,
    },
    RepoDeleted {
        name: String,
        result: ApiResult<()>,
    },
    UpdateStarted {
        name: String,
        result: ApiResult<()>,
    },
    DuplicatesLoaded {
        name: String,
        result: ApiResult<Vec<DuplicateGroup>>,
    },
    Browsed(std::result::Result<DirListing, String>),
}

impl Outcome {
    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::ReposListed(_) => "list repositories",
            Outcome::RepoCreated { .. } => "create repository",
            Outcome::RepoDeleted { .. } => "delete repository",
            Outcome::UpdateStarted { .. } => "trigger update",
            Outcome::DuplicatesLoaded { .. } => "fetch duplicates",
            Outcome::Browsed(_) => "browse filesystem",
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure_reason().is_some()
    }

    /// Full failure text for logs, including any transport cause
    pub fn failure_reason(&self) -> Option<String> {
        fn reason<T>(result: &ApiResult<T>) -> Option<String> {
            result.as_ref().err().map(ToString::to_string)
        }
        match self {
            Outcome::ReposListed(r) => reason(r),
            Outcome::RepoCreated { result, .. } => reason(result),
            Outcome::RepoDeleted { result, .. } => reason(result),
            Outcome::UpdateStarted { result, .. } => reason(result),
            Outcome::DuplicatesLoaded { result, .. } => reason(result),
            Outcome::Browsed(r) => r.as_ref().err().cloned(),
        }
    }
}
