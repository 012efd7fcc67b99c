use dedupdash_core::app::Dashboard;
use dedupdash_core::domain::{Codec, ErrorRecord, RepoDescriptor};
use std::path::PathBuf;

/// The TUI Model: the latest dashboard snapshot plus UI-local state
#[derive(Debug, Default)]
pub struct TuiModel {
    /// Latest snapshot published by the dashboard service
    pub dashboard: Dashboard,

    /// UI-specific state
    pub ui_state: UiState,

    /// Add-repository form
    pub form: RepoForm,

    /// Current view mode
    pub mode: ViewMode,

    /// Repository awaiting delete confirmation
    pub pending_delete: Option<String>,

    /// Whether the application should quit
    pub should_quit: bool,
}

/// UI-specific state (cursor positions, terminal size, toggles)
#[derive(Debug, Default)]
pub struct UiState {
    /// Selected row in the repository list
    pub repo_cursor: usize,

    /// Selected row in the error history
    pub error_cursor: usize,

    /// Selected row in the directory picker
    pub browse_cursor: usize,

    /// Scroll offset of the duplicates and activity views
    pub scroll_offset: usize,

    /// Directory picker is open over the form
    pub browsing: bool,

    /// Show the activity side panel on the repository list
    pub show_activity: bool,

    pub terminal_width: u16,
    pub terminal_height: u16,
}

/// Different view modes for the TUI
#[derive(Debug, Default, Clone, PartialEq)]
pub enum ViewMode {
    #[default]
    Repositories,

    /// Duplicate groups of one repository
    Duplicates { repo: String },

    /// Add-repository form
    AddRepository,

    ErrorHistory,

    /// Full activity feed
    Activity,

    Help,
}

/// Fields of the add-repository form, in tab order
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    #[default]
    Name,
    Path,
    Indices,
    Codec,
    Compressed,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Name,
        FormField::Path,
        FormField::Indices,
        FormField::Codec,
        FormField::Compressed,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn is_text(self) -> bool {
        matches!(self, FormField::Name | FormField::Path | FormField::Indices)
    }
}

/// Raw add-repository form input. Validation happens on submit.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoForm {
    pub name: String,
    pub path: String,
    pub indices: String,
    pub codec: Codec,
    pub compressed: bool,
    pub focus: FormField,
    /// Inline validation message
    pub error: Option<String>,
}

impl Default for RepoForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            path: String::new(),
            indices: "1".to_string(),
            codec: Codec::Json,
            compressed: false,
            focus: FormField::Name,
            error: None,
        }
    }
}

impl RepoForm {
    /// Text buffer of the focused field, if it is a text field
    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Name => Some(&mut self.name),
            FormField::Path => Some(&mut self.path),
            FormField::Indices => Some(&mut self.indices),
            FormField::Codec | FormField::Compressed => None,
        }
    }

    /// Browsing starts from the typed path when there is one
    pub fn browse_start(&self) -> Option<PathBuf> {
        let path = self.path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }

    /// Picking a directory also suggests a name when none was typed
    pub fn pick_directory(&mut self, dir: &std::path::Path) {
        self.path = dir.display().to_string();
        if self.name.trim().is_empty() {
            if let Some(name) = dir.file_name() {
                self.name = name.to_string_lossy().to_string();
            }
        }
        self.error = None;
    }
}

impl TuiModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activity_panel(mut self, show: bool) -> Self {
        self.ui_state.show_activity = show;
        self
    }

    /// Replace the snapshot and keep UI state consistent with it
    pub fn apply_dashboard(&mut self, dashboard: Dashboard) {
        let had_duplicates = self.dashboard.duplicates.is_some();
        let history_was_open = self.dashboard.history_open;
        self.dashboard = dashboard;

        // History can be opened from the toast as well as from a key
        if self.dashboard.history_open && !history_was_open && self.mode != ViewMode::ErrorHistory {
            self.mode = ViewMode::ErrorHistory;
            self.ui_state.error_cursor = 0;
        }

        if let ViewMode::Duplicates { repo } = &self.mode {
            let showing = self.dashboard.duplicates.as_ref().map(|d| &d.repo) == Some(repo);
            if had_duplicates && !showing {
                // Repository was deleted out from under the view
                self.mode = ViewMode::Repositories;
            }
        }

        if matches!(self.mode, ViewMode::Duplicates { .. }) {
            self.ui_state.scroll_offset =
                clamp_cursor(self.ui_state.scroll_offset, self.duplicate_line_count());
        }

        self.ui_state.repo_cursor = clamp_cursor(
            self.ui_state.repo_cursor,
            self.dashboard.repositories.len(),
        );
        self.ui_state.error_cursor =
            clamp_cursor(self.ui_state.error_cursor, self.dashboard.errors.len());
        let browse_len = self
            .dashboard
            .browse
            .as_ref()
            .map(|b| b.entries.len())
            .unwrap_or(0);
        self.ui_state.browse_cursor = clamp_cursor(self.ui_state.browse_cursor, browse_len);

        if let Some(name) = &self.pending_delete {
            if !self.dashboard.repositories.iter().any(|r| &r.name == name) {
                self.pending_delete = None;
            }
        }
    }

    pub fn selected_repo(&self) -> Option<&RepoDescriptor> {
        self.dashboard.repositories.get(self.ui_state.repo_cursor)
    }

    pub fn selected_error(&self) -> Option<&ErrorRecord> {
        self.dashboard.errors.get(self.ui_state.error_cursor)
    }

    pub fn selected_browse_entry(&self) -> Option<&PathBuf> {
        self.dashboard
            .browse
            .as_ref()
            .and_then(|b| b.entries.get(self.ui_state.browse_cursor))
    }

    /// Lines the duplicates view renders for the shown groups: a summary and
    /// a blank line, then a header plus one line per file for each group
    pub fn duplicate_line_count(&self) -> usize {
        match &self.dashboard.duplicates {
            Some(view) if !view.loading && !view.groups.is_empty() => {
                2 + view
                    .groups
                    .iter()
                    .filter(|group| !group.is_empty())
                    .map(|group| 1 + group.len())
                    .sum::<usize>()
            }
            _ => 0,
        }
    }

    /// Start a fresh add-repository form
    pub fn open_form(&mut self) {
        self.form = RepoForm::default();
        self.ui_state.browsing = false;
        self.mode = ViewMode::AddRepository;
    }
}

fn clamp_cursor(cursor: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        cursor.min(len - 1)
    }
}
