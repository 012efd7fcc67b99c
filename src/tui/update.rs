use super::model::{FormField, TuiModel, ViewMode};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use dedupdash_core::app::Command;
use dedupdash_core::domain::{Codec, NewRepo};

/// Messages that can be sent from the TUI to the dashboard service
#[derive(Debug, Clone, PartialEq)]
pub enum TuiMessage {
    /// Send a command to the dashboard service
    Command(Command),

    /// No action needed
    None,
}

/// The Update function - handles user input and updates the model
pub struct TuiUpdate;

impl TuiUpdate {
    /// Handle a key press and update the model accordingly
    pub fn handle_key(
        model: &mut TuiModel,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<TuiMessage> {
        // An open confirmation takes every key but Ctrl+C
        if model.pending_delete.is_some() {
            if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(Self::quit(model));
            }
            return Self::handle_delete_confirmation(model, key);
        }

        if let Some(msg) = Self::handle_global_keys(model, key, modifiers)? {
            return Ok(msg);
        }

        match &model.mode {
            ViewMode::Repositories => Self::handle_repository_keys(model, key, modifiers),
            ViewMode::Duplicates { .. } => Self::handle_duplicate_keys(model, key),
            ViewMode::AddRepository if model.ui_state.browsing => {
                Self::handle_browser_keys(model, key)
            }
            ViewMode::AddRepository => Self::handle_form_keys(model, key, modifiers),
            ViewMode::ErrorHistory => Self::handle_history_keys(model, key),
            ViewMode::Activity => Self::handle_activity_keys(model, key),
            ViewMode::Help => {
                // Any key exits help
                model.mode = ViewMode::Repositories;
                Ok(TuiMessage::None)
            }
        }
    }

    pub fn handle_resize(model: &mut TuiModel, width: u16, height: u16) -> Result<TuiMessage> {
        model.ui_state.terminal_width = width;
        model.ui_state.terminal_height = height;
        Ok(TuiMessage::None)
    }

    fn quit(model: &mut TuiModel) -> TuiMessage {
        model.should_quit = true;
        TuiMessage::Command(Command::Quit)
    }

    /// Keys that work in any mode
    fn handle_global_keys(
        model: &mut TuiModel,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<Option<TuiMessage>> {
        let typing = model.mode == ViewMode::AddRepository
            && !model.ui_state.browsing
            && model.form.focus.is_text();

        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                Ok(Some(Self::quit(model)))
            }

            KeyCode::Char('?') if !typing && model.mode != ViewMode::Help => {
                model.mode = ViewMode::Help;
                Ok(Some(TuiMessage::None))
            }

            // Toast controls
            KeyCode::Char('x') if !typing && model.dashboard.toast.is_some() => {
                Ok(Some(TuiMessage::Command(Command::DismissToast)))
            }

            KeyCode::Char('e') if !typing && model.mode != ViewMode::ErrorHistory => {
                model.mode = ViewMode::ErrorHistory;
                model.ui_state.error_cursor = 0;
                let command = if model.dashboard.toast.is_some() {
                    Command::ClickToast
                } else {
                    Command::OpenHistory
                };
                Ok(Some(TuiMessage::Command(command)))
            }

            _ => Ok(None),
        }
    }

    fn handle_delete_confirmation(model: &mut TuiModel, key: KeyCode) -> Result<TuiMessage> {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let name = model.pending_delete.take().unwrap_or_default();
                Ok(TuiMessage::Command(Command::DeleteRepo { name }))
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                model.pending_delete = None;
                Ok(TuiMessage::None)
            }
            _ => Ok(TuiMessage::None),
        }
    }

    fn handle_repository_keys(
        model: &mut TuiModel,
        key: KeyCode,
        _modifiers: KeyModifiers,
    ) -> Result<TuiMessage> {
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                model.ui_state.repo_cursor = model.ui_state.repo_cursor.saturating_sub(1);
                Ok(TuiMessage::None)
            }

            KeyCode::Down | KeyCode::Char('j') => {
                if model.ui_state.repo_cursor + 1 < model.dashboard.repositories.len() {
                    model.ui_state.repo_cursor += 1;
                }
                Ok(TuiMessage::None)
            }

            KeyCode::Char('r') => Ok(TuiMessage::Command(Command::RefreshRepos)),

            KeyCode::Char('a') => {
                model.open_form();
                Ok(TuiMessage::None)
            }

            KeyCode::Char('d') => {
                if let Some(repo) = model.selected_repo() {
                    model.pending_delete = Some(repo.name.clone());
                }
                Ok(TuiMessage::None)
            }

            KeyCode::Char('u') => match model.selected_repo() {
                Some(repo) => Ok(TuiMessage::Command(Command::UpdateRepo {
                    name: repo.name.clone(),
                })),
                None => Ok(TuiMessage::None),
            },

            KeyCode::Enter => match model.selected_repo() {
                Some(repo) => {
                    let name = repo.name.clone();
                    model.mode = ViewMode::Duplicates { repo: name.clone() };
                    model.ui_state.scroll_offset = 0;
                    Ok(TuiMessage::Command(Command::ShowDuplicates { name }))
                }
                None => Ok(TuiMessage::None),
            },

            KeyCode::Char('v') => {
                model.mode = ViewMode::Activity;
                model.ui_state.scroll_offset = 0;
                Ok(TuiMessage::None)
            }

            KeyCode::Char('q') | KeyCode::Esc => Ok(Self::quit(model)),

            _ => Ok(TuiMessage::None),
        }
    }

    fn handle_duplicate_keys(model: &mut TuiModel, key: KeyCode) -> Result<TuiMessage> {
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                model.ui_state.scroll_offset = model.ui_state.scroll_offset.saturating_sub(1);
                Ok(TuiMessage::None)
            }

            KeyCode::Down | KeyCode::Char('j') => {
                if model.ui_state.scroll_offset + 1 < model.duplicate_line_count() {
                    model.ui_state.scroll_offset += 1;
                }
                Ok(TuiMessage::None)
            }

            KeyCode::Char('r') => {
                if let ViewMode::Duplicates { repo } = &model.mode {
                    let name = repo.clone();
                    return Ok(TuiMessage::Command(Command::ShowDuplicates { name }));
                }
                Ok(TuiMessage::None)
            }

            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') | KeyCode::Backspace => {
                model.mode = ViewMode::Repositories;
                Ok(TuiMessage::Command(Command::CloseDuplicates))
            }

            _ => Ok(TuiMessage::None),
        }
    }

    fn handle_form_keys(
        model: &mut TuiModel,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<TuiMessage> {
        match key {
            KeyCode::Esc => {
                model.mode = ViewMode::Repositories;
                Ok(TuiMessage::None)
            }

            KeyCode::Tab | KeyCode::Down => {
                model.form.focus = model.form.focus.next();
                Ok(TuiMessage::None)
            }

            KeyCode::BackTab | KeyCode::Up => {
                model.form.focus = model.form.focus.previous();
                Ok(TuiMessage::None)
            }

            KeyCode::Enter => Ok(Self::submit_form(model)),

            // Open the directory picker
            KeyCode::Char('b') if modifiers.contains(KeyModifiers::CONTROL) => {
                Ok(Self::open_browser(model))
            }
            KeyCode::F(2) => Ok(Self::open_browser(model)),

            KeyCode::Char(' ') if !model.form.focus.is_text() => {
                match model.form.focus {
                    FormField::Codec => {
                        model.form.codec = model.form.codec.toggled();
                        if model.form.codec == Codec::Json {
                            model.form.compressed = false;
                        }
                    }
                    FormField::Compressed if model.form.codec == Codec::Messagepack => {
                        model.form.compressed = !model.form.compressed;
                    }
                    _ => {}
                }
                Ok(TuiMessage::None)
            }

            KeyCode::Char(c) => {
                if let Some(text) = model.form.focused_text_mut() {
                    text.push(c);
                    model.form.error = None;
                }
                Ok(TuiMessage::None)
            }

            KeyCode::Backspace => {
                if let Some(text) = model.form.focused_text_mut() {
                    text.pop();
                }
                Ok(TuiMessage::None)
            }

            _ => Ok(TuiMessage::None),
        }
    }

    /// Validation failures stay inline in the form
    fn submit_form(model: &mut TuiModel) -> TuiMessage {
        let form = &model.form;
        match NewRepo::from_form(
            &form.name,
            &form.path,
            &form.indices,
            form.codec,
            form.compressed,
        ) {
            Ok(repo) => {
                model.mode = ViewMode::Repositories;
                TuiMessage::Command(Command::CreateRepo(repo))
            }
            Err(e) => {
                model.form.error = Some(e.to_string());
                TuiMessage::None
            }
        }
    }

    fn open_browser(model: &mut TuiModel) -> TuiMessage {
        model.ui_state.browsing = true;
        model.ui_state.browse_cursor = 0;
        TuiMessage::Command(Command::Browse {
            start: model.form.browse_start(),
        })
    }

    fn handle_browser_keys(model: &mut TuiModel, key: KeyCode) -> Result<TuiMessage> {
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                model.ui_state.browse_cursor = model.ui_state.browse_cursor.saturating_sub(1);
                Ok(TuiMessage::None)
            }

            KeyCode::Down | KeyCode::Char('j') => {
                let len = model
                    .dashboard
                    .browse
                    .as_ref()
                    .map(|b| b.entries.len())
                    .unwrap_or(0);
                if model.ui_state.browse_cursor + 1 < len {
                    model.ui_state.browse_cursor += 1;
                }
                Ok(TuiMessage::None)
            }

            // Descend
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                match model.selected_browse_entry().cloned() {
                    Some(dir) => {
                        model.ui_state.browse_cursor = 0;
                        Ok(TuiMessage::Command(Command::Browse { start: Some(dir) }))
                    }
                    None => Ok(TuiMessage::None),
                }
            }

            // Up one level
            KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => {
                match model.dashboard.browse.as_ref().and_then(|b| b.parent.clone()) {
                    Some(parent) => {
                        model.ui_state.browse_cursor = 0;
                        Ok(TuiMessage::Command(Command::Browse {
                            start: Some(parent),
                        }))
                    }
                    None => Ok(TuiMessage::None),
                }
            }

            // Pick the highlighted directory, or the current one when empty
            KeyCode::Char(' ') | KeyCode::Char('s') => {
                let picked = model
                    .selected_browse_entry()
                    .cloned()
                    .or_else(|| model.dashboard.browse.as_ref().map(|b| b.path.clone()));
                match picked {
                    Some(dir) => {
                        model.form.pick_directory(&dir);
                        model.ui_state.browsing = false;
                        Ok(TuiMessage::Command(Command::CloseBrowser))
                    }
                    None => Ok(TuiMessage::None),
                }
            }

            KeyCode::Esc | KeyCode::Char('q') => {
                model.ui_state.browsing = false;
                Ok(TuiMessage::Command(Command::CloseBrowser))
            }

            _ => Ok(TuiMessage::None),
        }
    }

    fn handle_history_keys(model: &mut TuiModel, key: KeyCode) -> Result<TuiMessage> {
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                model.ui_state.error_cursor = model.ui_state.error_cursor.saturating_sub(1);
                Ok(TuiMessage::None)
            }

            KeyCode::Down | KeyCode::Char('j') => {
                if model.ui_state.error_cursor + 1 < model.dashboard.errors.len() {
                    model.ui_state.error_cursor += 1;
                }
                Ok(TuiMessage::None)
            }

            KeyCode::Char('d') | KeyCode::Delete => match model.selected_error() {
                Some(record) => Ok(TuiMessage::Command(Command::DeleteError {
                    id: record.id.clone(),
                })),
                None => Ok(TuiMessage::None),
            },

            KeyCode::Char('c') => {
                model.ui_state.error_cursor = 0;
                Ok(TuiMessage::Command(Command::ClearErrors))
            }

            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') => {
                model.mode = ViewMode::Repositories;
                Ok(TuiMessage::Command(Command::CloseHistory))
            }

            _ => Ok(TuiMessage::None),
        }
    }

    fn handle_activity_keys(model: &mut TuiModel, key: KeyCode) -> Result<TuiMessage> {
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                model.ui_state.scroll_offset = model.ui_state.scroll_offset.saturating_sub(1);
                Ok(TuiMessage::None)
            }

            KeyCode::Down | KeyCode::Char('j') => {
                if model.ui_state.scroll_offset + 1 < model.dashboard.activity.len() {
                    model.ui_state.scroll_offset += 1;
                }
                Ok(TuiMessage::None)
            }

            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') => {
                model.mode = ViewMode::Repositories;
                Ok(TuiMessage::None)
            }

            _ => Ok(TuiMessage::None),
        }
    }
}
