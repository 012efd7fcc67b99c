//! The synchronization core: one owner for every piece of live state.
//!
//! `SyncCore` classifies inbound frames, routes them to the progress
//! aggregator, error center and activity feed, drives the connection state
//! machine, and folds outbound call outcomes back in. Every method runs to
//! completion before the next one is called, so none of it needs locking.

use super::commands::{Command, Effect, Outcome, Request};
use super::queries::{Dashboard, DuplicateView, ReadProjection};
use crate::domain::{
    classify, ActivityFeed, ConnectionAction, ConnectionId, ConnectionManager, ErrorCenter, Event,
    ProgressAggregator, ProgressTransition,
};
use crate::error::Result;

pub const CREATE_FAILED: &str = "Failed to create repository";
pub const DELETE_FAILED: &str = "Failed to delete repository";
pub const UPDATE_FAILED: &str = "Failed to start repository update";
pub const DUPLICATES_FAILED: &str = "Failed to load duplicate groups";
pub const BROWSE_FAILED: &str = "Failed to browse filesystem";

/// Result of routing one classified event
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub kind: String,
    pub repo: Option<String>,
    pub transition: Option<ProgressTransition>,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Default)]
pub struct SyncCore {
    connection: ConnectionManager,
    progress: ProgressAggregator,
    errors: ErrorCenter,
    activity: ActivityFeed,
    projection: ReadProjection,
    torn_down: bool,
}

impl SyncCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn progress(&self) -> &ProgressAggregator {
        &self.progress
    }

    pub fn errors(&self) -> &ErrorCenter {
        &self.errors
    }

    pub fn activity(&self) -> &ActivityFeed {
        &self.activity
    }

    pub fn projection(&self) -> &ReadProjection {
        &self.projection
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Open the push channel and load the repository list
    pub fn start(&mut self) -> Vec<Effect> {
        if self.torn_down {
            return Vec::new();
        }
        let mut effects: Vec<Effect> = self
            .connection
            .start()
            .into_iter()
            .map(Self::connection_effect)
            .collect();
        self.projection.repos_loading = true;
        effects.push(Effect::Call(Request::ListRepos));
        effects
    }

    /// Whether transport events tagged `id` belong to the live connection
    pub fn accepts(&self, id: ConnectionId) -> bool {
        !self.torn_down && self.connection.current_id() == Some(id)
    }

    pub fn on_open(&mut self, id: ConnectionId) -> Vec<Effect> {
        if self.torn_down {
            return Vec::new();
        }
        let effects: Vec<Effect> = self
            .connection
            .on_open(id)
            .into_iter()
            .map(Self::connection_effect)
            .collect();
        if !effects.is_empty() {
            self.projection.repos_loading = true;
        }
        effects
    }

    pub fn on_close(&mut self, id: ConnectionId, now: i64) {
        self.connection.on_close(id, now);
    }

    /// Decode and route one raw frame
    pub fn handle_frame(&mut self, text: &str, now: i64) -> Result<Dispatched> {
        let event = classify(text)?;
        Ok(self.dispatch(event, now))
    }

    /// Route a classified event to every component that cares about it
    pub fn dispatch(&mut self, event: Event, now: i64) -> Dispatched {
        let kind = event.kind().to_string();
        let repo = event.repo().map(str::to_string);
        let mut transition = None;
        let mut effects = Vec::new();

        match &event {
            Event::Progress(update) => {
                transition = Some(self.progress.apply(update.clone()));
            }
            Event::Finished(payload) => {
                self.progress.finish();
                self.projection.repos_loading = true;
                effects.push(Effect::Call(Request::ListRepos));
                if let Some(name) = &payload.repo {
                    if self.projection.is_showing_duplicates_for(name) {
                        effects.push(self.request_duplicates(name.clone()));
                    }
                }
            }
            Event::Error(payload) => {
                self.errors
                    .push(payload.repo.clone(), payload.message.clone(), now);
            }
            Event::Other { .. } => {}
        }

        self.activity.push(event, now);

        Dispatched {
            kind,
            repo,
            transition,
            effects,
        }
    }

    /// Fire whichever timers are due
    pub fn tick(&mut self, now: i64) -> Vec<Effect> {
        self.errors.expire(now);
        self.connection
            .poll(now)
            .into_iter()
            .map(Self::connection_effect)
            .collect()
    }

    /// Earliest pending timer, reconnect or toast
    pub fn next_deadline(&self) -> Option<i64> {
        match (self.connection.next_deadline(), self.errors.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn handle_command(&mut self, command: Command) -> Vec<Effect> {
        if self.torn_down {
            return Vec::new();
        }

        match command {
            Command::RefreshRepos => {
                self.projection.repos_loading = true;
                vec![Effect::Call(Request::ListRepos)]
            }
            Command::CreateRepo(repo) => vec![Effect::Call(Request::CreateRepo(repo))],
            Command::DeleteRepo { name } => vec![Effect::Call(Request::DeleteRepo(name))],
            Command::UpdateRepo { name } => vec![Effect::Call(Request::TriggerUpdate(name))],
            Command::ShowDuplicates { name } => vec![self.request_duplicates(name)],
            Command::CloseDuplicates => {
                self.projection.duplicates = None;
                Vec::new()
            }
            Command::Browse { start } => vec![Effect::Call(Request::Browse(start))],
            Command::CloseBrowser => {
                self.projection.browse = None;
                Vec::new()
            }
            Command::ClickToast => {
                self.errors.click_toast();
                Vec::new()
            }
            Command::DismissToast => {
                self.errors.dismiss_toast();
                Vec::new()
            }
            Command::OpenHistory => {
                self.errors.open_history();
                Vec::new()
            }
            Command::CloseHistory => {
                self.errors.close_history();
                Vec::new()
            }
            Command::ClearErrors => {
                self.errors.clear_all();
                Vec::new()
            }
            Command::DeleteError { id } => {
                self.errors.delete(&id);
                Vec::new()
            }
            Command::Quit => self.teardown(),
        }
    }

    /// Apply the completion of an outbound call. A no-op after teardown.
    pub fn apply_outcome(&mut self, outcome: Outcome, now: i64) -> Vec<Effect> {
        if self.torn_down {
            return Vec::new();
        }

        match outcome {
            Outcome::ReposListed(result) => {
                self.projection.repos_loading = false;
                if let Ok(repos) = result {
                    self.projection.repositories = repos;
                }
                Vec::new()
            }
            Outcome::RepoCreated { name, result } => match result {
                Ok(_) => {
                    self.projection.repos_loading = true;
                    vec![Effect::Call(Request::ListRepos)]
                }
                Err(failure) => {
                    self.errors
                        .push(Some(name), Some(failure.message_or(CREATE_FAILED)), now);
                    Vec::new()
                }
            },
            Outcome::RepoDeleted { name, result } => match result {
                Ok(()) => {
                    self.projection.remove_repository(&name);
                    self.projection.repos_loading = true;
                    vec![Effect::Call(Request::ListRepos)]
                }
                Err(failure) => {
                    self.errors
                        .push(Some(name), Some(failure.message_or(DELETE_FAILED)), now);
                    Vec::new()
                }
            },
            Outcome::UpdateStarted { name, result } => {
                if let Err(failure) = result {
                    self.errors
                        .push(Some(name), Some(failure.message_or(UPDATE_FAILED)), now);
                }
                Vec::new()
            }
            Outcome::DuplicatesLoaded { name, result } => {
                match result {
                    Ok(groups) => {
                        // A response for a repo that is no longer on screen is dropped
                        if let Some(view) = self.projection.duplicates.as_mut() {
                            if view.repo == name {
                                view.groups = groups;
                                view.loading = false;
                            }
                        }
                    }
                    Err(failure) => {
                        if let Some(view) = self.projection.duplicates.as_mut() {
                            if view.repo == name {
                                view.loading = false;
                            }
                        }
                        self.errors.push(
                            Some(name),
                            Some(failure.message_or(DUPLICATES_FAILED)),
                            now,
                        );
                    }
                }
                Vec::new()
            }
            Outcome::Browsed(result) => {
                match result {
                    Ok(listing) => self.projection.browse = Some(listing),
                    Err(message) => {
                        let message = if message.trim().is_empty() {
                            BROWSE_FAILED.to_string()
                        } else {
                            format!("{}: {}", BROWSE_FAILED, message)
                        };
                        self.errors.push(None, Some(message), now);
                    }
                }
                Vec::new()
            }
        }
    }

    /// Stop reconnecting, cancel timers and close the connection
    pub fn teardown(&mut self) -> Vec<Effect> {
        self.torn_down = true;
        self.errors.cancel_timers();
        self.connection
            .teardown()
            .into_iter()
            .map(Self::connection_effect)
            .collect()
    }

    /// Snapshot of everything the UI needs
    pub fn dashboard(&self) -> Dashboard {
        Dashboard {
            connection: self.connection.status(),
            reconnect_attempts: self.connection.attempts(),
            repositories: self.projection.repositories.clone(),
            repos_loading: self.projection.repos_loading,
            duplicates: self.projection.duplicates.clone(),
            browse: self.projection.browse.clone(),
            progress: self.progress.snapshot().cloned(),
            errors: self.errors.records().to_vec(),
            unread_errors: self.errors.unread_count(),
            toast: self.errors.toast_record().cloned(),
            history_open: self.errors.is_history_open(),
            activity: self.activity.entries().cloned().collect(),
        }
    }

    fn request_duplicates(&mut self, name: String) -> Effect {
        self.projection.duplicates = Some(DuplicateView {
            repo: name.clone(),
            groups: Vec::new(),
            loading: true,
        });
        Effect::Call(Request::Duplicates(name))
    }

    fn connection_effect(action: ConnectionAction) -> Effect {
        match action {
            ConnectionAction::Connect(id) => Effect::Connect(id),
            ConnectionAction::Close => Effect::CloseConnection,
            ConnectionAction::RefreshRepositories => Effect::Call(Request::ListRepos),
        }
    }
}
