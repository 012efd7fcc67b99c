//! Key presses through the TUI update loop into the sync core and back out
//! as rendered frames, with the network replaced by hand-fed outcomes.

use crossterm::event::{KeyCode, KeyModifiers};
use dedupdash::tui::{TuiMessage, TuiModel, TuiUpdate, TuiView, ViewMode};
use dedupdash_core::app::{Effect, Outcome, Request, SyncCore};
use dedupdash_core::domain::{Codec, RepoDescriptor};
use dedupdash_core::ports::ApiFailure;
use ratatui::{backend::TestBackend, Terminal};

struct Harness {
    core: SyncCore,
    model: TuiModel,
    now: i64,
}

impl Harness {
    fn started() -> (Self, Vec<Effect>) {
        let mut core = SyncCore::new();
        let effects = core.start();
        let mut harness = Self {
            core,
            model: TuiModel::new(),
            now: 1_000,
        };
        harness.publish();
        (harness, effects)
    }

    fn publish(&mut self) {
        self.model.apply_dashboard(self.core.dashboard());
    }

    fn press(&mut self, key: KeyCode) -> Vec<Effect> {
        self.press_with(key, KeyModifiers::NONE)
    }

    fn press_with(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Vec<Effect> {
        let effects = match TuiUpdate::handle_key(&mut self.model, key, modifiers).unwrap() {
            TuiMessage::Command(cmd) => self.core.handle_command(cmd),
            TuiMessage::None => Vec::new(),
        };
        self.publish();
        effects
    }

    fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyCode::Char(c));
        }
    }

    fn complete(&mut self, outcome: Outcome) -> Vec<Effect> {
        let effects = self.core.apply_outcome(outcome, self.now);
        self.publish();
        effects
    }

    fn frame(&mut self, text: &str) {
        self.core.handle_frame(text, self.now).unwrap();
        self.publish();
    }

    fn screen(&self) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|frame| TuiView::render(&self.model, frame))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }
}

fn repo(name: &str) -> RepoDescriptor {
    RepoDescriptor {
        name: name.to_string(),
        absolute_path: format!("/data/{}", name),
        indices: 1,
        codec: Codec::Json,
        compressed: false,
        stats: None,
    }
}

#[test]
fn test_startup_lists_repositories() {
    let (mut harness, effects) = Harness::started();
    assert!(effects.contains(&Effect::Call(Request::ListRepos)));
    assert!(harness.screen().contains("Loading repositories"));

    harness.complete(Outcome::ReposListed(Ok(vec![repo("music"), repo("photos")])));
    let screen = harness.screen();
    assert!(screen.contains("music"));
    assert!(screen.contains("photos"));
}

#[test]
fn test_failed_create_surfaces_toast_then_history() {
    let (mut harness, _) = Harness::started();
    harness.complete(Outcome::ReposListed(Ok(vec![repo("music")])));

    harness.press(KeyCode::Char('a'));
    harness.type_text("music");
    harness.press(KeyCode::Tab);
    harness.type_text("/data/music");
    let effects = harness.press(KeyCode::Enter);
    let new_repo = match effects.as_slice() {
        [Effect::Call(Request::CreateRepo(repo))] => repo.clone(),
        other => panic!("expected a create call, got {:?}", other),
    };
    assert_eq!(harness.model.mode, ViewMode::Repositories);

    harness.complete(Outcome::RepoCreated {
        name: new_repo.name,
        result: Err(ApiFailure::new(
            Some(400),
            Some("Repo music already exists".into()),
        )),
    });
    let screen = harness.screen();
    assert!(screen.contains("Repo music already exists"));
    assert!(screen.contains("1 unread errors"));

    // Opening history from the toast marks everything read
    harness.press(KeyCode::Char('e'));
    assert_eq!(harness.model.mode, ViewMode::ErrorHistory);
    assert!(harness.model.dashboard.toast.is_none());
    assert_eq!(harness.model.dashboard.unread_errors, 0);

    harness.press(KeyCode::Char('c'));
    assert!(harness.screen().contains("No errors recorded"));
    harness.press(KeyCode::Esc);
    assert_eq!(harness.model.mode, ViewMode::Repositories);
    assert!(!harness.model.dashboard.history_open);
}

#[test]
fn test_progress_frames_render_and_finish() {
    let (mut harness, _) = Harness::started();
    harness.complete(Outcome::ReposListed(Ok(vec![repo("music")])));

    harness.frame(
        r#"{"type":"progress","payload":{"repo":"music","progressPercent":25,"filesProcessed":5,"filesTotal":20}}"#,
    );
    let screen = harness.screen();
    assert!(screen.contains("Indexing music"));
    assert!(screen.contains("25%"));
    assert!(screen.contains("files 5/20"));

    harness.frame(r#"{"type":"finished","payload":{"repo":"music"}}"#);
    assert!(!harness.screen().contains("Indexing music"));
    assert_eq!(harness.model.dashboard.activity.len(), 2);
}

#[test]
fn test_duplicates_view_round_trip() {
    let (mut harness, _) = Harness::started();
    harness.complete(Outcome::ReposListed(Ok(vec![repo("music")])));

    let effects = harness.press(KeyCode::Enter);
    assert_eq!(
        effects,
        vec![Effect::Call(Request::Duplicates("music".into()))]
    );
    assert!(harness.screen().contains("Loading duplicate groups"));

    harness.complete(Outcome::DuplicatesLoaded {
        name: "music".into(),
        result: Ok(Vec::new()),
    });
    assert!(harness.screen().contains("No duplicates found"));

    harness.press(KeyCode::Char('b'));
    assert_eq!(harness.model.mode, ViewMode::Repositories);
    assert!(harness.model.dashboard.duplicates.is_none());
}

#[test]
fn test_delete_confirmed_refreshes_list() {
    let (mut harness, _) = Harness::started();
    harness.complete(Outcome::ReposListed(Ok(vec![repo("music"), repo("photos")])));

    assert!(harness.press(KeyCode::Char('d')).is_empty());
    assert!(harness.screen().contains("Delete repository 'music'?"));
    let effects = harness.press(KeyCode::Char('y'));
    assert_eq!(
        effects,
        vec![Effect::Call(Request::DeleteRepo("music".into()))]
    );

    let effects = harness.complete(Outcome::RepoDeleted {
        name: "music".into(),
        result: Ok(()),
    });
    assert_eq!(effects, vec![Effect::Call(Request::ListRepos)]);
    assert_eq!(harness.model.dashboard.repositories.len(), 1);
    assert_eq!(harness.model.selected_repo().unwrap().name, "photos");
}

#[test]
fn test_quit_tears_down_core() {
    let (mut harness, _) = Harness::started();
    harness.press(KeyCode::Char('q'));
    assert!(harness.model.should_quit);
    assert!(harness.core.is_torn_down());
    assert!(harness
        .complete(Outcome::ReposListed(Ok(vec![repo("music")])))
        .is_empty());
}
