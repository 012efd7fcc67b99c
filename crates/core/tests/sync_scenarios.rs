//! End-to-end scenarios for the synchronization core, driven with simulated time

use dedupdash_core::app::{Command, Effect, Outcome, Request, SyncCore, CREATE_FAILED};
use dedupdash_core::domain::{
    ConnectionId, ConnectionStatus, ProgressTransition, ACTIVITY_CAPACITY, FALLBACK_ERROR_MESSAGE,
    RECONNECT_DELAY_MS, TOAST_LIFETIME_MS,
};
use dedupdash_core::ports::ApiFailure;
use dedupdash_core::{Codec, CoreError, NewRepo, RepoDescriptor};

fn connected_core() -> (SyncCore, ConnectionId) {
    let mut core = SyncCore::new();
    let effects = core.start();
    let id = effects
        .iter()
        .find_map(|e| match e {
            Effect::Connect(id) => Some(*id),
            _ => None,
        })
        .expect("start should request a connection");
    core.on_open(id);
    (core, id)
}

fn frame(core: &mut SyncCore, text: &str, now: i64) {
    core.handle_frame(text, now).expect("frame should decode");
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
fn test_music_progress_scenario() {
    let (mut core, _) = connected_core();
    assert_eq!(core.dashboard().connection, ConnectionStatus::Connected);

    frame(
        &mut core,
        r#"{"type":"progress","payload":{"repo":"music","progressPercent":10,"filesProcessed":5,"filesTotal":50}}"#,
        1,
    );
    frame(
        &mut core,
        r#"{"type":"progress","payload":{"repo":"music","progressPercent":40,"filesProcessed":20}}"#,
        2,
    );

    let snap = core.progress().snapshot().expect("snapshot after progress");
    assert_eq!(snap.progress_percent, Some(40.0));
    assert_eq!(snap.files_processed, Some(20));
    assert_eq!(snap.files_total, Some(50), "carried over from the first event");

    let dispatched = core
        .handle_frame(r#"{"type":"finished","payload":{"repo":"music"}}"#, 3)
        .unwrap();
    assert!(core.progress().snapshot().is_none());
    assert!(dispatched
        .effects
        .contains(&Effect::Call(Request::ListRepos)));
    assert_eq!(core.activity().len(), 3);
}

#[test]
fn test_progress_for_another_repo_replaces_snapshot() {
    let (mut core, _) = connected_core();
    frame(
        &mut core,
        r#"{"type":"progress","payload":{"repo":"music","filesTotal":50,"eta":"3m"}}"#,
        1,
    );
    let dispatched = core
        .handle_frame(
            r#"{"type":"progress","payload":{"repo":"photos","filesProcessed":1}}"#,
            2,
        )
        .unwrap();

    assert_eq!(dispatched.transition, Some(ProgressTransition::Replaced));
    let snap = core.progress().snapshot().unwrap();
    assert_eq!(snap.repo.as_deref(), Some("photos"));
    assert_eq!(snap.files_total, None);
    assert_eq!(snap.eta, None);
}

#[test]
fn test_two_errors_scenario() {
    let (mut core, _) = connected_core();
    frame(
        &mut core,
        r#"{"type":"error","payload":{"repo":"photos","message":"disk unreadable"}}"#,
        10,
    );
    frame(
        &mut core,
        r#"{"type":"error","payload":{"repo":"videos","message":"permission denied"}}"#,
        11,
    );

    let dashboard = core.dashboard();
    assert_eq!(dashboard.errors.len(), 2);
    assert_eq!(dashboard.unread_errors, 2);
    let toast = dashboard.toast.expect("toast is showing");
    assert_eq!(toast.message, "permission denied");
    assert_eq!(toast.repo.as_deref(), Some("videos"));
}

#[test]
fn test_toast_expires_after_lifetime() {
    let (mut core, _) = connected_core();
    frame(&mut core, r#"{"type":"error","payload":{"message":"boom"}}"#, 0);
    assert_eq!(core.next_deadline(), Some(TOAST_LIFETIME_MS));

    core.tick(TOAST_LIFETIME_MS - 1);
    assert!(core.dashboard().toast.is_some());

    core.tick(TOAST_LIFETIME_MS);
    let dashboard = core.dashboard();
    assert!(dashboard.toast.is_none());
    assert_eq!(dashboard.errors.len(), 1);
    assert_eq!(dashboard.unread_errors, 1);
}

#[test]
fn test_reconnect_scenario() {
    let (mut core, id) = connected_core();
    core.on_close(id, 1_000);
    assert_eq!(core.dashboard().connection, ConnectionStatus::Disconnected);
    assert_eq!(core.next_deadline(), Some(1_000 + RECONNECT_DELAY_MS));

    assert!(core.tick(2_999).is_empty());
    let effects = core.tick(3_000);
    assert_eq!(effects, vec![Effect::Connect(ConnectionId(id.0 + 1))]);

    assert!(core.tick(5_000).is_empty());
    assert!(core.tick(50_000).is_empty());
}

#[test]
fn test_frames_from_stale_connection_are_not_accepted() {
    let (mut core, id) = connected_core();
    core.on_close(id, 0);
    core.tick(RECONNECT_DELAY_MS);
    assert!(!core.accepts(id));
    assert!(core.accepts(ConnectionId(id.0 + 1)));
}

#[test]
fn test_reopen_refreshes_repository_list() {
    let (mut core, id) = connected_core();
    core.on_close(id, 0);
    let effects = core.tick(RECONNECT_DELAY_MS);
    let Effect::Connect(next) = effects[0] else {
        panic!("expected reconnect");
    };
    assert_eq!(
        core.on_open(next),
        vec![Effect::Call(Request::ListRepos)]
    );
}

#[test]
fn test_malformed_frame_is_dropped() {
    let (mut core, _) = connected_core();
    let result = core.handle_frame("{not json", 0);
    assert!(matches!(result, Err(CoreError::Frame(_))));
    assert!(core.activity().is_empty());
    assert!(core.errors().is_empty());
}

#[test]
fn test_unknown_event_only_reaches_activity_feed() {
    let (mut core, _) = connected_core();
    let dispatched = core
        .handle_frame(r#"{"type":"scan-started","payload":{"repo":"music"}}"#, 0)
        .unwrap();
    assert_eq!(dispatched.kind, "scan-started");
    assert!(dispatched.effects.is_empty());
    assert_eq!(core.activity().len(), 1);
    assert!(core.progress().snapshot().is_none());
    assert!(core.errors().is_empty());
}

#[test]
fn test_finished_with_ill_typed_payload_still_clears_progress() {
    for finished in [
        r#"{"type":"finished","payload":{"repo":42}}"#,
        r#"{"type":"finished","payload":"music"}"#,
    ] {
        let (mut core, _) = connected_core();
        frame(
            &mut core,
            r#"{"type":"progress","payload":{"repo":"music","filesTotal":50}}"#,
            1,
        );
        let dispatched = core.handle_frame(finished, 2).unwrap();
        assert_eq!(dispatched.kind, "finished");
        assert!(core.progress().snapshot().is_none(), "{}", finished);
        assert!(dispatched.effects.contains(&Effect::Call(Request::ListRepos)));
    }
}

#[test]
fn test_error_with_ill_typed_payload_still_raises_toast() {
    let (mut core, _) = connected_core();
    frame(
        &mut core,
        r#"{"type":"error","payload":{"repo":"music","message":{"code":5}}}"#,
        1,
    );
    frame(&mut core, r#"{"type":"error","payload":"disk unreadable"}"#, 2);

    let dashboard = core.dashboard();
    assert_eq!(dashboard.errors.len(), 2);
    assert_eq!(dashboard.errors[0].message, "disk unreadable");
    assert_eq!(dashboard.errors[1].message, FALLBACK_ERROR_MESSAGE);
    assert_eq!(dashboard.errors[1].repo.as_deref(), Some("music"));
    assert_eq!(dashboard.toast.unwrap().message, "disk unreadable");
    assert_eq!(dashboard.unread_errors, 2);
}

#[test]
fn test_new_repo_progress_with_bad_counter_still_replaces_snapshot() {
    let (mut core, _) = connected_core();
    frame(
        &mut core,
        r#"{"type":"progress","payload":{"repo":"music","filesTotal":50}}"#,
        1,
    );
    let dispatched = core
        .handle_frame(
            r#"{"type":"progress","payload":{"repo":"photos","progressPercent":5,"filesProcessed":-1}}"#,
            2,
        )
        .unwrap();
    assert_eq!(dispatched.transition, Some(ProgressTransition::Replaced));

    let snap = core.progress().snapshot().unwrap();
    assert_eq!(snap.repo.as_deref(), Some("photos"));
    assert_eq!(snap.progress_percent, Some(5.0));
    assert_eq!(snap.files_processed, None);
    assert_eq!(snap.files_total, None, "music counters must not leak");
}

#[test]
fn test_activity_feed_is_bounded() {
    let (mut core, _) = connected_core();
    for n in 0..60 {
        frame(&mut core, &format!(r#"{{"type":"tick","payload":{{"n":{}}}}}"#, n), n);
    }
    let dashboard = core.dashboard();
    assert_eq!(dashboard.activity.len(), ACTIVITY_CAPACITY);
    assert_eq!(dashboard.activity[0].received_at, 59);
    assert_eq!(dashboard.activity[49].received_at, 10);
}

#[test]
fn test_failed_create_surfaces_once_with_server_description() {
    let (mut core, _) = connected_core();
    let new_repo = NewRepo::from_form("music", "/data/music", "1", Codec::Json, false).unwrap();
    let effects = core.handle_command(Command::CreateRepo(new_repo.clone()));
    assert_eq!(effects, vec![Effect::Call(Request::CreateRepo(new_repo))]);

    core.apply_outcome(
        Outcome::RepoCreated {
            name: "music".into(),
            result: Err(ApiFailure::new(Some(400), Some("Repo music already exists".into()))),
        },
        100,
    );
    core.apply_outcome(
        Outcome::RepoCreated {
            name: "photos".into(),
            result: Err(ApiFailure::new(Some(500), None)),
        },
        101,
    );

    let dashboard = core.dashboard();
    assert_eq!(dashboard.errors.len(), 2);
    assert_eq!(dashboard.errors[0].message, CREATE_FAILED);
    assert_eq!(dashboard.errors[1].message, "Repo music already exists");
    assert_eq!(dashboard.toast.unwrap().repo.as_deref(), Some("photos"));
}

#[test]
fn test_successful_create_and_delete_refresh_the_list() {
    let (mut core, _) = connected_core();
    core.apply_outcome(Outcome::ReposListed(Ok(vec![repo("music"), repo("photos")])), 0);

    let effects = core.apply_outcome(
        Outcome::RepoCreated {
            name: "videos".into(),
            result: Ok(repo("videos")),
        },
        1,
    );
    assert_eq!(effects, vec![Effect::Call(Request::ListRepos)]);

    let effects = core.apply_outcome(
        Outcome::RepoDeleted {
            name: "music".into(),
            result: Ok(()),
        },
        2,
    );
    assert_eq!(effects, vec![Effect::Call(Request::ListRepos)]);
    assert!(core.projection().repository("music").is_none());
    assert!(core.errors().is_empty());
}

#[test]
fn test_update_success_waits_for_push_channel() {
    let (mut core, _) = connected_core();
    let effects = core.apply_outcome(
        Outcome::UpdateStarted {
            name: "music".into(),
            result: Ok(()),
        },
        0,
    );
    assert!(effects.is_empty());
    assert!(core.errors().is_empty());
    assert!(core.progress().snapshot().is_none());
}

#[test]
fn test_finished_refetches_visible_duplicates() {
    let (mut core, _) = connected_core();
    core.handle_command(Command::ShowDuplicates {
        name: "music".into(),
    });
    core.apply_outcome(
        Outcome::DuplicatesLoaded {
            name: "music".into(),
            result: Ok(vec![]),
        },
        0,
    );

    let dispatched = core
        .handle_frame(r#"{"type":"finished","payload":{"repo":"music"}}"#, 1)
        .unwrap();
    assert!(dispatched
        .effects
        .contains(&Effect::Call(Request::Duplicates("music".into()))));
    assert!(core.projection().duplicates.as_ref().unwrap().loading);
}

#[test]
fn test_stale_duplicates_response_is_ignored() {
    let (mut core, _) = connected_core();
    core.handle_command(Command::ShowDuplicates {
        name: "photos".into(),
    });
    core.apply_outcome(
        Outcome::DuplicatesLoaded {
            name: "music".into(),
            result: Ok(vec![vec![]]),
        },
        0,
    );
    let view = core.projection().duplicates.clone().unwrap();
    assert_eq!(view.repo, "photos");
    assert!(view.groups.is_empty());
    assert!(view.loading);
}

#[test]
fn test_history_commands() {
    let (mut core, _) = connected_core();
    frame(&mut core, r#"{"type":"error","payload":{"message":"a"}}"#, 0);
    frame(&mut core, r#"{"type":"error","payload":{"message":"b"}}"#, 1);

    core.handle_command(Command::DismissToast);
    assert_eq!(core.dashboard().unread_errors, 2);

    core.handle_command(Command::OpenHistory);
    let dashboard = core.dashboard();
    assert!(dashboard.history_open);
    assert_eq!(dashboard.unread_errors, 0);

    let id = dashboard.errors[0].id.clone();
    core.handle_command(Command::DeleteError { id });
    assert_eq!(core.errors().len(), 1);

    core.handle_command(Command::ClearErrors);
    assert!(core.errors().is_empty());
}

#[test]
fn test_teardown_makes_late_outcomes_no_ops() {
    let (mut core, _) = connected_core();
    frame(&mut core, r#"{"type":"error","payload":{"message":"a"}}"#, 0);

    let effects = core.handle_command(Command::Quit);
    assert_eq!(effects, vec![Effect::CloseConnection]);
    assert!(core.is_torn_down());
    assert_eq!(core.next_deadline(), None, "toast and reconnect timers cancelled");

    let effects = core.apply_outcome(
        Outcome::RepoDeleted {
            name: "music".into(),
            result: Err(ApiFailure::default()),
        },
        1,
    );
    assert!(effects.is_empty());
    assert_eq!(core.errors().len(), 1);
    assert!(core.handle_command(Command::RefreshRepos).is_empty());
    assert!(core.tick(100_000).is_empty());
}
