use std::time::Duration;

use folio_editor::{
    AutosaveNotice, ContentBackend, ContentMap, EditorConfig, EditorSession, FieldBinding,
    MemoryBackend, OwnerId, SaveError, SaveStatus, Saver, StaticAuth, Timestamp,
};
use serde_json::json;

const THEME: &str = "studio";

fn owner() -> OwnerId {
    OwnerId::new("owner-1")
}

fn session_with(content: serde_json::Value) -> EditorSession<MemoryBackend, StaticAuth> {
    let content: ContentMap = serde_json::from_value(content).unwrap();
    let backend = MemoryBackend::new().with_content(&owner(), THEME, content, None);
    let saver = Saver::new(backend, StaticAuth::signed_in(owner()), THEME);
    let mut session = EditorSession::new(EditorConfig::default(), saver);
    session.load().unwrap();
    session.set_edit_mode(true);
    session
}

fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

fn save_calls(session: &EditorSession<MemoryBackend, StaticAuth>) -> usize {
    session.saver().backend().save_calls()
}

#[test]
fn saving_the_same_map_twice_is_idempotent() {
    let mut backend = MemoryBackend::new();
    let content: ContentMap = serde_json::from_value(json!({ "hero.title": "Hi" })).unwrap();

    backend.save_content(&owner(), THEME, &content).unwrap();
    let once = backend.stored(&owner(), THEME).cloned();
    backend.save_content(&owner(), THEME, &content).unwrap();

    assert_eq!(backend.stored(&owner(), THEME).cloned(), once);
    assert_eq!(backend.save_calls(), 2);
    assert_eq!(backend.writes(), 1);
}

#[test]
fn plain_edit_is_saved_once_after_the_debounce() {
    let mut session = session_with(json!({ "hero.title": "Hello" }));
    let title = session.register_text(FieldBinding::new("hero.title"));

    session.focus(title);
    session.advance_by(ms(500));
    session.input(title, "Hello World");
    session.advance_by(ms(1_000));
    session.blur(title);
    assert_eq!(session.store().get_str("hero.title"), Some("Hello World"));
    assert_eq!(session.status(), SaveStatus::Unsaved);

    session.advance_by(ms(2_999));
    assert_eq!(save_calls(&session), 0);
    session.advance_by(ms(1));
    assert_eq!(save_calls(&session), 1);

    let saved = session.saver().backend().last_saved().unwrap();
    assert_eq!(saved["hero.title"], "Hello World");
    assert_eq!(session.status(), SaveStatus::Saved(Timestamp::from_millis(4_500)));

    session.advance_by(ms(10_000));
    assert_eq!(save_calls(&session), 1);
}

#[test]
fn rapid_edits_coalesce_into_the_last_state() {
    let mut session = session_with(json!({ "hero.title": "" }));
    let title = session.register_text(FieldBinding::new("hero.title"));
    session.focus(title);

    for text in ["H", "He", "Hel", "Hell", "Hello"] {
        session.input(title, text);
        session.advance_by(ms(2_000));
    }
    assert_eq!(save_calls(&session), 0);

    session.advance_by(ms(1_000));
    assert_eq!(save_calls(&session), 1);
    let saved = session.saver().backend().last_saved().unwrap();
    assert_eq!(saved["hero.title"], "Hello");
}

#[test]
fn explicit_save_while_logged_out_never_reaches_the_backend() {
    let saver = Saver::new(MemoryBackend::new(), StaticAuth::anonymous(), THEME);
    let mut session = EditorSession::new(EditorConfig::default(), saver);
    session.set_edit_mode(true);
    assert!(!session.load().unwrap());

    let title = session.register_text(FieldBinding::new("hero.title"));
    session.focus(title);
    session.input(title, "Edited");
    session.blur(title);

    let err = session.save_now().unwrap_err();
    assert_eq!(err, SaveError::Unauthenticated);
    assert_eq!(err.to_string(), "please log in to save your changes");
    assert_eq!(save_calls(&session), 0);
    assert_eq!(session.status(), SaveStatus::LoginRequired);
}

#[test]
fn background_save_while_logged_out_asks_for_login() {
    let saver = Saver::new(MemoryBackend::new(), StaticAuth::anonymous(), THEME);
    let mut session = EditorSession::new(EditorConfig::default(), saver);
    session.set_edit_mode(true);
    let title = session.register_text(FieldBinding::new("hero.title"));

    session.focus(title);
    session.input(title, "Edited");
    session.advance_by(ms(3_000));
    assert_eq!(save_calls(&session), 0);
    assert_eq!(session.status(), SaveStatus::LoginRequired);

    session.saver_mut().auth_mut().sign_in(owner());
    session.save_now().unwrap();
    assert_eq!(save_calls(&session), 1);
    assert!(matches!(session.status(), SaveStatus::Saved(_)));
}

#[test]
fn repeated_background_failures_raise_a_notice() {
    let mut session = session_with(json!({ "hero.title": "Hi" }));
    let title = session.register_text(FieldBinding::new("hero.title"));
    session.saver_mut().backend_mut().fail_next(3);
    session.focus(title);

    for (round, text) in ["a", "b", "c"].into_iter().enumerate() {
        session.input(title, text);
        session.advance_by(ms(3_000));
        if round < 2 {
            assert_eq!(session.notice(), None);
        }
    }
    assert_eq!(save_calls(&session), 3);
    assert_eq!(session.notice(), Some(AutosaveNotice::RepeatedFailures(3)));
    assert_eq!(session.status(), SaveStatus::Unsaved);

    session.input(title, "d");
    session.advance_by(ms(3_000));
    assert_eq!(session.notice(), None);
    assert!(matches!(session.status(), SaveStatus::Saved(_)));
}

#[test]
fn explicit_save_reports_backend_errors() {
    let mut session = session_with(json!({ "hero.title": "Hi" }));
    let title = session.register_text(FieldBinding::new("hero.title"));
    session.focus(title);
    session.input(title, "Hey");
    session.saver_mut().backend_mut().fail_next(1);

    let err = session.save_now().unwrap_err();
    assert!(!err.is_auth());
    assert_eq!(err.to_string(), "failed to save changes: service unavailable");
    assert_eq!(session.status(), SaveStatus::Unsaved);

    session.save_now().unwrap();
    assert_eq!(session.status(), SaveStatus::Saved(Timestamp::ZERO));
    // The debounce was cancelled by the explicit save.
    session.advance_by(ms(5_000));
    assert_eq!(save_calls(&session), 2);
}

#[test]
fn shutdown_drops_the_pending_save() {
    let mut session = session_with(json!({ "hero.title": "Hi" }));
    let title = session.register_text(FieldBinding::new("hero.title"));
    session.focus(title);
    session.input(title, "Bye");

    session.shutdown();
    session.advance_by(ms(10_000));
    assert_eq!(save_calls(&session), 0);
    assert!(!session.is_mounted());
}
