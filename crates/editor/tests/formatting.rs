use folio_editor::markup::TextRange;
use folio_editor::{
    CommandOutcome, ContentMap, EditorConfig, EditorSession, FieldBinding, FieldId, FieldTag,
    HostSelection, MemoryBackend, OwnerId, Rect, Saver, StaticAuth, ToolbarControl,
};
use serde_json::json;

fn session_with(content: serde_json::Value) -> EditorSession<MemoryBackend, StaticAuth> {
    let owner = OwnerId::new("owner-1");
    let content: ContentMap = serde_json::from_value(content).unwrap();
    let backend = MemoryBackend::new().with_content(&owner, "studio", content, None);
    let saver = Saver::new(backend, StaticAuth::signed_in(owner), "studio");
    let mut session = EditorSession::new(EditorConfig::default(), saver);
    session.load().unwrap();
    session.set_edit_mode(true);
    session
}

fn select(
    session: &mut EditorSession<MemoryBackend, StaticAuth>,
    field: FieldId,
    needle: &str,
) -> TextRange {
    let range = session
        .text(field)
        .unwrap()
        .dom()
        .find_text(needle, 0)
        .unwrap();
    session.select(Some(HostSelection {
        field,
        range,
        bounds: Rect::new(400.0, 300.0, 80.0, 20.0),
    }));
    range
}

fn html(session: &EditorSession<MemoryBackend, StaticAuth>, field: FieldId) -> String {
    session.text(field).unwrap().html().to_string()
}

#[test]
fn bold_wraps_exactly_the_selection_and_toggles_back() {
    let mut session = session_with(json!({ "hero.title": "Make this bold" }));
    let title = session.register_text(FieldBinding::new("hero.title").tag(FieldTag::H1));
    select(&mut session, title, "this");

    let outcome = session.toolbar_mouse_down(ToolbarControl::Bold);
    assert_eq!(
        outcome,
        CommandOutcome::Applied {
            field: title,
            html: "Make <b>this</b> bold".into(),
        }
    );
    assert_eq!(
        session.store().get_str("hero.title"),
        Some("Make <b>this</b> bold")
    );
    assert!(session.toolbar().formatting().bold);

    // The selection survives, so pressing again removes the formatting.
    session.toolbar_mouse_down(ToolbarControl::Bold);
    assert_eq!(html(&session, title), "Make this bold");
    assert!(!session.toolbar().formatting().bold);
}

#[test]
fn commands_only_touch_the_selected_field() {
    let mut session = session_with(json!({
        "hero.title": "Welcome home",
        "hero.subtitle": "Welcome home",
    }));
    let title = session.register_text(FieldBinding::new("hero.title"));
    let subtitle = session.register_text(FieldBinding::new("hero.subtitle"));

    select(&mut session, title, "home");
    session.toolbar_mouse_down(ToolbarControl::Italic);

    assert_eq!(html(&session, title), "Welcome <i>home</i>");
    assert_eq!(html(&session, subtitle), "Welcome home");
    assert_eq!(session.store().get_str("hero.subtitle"), Some("Welcome home"));
}

#[test]
fn colour_is_reported_back_in_lowercase_hex() {
    let mut session = session_with(json!({ "about.body": "red text and plain text" }));
    let body = session.register_text(FieldBinding::new("about.body"));

    select(&mut session, body, "red text");
    session.toolbar_mouse_down(ToolbarControl::Color("#FF0000".into()));
    assert_eq!(
        html(&session, body),
        "<font color=\"#ff0000\">red text</font> and plain text"
    );

    select(&mut session, body, "red");
    assert_eq!(
        session.toolbar().formatting().color.as_deref(),
        Some("#ff0000")
    );

    select(&mut session, body, "plain");
    assert_eq!(session.toolbar().formatting().color, None);
}

#[test]
fn font_size_uses_the_legacy_scale() {
    let mut session = session_with(json!({ "hero.title": "Big news today" }));
    let title = session.register_text(FieldBinding::new("hero.title"));

    select(&mut session, title, "news");
    session.toolbar_mouse_down(ToolbarControl::FontSize(6));
    assert_eq!(html(&session, title), "Big <font size=\"6\">news</font> today");
    assert_eq!(session.toolbar().formatting().font_size, Some(6));

    let outcome = session.toolbar_mouse_down(ToolbarControl::FontSize(9));
    assert!(matches!(outcome, CommandOutcome::Failed { .. }));
    assert_eq!(html(&session, title), "Big <font size=\"6\">news</font> today");
}

#[test]
fn link_toggle_scenario() {
    let mut session = session_with(json!({ "cta.body": "Click here to start" }));
    let body = session.register_text(FieldBinding::new("cta.body"));

    select(&mut session, body, "here");
    assert_eq!(
        session.toolbar_mouse_down(ToolbarControl::Link),
        CommandOutcome::AwaitingLink {
            prefill: String::new()
        }
    );
    assert_eq!(session.toolbar().link_input(), Some(""));

    // Focus moves into the URL input, which clears the document selection.
    session.select(None);
    assert!(session.toolbar().is_visible());

    let outcome = session.submit_link("https://example.com");
    assert!(outcome.is_applied());
    assert_eq!(
        html(&session, body),
        "Click <a href=\"https://example.com\">here</a> to start"
    );
    assert_eq!(session.toolbar().link_input(), None);

    select(&mut session, body, "here");
    assert!(session.toolbar().formatting().link);
    session.toolbar_mouse_down(ToolbarControl::Link);
    assert_eq!(html(&session, body), "Click here to start");
}

#[test]
fn open_link_input_is_prefilled_from_a_linked_selection() {
    let mut session = session_with(json!({
        "cta.body": "Read <a href=\"/docs\">the docs</a> first",
    }));
    let body = session.register_text(FieldBinding::new("cta.body"));

    select(&mut session, body, "Read");
    assert_eq!(
        session.toolbar_mouse_down(ToolbarControl::Link),
        CommandOutcome::AwaitingLink {
            prefill: String::new()
        }
    );

    // With the input already open, a linked selection edits instead of unlinking.
    select(&mut session, body, "the docs");
    assert!(session.toolbar().formatting().link);
    assert_eq!(
        session.toolbar_mouse_down(ToolbarControl::Link),
        CommandOutcome::AwaitingLink {
            prefill: "/docs".into()
        }
    );

    session.submit_link("/guide");
    assert_eq!(
        html(&session, body),
        "Read <a href=\"/guide\">the docs</a> first"
    );
}

#[test]
fn stale_saved_range_is_found_again_by_text() {
    let mut session = session_with(json!({ "hero.title": "Hello world" }));
    let title = session.register_text(FieldBinding::new("hero.title"));

    let range = select(&mut session, title, "world");
    assert_eq!(range, TextRange::new(6, 11));

    session.focus(title);
    session.input(title, "Oh, Hello world");
    session.select(None);

    session.toolbar_mouse_down(ToolbarControl::Bold);
    assert_eq!(html(&session, title), "Oh, Hello <b>world</b>");
}

#[test]
fn nothing_selected_means_nothing_happens() {
    let mut session = session_with(json!({ "hero.title": "Hello" }));
    let title = session.register_text(FieldBinding::new("hero.title"));

    session.select(Some(HostSelection {
        field: title,
        range: TextRange::caret(2),
        bounds: Rect::default(),
    }));
    assert_eq!(
        session.toolbar_mouse_down(ToolbarControl::Bold),
        CommandOutcome::Skipped
    );
    assert_eq!(html(&session, title), "Hello");
    assert!(!session.store().has_unsaved_changes());
}

#[test]
fn undo_and_redo_step_through_formatting() {
    let mut session = session_with(json!({ "hero.title": "Hello world" }));
    let title = session.register_text(FieldBinding::new("hero.title"));

    select(&mut session, title, "Hello");
    session.toolbar_mouse_down(ToolbarControl::Bold);
    select(&mut session, title, "world");
    session.toolbar_mouse_down(ToolbarControl::Italic);
    assert_eq!(html(&session, title), "<b>Hello</b> <i>world</i>");

    session.toolbar_mouse_down(ToolbarControl::Undo);
    assert_eq!(html(&session, title), "<b>Hello</b> world");
    assert_eq!(
        session.store().get_str("hero.title"),
        Some("<b>Hello</b> world")
    );

    session.toolbar_mouse_down(ToolbarControl::Redo);
    assert_eq!(html(&session, title), "<b>Hello</b> <i>world</i>");
    assert_eq!(
        session.toolbar_mouse_down(ToolbarControl::Redo),
        CommandOutcome::Skipped
    );
}

#[test]
fn view_mode_hides_the_toolbar_and_blocks_commands() {
    let mut session = session_with(json!({ "hero.title": "Hello world" }));
    let title = session.register_text(FieldBinding::new("hero.title"));

    select(&mut session, title, "world");
    assert!(session.toolbar().is_visible());

    session.set_edit_mode(false);
    assert!(!session.toolbar().is_visible());
    assert_eq!(
        session.toolbar_mouse_down(ToolbarControl::Bold),
        CommandOutcome::Skipped
    );
    assert_eq!(html(&session, title), "Hello world");
}
