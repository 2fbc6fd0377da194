use folio_markup::{ExecCommand, Fragment, History, TextRange};

#[test]
fn undo_and_redo_walk_snapshots() {
    let mut history = History::default();
    let mut fragment = Fragment::parse("Hello world");

    history.record(fragment.to_html());
    fragment
        .exec(&ExecCommand::Bold, TextRange::new(0, 5))
        .unwrap();
    history.record(fragment.to_html());
    fragment
        .exec(&ExecCommand::Italic, TextRange::new(6, 11))
        .unwrap();
    assert_eq!(fragment.to_html(), "<b>Hello</b> <i>world</i>");

    let previous = history.undo(fragment.to_html()).unwrap();
    assert_eq!(previous, "<b>Hello</b> world");
    fragment = Fragment::parse(&previous);

    let previous = history.undo(fragment.to_html()).unwrap();
    assert_eq!(previous, "Hello world");
    assert!(!history.can_undo());
    fragment = Fragment::parse(&previous);

    let next = history.redo(fragment.to_html()).unwrap();
    assert_eq!(next, "<b>Hello</b> world");
    assert!(history.can_redo());
}

#[test]
fn recording_clears_redo_and_skips_duplicates() {
    let mut history = History::new(2);
    history.record("a");
    history.record("a");
    history.record("b");
    assert_eq!(history.undo("c").as_deref(), Some("b"));
    assert!(history.can_redo());

    history.record("x");
    assert!(!history.can_redo());
}

#[test]
fn history_is_bounded() {
    let mut history = History::new(2);
    history.record("1");
    history.record("2");
    history.record("3");
    assert_eq!(history.undo("4").as_deref(), Some("3"));
    assert_eq!(history.undo("3").as_deref(), Some("2"));
    assert_eq!(history.undo("2"), None);
}
