use folio_markup::{ExecCommand, Fragment, MarkupError, TextRange};

#[test]
fn toggle_bold_only_affects_selection_range() {
    let mut fragment = Fragment::parse("Hello world");

    let effect = fragment
        .exec(&ExecCommand::Bold, TextRange::new(6, 11))
        .unwrap();
    assert!(effect.changed);
    assert_eq!(effect.wrapper_range, Some(TextRange::new(6, 11)));
    assert_eq!(fragment.to_html(), "Hello <b>world</b>");

    let effect = fragment
        .exec(&ExecCommand::Bold, TextRange::new(6, 11))
        .unwrap();
    assert!(effect.changed);
    assert_eq!(effect.wrapper_range, None);
    assert_eq!(fragment.to_html(), "Hello world");
}

#[test]
fn unbolding_part_of_a_bold_run_splits_it() {
    let mut fragment = Fragment::parse("<b>Hello world</b>");
    fragment
        .exec(&ExecCommand::Bold, TextRange::new(0, 5))
        .unwrap();
    assert_eq!(fragment.to_html(), "Hello<b> world</b>");

    let mut fragment = Fragment::parse("<strong>abc</strong>");
    fragment
        .exec(&ExecCommand::Bold, TextRange::new(1, 2))
        .unwrap();
    assert_eq!(fragment.to_html(), "<strong>a</strong>b<strong>c</strong>");
}

#[test]
fn bold_over_mixed_selection_merges_into_one_wrapper() {
    let mut fragment = Fragment::parse("a<b>b</b>c");
    let effect = fragment
        .exec(&ExecCommand::Bold, TextRange::new(0, 3))
        .unwrap();
    assert_eq!(fragment.to_html(), "<b>abc</b>");
    assert_eq!(effect.wrapper_range, Some(TextRange::new(0, 3)));
}

#[test]
fn style_attribute_bold_counts_as_bold() {
    let mut fragment = Fragment::parse("<span style=\"font-weight: 700; color: red\">hey</span>");
    assert!(fragment.formatting_at(TextRange::new(0, 3)).bold);

    fragment
        .exec(&ExecCommand::Bold, TextRange::new(0, 3))
        .unwrap();
    assert_eq!(fragment.to_html(), "<span style=\"color: red;\">hey</span>");
    assert!(!fragment.formatting_at(TextRange::new(0, 3)).bold);
}

#[test]
fn italic_nests_inside_existing_bold() {
    let mut fragment = Fragment::parse("<b>bold text</b>");
    fragment
        .exec(&ExecCommand::Italic, TextRange::new(0, 4))
        .unwrap();
    assert_eq!(fragment.to_html(), "<b><i>bold</i> text</b>");

    let state = fragment.formatting_at(TextRange::new(0, 4));
    assert!(state.bold);
    assert!(state.italic);

    let state = fragment.formatting_at(TextRange::new(0, 9));
    assert!(state.bold);
    assert!(!state.italic);
}

#[test]
fn backwards_ranges_are_ordered() {
    let mut fragment = Fragment::parse("Hello world");
    fragment
        .exec(&ExecCommand::Italic, TextRange::new(5, 0))
        .unwrap();
    assert_eq!(fragment.to_html(), "<i>Hello</i> world");
}

#[test]
fn formatting_never_changes_text_content() {
    let mut fragment = Fragment::parse("<div>one <b>two</b></div><div>three<br>four</div>");
    let text = fragment.text_content();
    for command in [
        ExecCommand::Bold,
        ExecCommand::Italic,
        ExecCommand::FontSize(6),
        ExecCommand::ForeColor("#00ff00".into()),
        ExecCommand::CreateLink("https://example.com".into()),
        ExecCommand::RemoveFormat,
        ExecCommand::Unlink,
    ] {
        fragment.exec(&command, TextRange::new(2, 14)).unwrap();
        assert_eq!(fragment.text_content(), text, "{command:?}");
    }
}

#[test]
fn separate_block_elements_are_not_merged() {
    let mut fragment = Fragment::parse("<div>one</div><div>two</div>");
    fragment
        .exec(&ExecCommand::Bold, TextRange::new(0, 5))
        .unwrap();
    assert_eq!(fragment.to_html(), "<div><b>one</b></div><div><b>tw</b>o</div>");
}

#[test]
fn remove_format_strips_inline_styling_but_keeps_links() {
    let mut fragment = Fragment::parse(
        "<a href=\"/x\"><b><font color=\"#ff0000\">go</font></b></a> <i>now</i>",
    );
    fragment
        .exec(&ExecCommand::RemoveFormat, TextRange::new(0, 6))
        .unwrap();
    assert_eq!(fragment.to_html(), "<a href=\"/x\">go</a> now");
}

#[test]
fn collapsed_range_is_rejected() {
    let mut fragment = Fragment::parse("abc");
    assert_eq!(
        fragment.exec(&ExecCommand::Bold, TextRange::caret(1)),
        Err(MarkupError::CollapsedRange { offset: 1 })
    );
    assert_eq!(fragment.to_html(), "abc");
}

#[test]
fn selection_past_the_end_is_clamped() {
    let mut fragment = Fragment::parse("abc");
    fragment
        .exec(&ExecCommand::Bold, TextRange::new(1, 99))
        .unwrap();
    assert_eq!(fragment.to_html(), "a<b>bc</b>");
}

#[test]
fn multibyte_text_splits_on_char_boundaries() {
    let mut fragment = Fragment::parse("café au lait");
    let range = fragment.find_text("café", 0).unwrap();
    fragment.exec(&ExecCommand::Bold, range).unwrap();
    assert_eq!(fragment.to_html(), "<b>café</b> au lait");
}

#[test]
fn empty_elements_outside_the_range_survive_formatting() {
    let mut fragment =
        Fragment::parse("<div>One</div><div></div><span class=\"icon\"></span><div>Two</div>");
    fragment
        .exec(&ExecCommand::Bold, TextRange::new(0, 3))
        .unwrap();
    assert_eq!(
        fragment.to_html(),
        "<div><b>One</b></div><div></div><span class=\"icon\"></span><div>Two</div>"
    );

    let mut fragment = Fragment::parse("<p>a<i></i>b</p><p><span><em></em></span></p>");
    fragment
        .exec(&ExecCommand::Bold, TextRange::new(1, 2))
        .unwrap();
    assert_eq!(
        fragment.to_html(),
        "<p>a<i></i><b>b</b></p><p><span><em></em></span></p>"
    );
}
