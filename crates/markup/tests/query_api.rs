use folio_markup::{Attrs, ComputedStyle, FormattingState, Fragment, TextRange};

#[test]
fn colored_text_reports_lower_hex() {
    let fragment = Fragment::parse("plain <font color=\"#FF0000\">red</font>");
    let state = fragment.formatting_at(TextRange::new(6, 9));
    assert_eq!(state.color.as_deref(), Some("#ff0000"));

    let state = fragment.formatting_at(TextRange::new(0, 5));
    assert_eq!(state.color, None);
}

#[test]
fn rgb_style_colors_convert_and_black_means_default() {
    let fragment = Fragment::parse(
        "<span style=\"color: rgb(255, 0, 0)\">red</span><span style=\"color: rgb(0, 0, 0)\">black</span>",
    );
    assert_eq!(
        fragment.formatting_at(TextRange::new(0, 3)).color.as_deref(),
        Some("#ff0000")
    );
    assert_eq!(fragment.formatting_at(TextRange::new(3, 8)).color, None);
}

#[test]
fn pixel_font_sizes_map_to_buckets() {
    let fragment = Fragment::parse(
        "<span style=\"font-size: 20px\">big</span><span style=\"font-size: 9px\">tiny</span>",
    );
    assert_eq!(fragment.formatting_at(TextRange::new(0, 3)).font_size, Some(5));
    assert_eq!(fragment.formatting_at(TextRange::new(3, 7)).font_size, Some(1));
}

#[test]
fn innermost_ancestor_wins() {
    let fragment =
        Fragment::parse("<font size=\"2\" color=\"blue\"><font size=\"6\">x</font></font>");
    let state = fragment.formatting_at(TextRange::new(0, 1));
    assert_eq!(state.font_size, Some(6));
    assert_eq!(state.color.as_deref(), Some("#0000ff"));
}

#[test]
fn end_endpoint_contributes_when_start_has_nothing() {
    let fragment = Fragment::parse("go <a href=\"/x\">there</a>");
    let state = fragment.formatting_at(TextRange::new(0, 8));
    assert!(state.link);
    assert!(!state.bold);
}

#[test]
fn caret_reads_the_run_it_sits_in() {
    let fragment = Fragment::parse("click <b>here</b>");
    assert!(fragment.formatting_at(TextRange::caret(7)).bold);
    assert!(!fragment.formatting_at(TextRange::caret(3)).bold);
    assert!(!fragment.formatting_at(TextRange::caret(0)).bold);
}

#[test]
fn empty_fragment_has_default_state() {
    let fragment = Fragment::parse("");
    assert_eq!(
        fragment.formatting_at(TextRange::caret(0)),
        FormattingState::default()
    );
}

struct FixedStyles;

impl ComputedStyle for FixedStyles {
    fn font_size_px(&self, tag: &str, _attrs: &Attrs) -> Option<f32> {
        (tag == "h2").then_some(30.0)
    }

    fn color(&self, tag: &str, _attrs: &Attrs) -> Option<String> {
        (tag == "em").then(|| "rgba(0, 128, 0, 1)".to_string())
    }
}

#[test]
fn computed_styles_are_consulted_per_ancestor() {
    let fragment = Fragment::parse("<h2>title <em>accent</em></h2>");
    let state = fragment.inspect(TextRange::new(6, 12), &FixedStyles);
    assert_eq!(state.font_size, Some(6));
    assert_eq!(state.color.as_deref(), Some("#008000"));
    assert!(state.italic);
}
