use folio_markup::{Fragment, Node, TextRange};

#[test]
fn unclosed_tags_close_at_end_of_input() {
    let fragment = Fragment::parse("<p>Hello <b>world");
    let Node::Element(p) = &fragment.children[0] else {
        panic!("expected paragraph element");
    };
    assert_eq!(p.tag, "p");
    assert_eq!(p.children.len(), 2);
    assert_eq!(fragment.to_html(), "<p>Hello <b>world</b></p>");
}

#[test]
fn stray_closing_tags_are_ignored() {
    let fragment = Fragment::parse("a</i>b");
    assert_eq!(fragment.children, vec![Node::text("ab")]);
}

#[test]
fn closing_an_outer_tag_closes_inner_ones() {
    let fragment = Fragment::parse("<b>x<i>y</b>z");
    assert_eq!(fragment.to_html(), "<b>x<i>y</i></b>z");
}

#[test]
fn void_and_self_closing_tags_have_no_children() {
    let fragment = Fragment::parse("a<br/>b<img src=\"p.png\">c<span/>d");
    assert_eq!(
        fragment.to_html(),
        "a<br>b<img src=\"p.png\">c<span></span>d"
    );
    assert_eq!(fragment.text_content(), "a\nbcd");
}

#[test]
fn comments_and_doctype_are_dropped() {
    let fragment = Fragment::parse("<!doctype html>x<!-- note -->y");
    assert_eq!(fragment.to_html(), "xy");
}

#[test]
fn tag_and_attribute_names_are_lowercased_and_sorted() {
    let fragment = Fragment::parse("<A TARGET='_blank' HREF=\"x\">go</A>");
    assert_eq!(
        fragment.to_html(),
        "<a href=\"x\" target=\"_blank\">go</a>"
    );
}

#[test]
fn entities_survive_a_round_trip() {
    let fragment = Fragment::parse("Tom &amp; Jerry&nbsp;&lt;3");
    assert_eq!(fragment.text_content(), "Tom & Jerry\u{a0}<3");
    assert_eq!(fragment.to_html(), "Tom &amp; Jerry&nbsp;&lt;3");
}

#[test]
fn attribute_values_are_escaped() {
    let fragment = Fragment::parse("<a title='say \"hi\" & go'>x</a>");
    assert_eq!(
        fragment.to_html(),
        "<a title=\"say &quot;hi&quot; &amp; go\">x</a>"
    );
}

#[test]
fn blank_detection() {
    assert!(Fragment::parse("").is_blank());
    assert!(Fragment::parse("  <br> ").is_blank());
    assert!(Fragment::parse("<b> </b>").is_blank());
    assert!(!Fragment::parse("<img src=\"a.png\">").is_blank());
    assert!(!Fragment::parse("x").is_blank());
}

#[test]
fn find_text_prefers_the_nearest_occurrence() {
    let fragment = Fragment::parse("ab <b>ab</b> ab");
    assert_eq!(fragment.find_text("ab", 4), Some(TextRange::new(3, 5)));
    assert_eq!(fragment.find_text("ab", 7), Some(TextRange::new(6, 8)));
    assert_eq!(fragment.find_text("zz", 0), None);
    assert_eq!(fragment.find_text("", 0), None);
}

#[test]
fn text_in_reads_across_elements() {
    let fragment = Fragment::parse("Hello <i>big</i> world");
    assert_eq!(fragment.text_in(TextRange::new(4, 11)), "o big w");
    assert_eq!(fragment.text_in(TextRange::new(11, 4)), "o big w");
}

#[test]
fn fragment_serializes_as_tagged_json() {
    let fragment = Fragment::parse("<b>x</b>");
    let json = serde_json::to_value(&fragment).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "children": [{
                "node": "element",
                "tag": "b",
                "attrs": {},
                "children": [{ "node": "text", "text": "x" }],
            }]
        })
    );
}
