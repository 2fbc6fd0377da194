use serde::{Deserialize, Serialize};

use crate::exec::{wrapper_is_bold, wrapper_is_italic};
use crate::fragment::{Attrs, Fragment, Leaves, Wrapper};
use crate::range::TextRange;
use crate::style::{
    MAX_FONT_SIZE, MIN_FONT_SIZE, css_color_to_hex, parse_px, px_to_font_bucket, style_value,
};

/// Formatting that applies to a selection, as shown by toolbar buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattingState {
    pub bold: bool,
    pub italic: bool,
    pub link: bool,
    /// Legacy 1-7 scale.
    pub font_size: Option<u8>,
    /// Lowercase `#rrggbb`; `None` for the default (black) colour.
    pub color: Option<String>,
}

/// Style lookup for elements on the ancestor chain. A browser host answers
/// from `getComputedStyle`; headless callers read the inline `style`.
pub trait ComputedStyle {
    fn font_size_px(&self, tag: &str, attrs: &Attrs) -> Option<f32>;
    fn color(&self, tag: &str, attrs: &Attrs) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStyleAttr;

impl ComputedStyle for InlineStyleAttr {
    fn font_size_px(&self, _tag: &str, attrs: &Attrs) -> Option<f32> {
        style_value(attrs, "font-size").and_then(|value| parse_px(&value))
    }

    fn color(&self, _tag: &str, attrs: &Attrs) -> Option<String> {
        style_value(attrs, "color")
    }
}

const DEFAULT_TEXT_COLOR: &str = "#000000";

#[derive(Default)]
struct Resolved {
    link: Option<bool>,
    font_size: Option<u8>,
    color: Option<String>,
}

impl Resolved {
    fn done(&self) -> bool {
        self.link.is_some() && self.font_size.is_some() && self.color.is_some()
    }

    fn visit(&mut self, w: &Wrapper, styles: &dyn ComputedStyle) {
        if self.link.is_none() && w.tag == "a" && w.attrs.contains_key("href") {
            self.link = Some(true);
        }

        if self.font_size.is_none() {
            let legacy = (w.tag == "font")
                .then(|| w.attrs.get("size"))
                .flatten()
                .and_then(|size| size.trim().parse::<u8>().ok())
                .filter(|size| (MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(size));
            self.font_size =
                legacy.or_else(|| styles.font_size_px(&w.tag, &w.attrs).map(px_to_font_bucket));
        }

        if self.color.is_none() {
            let legacy = (w.tag == "font")
                .then(|| w.attrs.get("color"))
                .flatten()
                .and_then(|color| css_color_to_hex(color));
            self.color = legacy
                .or_else(|| {
                    styles
                        .color(&w.tag, &w.attrs)
                        .and_then(|color| css_color_to_hex(&color))
                })
                .filter(|hex| hex != DEFAULT_TEXT_COLOR);
        }
    }
}

impl Fragment {
    pub fn formatting_at(&self, range: TextRange) -> FormattingState {
        self.inspect(range, &InlineStyleAttr)
    }

    /// Derives the formatting state of `range`.
    ///
    /// Bold and italic hold only when every touched text run carries them.
    /// Link, size and colour come from the ancestor chains of the start and
    /// end runs, innermost first; the first match per attribute wins.
    pub fn inspect(&self, range: TextRange, styles: &dyn ComputedStyle) -> FormattingState {
        let text = self.text_content();
        let range = range.clamped(&text);
        let leaves = Leaves::flatten(self);
        let touching = leaves.touching(range);
        let (Some(&first), Some(&last)) = (touching.first(), touching.last()) else {
            return FormattingState::default();
        };

        let bold = touching
            .iter()
            .all(|&ix| leaves.items[ix].stack.iter().any(wrapper_is_bold));
        let italic = touching
            .iter()
            .all(|&ix| leaves.items[ix].stack.iter().any(wrapper_is_italic));

        let mut resolved = Resolved::default();
        let endpoints = if first == last {
            vec![first]
        } else {
            vec![first, last]
        };
        'chains: for ix in endpoints {
            for w in leaves.items[ix].stack.iter().rev() {
                resolved.visit(w, styles);
                if resolved.done() {
                    break 'chains;
                }
            }
        }

        FormattingState {
            bold,
            italic,
            link: resolved.link.unwrap_or(false),
            font_size: resolved.font_size,
            color: resolved.color,
        }
    }

    /// `href` of the innermost link around the start of `range`.
    pub fn link_href(&self, range: TextRange) -> Option<String> {
        let text = self.text_content();
        let leaves = Leaves::flatten(self);
        let first = *leaves.touching(range.clamped(&text)).first()?;
        leaves.items[first]
            .stack
            .iter()
            .rev()
            .find(|w| w.tag == "a")
            .and_then(|w| w.attrs.get("href").cloned())
    }
}
