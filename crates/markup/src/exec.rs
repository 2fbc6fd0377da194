use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::MarkupError;
use crate::fragment::{Attrs, Fragment, Leaf, Leaves, Wrapper};
use crate::range::TextRange;
use crate::style::{
    MAX_FONT_SIZE, MIN_FONT_SIZE, css_color_to_hex, is_bold_weight, remove_style_property,
    style_value,
};

/// Inline formatting commands, the counterpart of the host's rich-text
/// `execCommand` primitive scoped to a single editable root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum ExecCommand {
    Bold,
    Italic,
    /// Legacy 1-7 scale.
    FontSize(u8),
    ForeColor(String),
    CreateLink(String),
    Unlink,
    RemoveFormat,
}

impl ExecCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ExecCommand::Bold => "bold",
            ExecCommand::Italic => "italic",
            ExecCommand::FontSize(_) => "fontSize",
            ExecCommand::ForeColor(_) => "foreColor",
            ExecCommand::CreateLink(_) => "createLink",
            ExecCommand::Unlink => "unlink",
            ExecCommand::RemoveFormat => "removeFormat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecEffect {
    pub changed: bool,
    /// Text covered by the wrapper element the command created, if any.
    pub wrapper_range: Option<TextRange>,
}

const INLINE_FORMAT_TAGS: &[&str] = &[
    "a", "b", "big", "code", "em", "font", "i", "mark", "s", "small", "span", "strike", "strong",
    "sub", "sup", "u",
];

pub fn is_inline_format_tag(tag: &str) -> bool {
    INLINE_FORMAT_TAGS.contains(&tag)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Bold,
    Italic,
    FontSize,
    Color,
    Link,
    Any,
}

enum Strip {
    Keep,
    Drop,
    Rewrite(Attrs),
}

pub(crate) fn wrapper_is_bold(w: &Wrapper) -> bool {
    matches!(w.tag.as_str(), "b" | "strong")
        || style_value(&w.attrs, "font-weight").is_some_and(|v| is_bold_weight(&v))
}

pub(crate) fn wrapper_is_italic(w: &Wrapper) -> bool {
    matches!(w.tag.as_str(), "i" | "em")
        || style_value(&w.attrs, "font-style")
            .is_some_and(|v| matches!(v.trim(), "italic" | "oblique"))
}

fn leaf_has(leaf: &Leaf, pred: fn(&Wrapper) -> bool) -> bool {
    leaf.stack.iter().any(pred)
}

/// What happens to one wrapper when `format` is cleared from the text under it.
fn strip_format(w: &Wrapper, format: Format) -> Strip {
    let mut attrs = w.attrs.clone();
    let mut touched = false;

    match format {
        Format::Bold => {
            if matches!(w.tag.as_str(), "b" | "strong") {
                return Strip::Drop;
            }
            if style_value(&attrs, "font-weight").is_some_and(|v| is_bold_weight(&v)) {
                touched |= remove_style_property(&mut attrs, "font-weight");
            }
        }
        Format::Italic => {
            if matches!(w.tag.as_str(), "i" | "em") {
                return Strip::Drop;
            }
            touched |= remove_style_property(&mut attrs, "font-style");
        }
        Format::FontSize => {
            if matches!(w.tag.as_str(), "big" | "small") {
                return Strip::Drop;
            }
            if w.tag == "font" {
                touched |= attrs.remove("size").is_some();
            }
            touched |= remove_style_property(&mut attrs, "font-size");
        }
        Format::Color => {
            if w.tag == "font" {
                touched |= attrs.remove("color").is_some();
            }
            touched |= remove_style_property(&mut attrs, "color");
        }
        Format::Link => {
            if w.tag == "a" {
                return Strip::Drop;
            }
        }
        Format::Any => {
            if w.tag != "a" && w.tag != "span" && is_inline_format_tag(&w.tag) {
                return Strip::Drop;
            }
            for property in ["font-weight", "font-style", "font-size", "color", "text-decoration"] {
                touched |= remove_style_property(&mut attrs, property);
            }
        }
    }

    if !touched {
        return Strip::Keep;
    }
    if matches!(w.tag.as_str(), "span" | "font") && attrs.is_empty() {
        Strip::Drop
    } else {
        Strip::Rewrite(attrs)
    }
}

fn strip_leaves(leaves: &mut Leaves, selected: &[usize], format: Format) {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    for &ix in selected {
        let stack = std::mem::take(&mut leaves.items[ix].stack);
        let mut next = Vec::with_capacity(stack.len());
        for w in stack {
            match strip_format(&w, format) {
                Strip::Keep => next.push(w),
                Strip::Drop => {}
                Strip::Rewrite(attrs) => {
                    let id = match remap.get(&w.id) {
                        Some(id) => *id,
                        None => {
                            let id = leaves.fresh_id();
                            remap.insert(w.id, id);
                            id
                        }
                    };
                    next.push(Wrapper {
                        id,
                        tag: w.tag,
                        attrs,
                    });
                }
            }
        }
        leaves.items[ix].stack = next;
    }
}

#[derive(Clone, Copy)]
enum Placement {
    /// Directly around the text.
    Innermost,
    /// Just inside the nearest block-level ancestor.
    Outermost,
}

fn wrap_leaves(
    leaves: &mut Leaves,
    targets: &[usize],
    tag: &str,
    attrs: Attrs,
    placement: Placement,
) -> Option<TextRange> {
    if targets.is_empty() {
        return None;
    }
    let offsets = leaves.offsets();
    let id = leaves.fresh_id();
    let wrapper = Wrapper {
        id,
        tag: tag.to_string(),
        attrs,
    };

    let mut covered: Option<TextRange> = None;
    for &ix in targets {
        let leaf = &mut leaves.items[ix];
        let at = match placement {
            Placement::Innermost => leaf.stack.len(),
            Placement::Outermost => leaf
                .stack
                .iter()
                .rposition(|w| !is_inline_format_tag(&w.tag))
                .map_or(0, |block| block + 1),
        };
        leaf.stack.insert(at, wrapper.clone());

        let start = offsets[ix];
        let end = start + leaf.content.len();
        covered = Some(match covered {
            None => TextRange::new(start, end),
            Some(range) => TextRange::new(range.start.min(start), range.end.max(end)),
        });
    }
    covered
}

fn toggle(
    leaves: &mut Leaves,
    selected: &[usize],
    format: Format,
    active: fn(&Wrapper) -> bool,
    tag: &str,
) -> Option<TextRange> {
    let all_active = selected.iter().all(|&ix| leaf_has(&leaves.items[ix], active));
    if all_active {
        strip_leaves(leaves, selected, format);
        return None;
    }
    let targets: Vec<usize> = selected
        .iter()
        .copied()
        .filter(|&ix| !leaf_has(&leaves.items[ix], active))
        .collect();
    wrap_leaves(leaves, &targets, tag, Attrs::default(), Placement::Innermost)
}

fn single_attr(name: &str, value: String) -> Attrs {
    let mut attrs = Attrs::default();
    attrs.insert(name.to_string(), value);
    attrs
}

impl Fragment {
    /// Applies `command` to the text covered by `range`. Text content never
    /// changes; only the element structure around it does.
    pub fn exec(
        &mut self,
        command: &ExecCommand,
        range: TextRange,
    ) -> Result<ExecEffect, MarkupError> {
        let text = self.text_content();
        let range = range.clamped(&text);
        if range.is_collapsed() {
            return Err(MarkupError::CollapsedRange {
                offset: range.start,
            });
        }

        // Validate arguments before touching the tree.
        let command = match command {
            ExecCommand::FontSize(size) if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(size) => {
                return Err(MarkupError::FontSizeOutOfScale(*size));
            }
            ExecCommand::ForeColor(color) => match css_color_to_hex(color) {
                Some(hex) => ExecCommand::ForeColor(hex),
                None => return Err(MarkupError::InvalidColor(color.clone())),
            },
            ExecCommand::CreateLink(url) if url.trim().is_empty() => ExecCommand::Unlink,
            ExecCommand::CreateLink(url) => ExecCommand::CreateLink(url.trim().to_string()),
            other => other.clone(),
        };

        let before = self.to_html();
        let mut leaves = Leaves::flatten(self);
        leaves.split_at(range.start);
        leaves.split_at(range.end);
        let selected = leaves.selected(range);

        let wrapper_range = match &command {
            ExecCommand::Bold => toggle(&mut leaves, &selected, Format::Bold, wrapper_is_bold, "b"),
            ExecCommand::Italic => {
                toggle(&mut leaves, &selected, Format::Italic, wrapper_is_italic, "i")
            }
            ExecCommand::FontSize(size) => {
                strip_leaves(&mut leaves, &selected, Format::FontSize);
                wrap_leaves(
                    &mut leaves,
                    &selected,
                    "font",
                    single_attr("size", size.to_string()),
                    Placement::Innermost,
                )
            }
            ExecCommand::ForeColor(hex) => {
                strip_leaves(&mut leaves, &selected, Format::Color);
                wrap_leaves(
                    &mut leaves,
                    &selected,
                    "font",
                    single_attr("color", hex.clone()),
                    Placement::Innermost,
                )
            }
            ExecCommand::CreateLink(url) => {
                strip_leaves(&mut leaves, &selected, Format::Link);
                wrap_leaves(
                    &mut leaves,
                    &selected,
                    "a",
                    single_attr("href", url.clone()),
                    Placement::Outermost,
                )
            }
            ExecCommand::Unlink => {
                strip_leaves(&mut leaves, &selected, Format::Link);
                None
            }
            ExecCommand::RemoveFormat => {
                strip_leaves(&mut leaves, &selected, Format::Any);
                None
            }
        };

        leaves.drop_empty_text();
        leaves.merge_adjacent(is_inline_format_tag);
        *self = leaves.into_fragment();

        let changed = self.to_html() != before;
        tracing::trace!(command = command.name(), ?range, changed, "exec");
        Ok(ExecEffect {
            changed,
            wrapper_range,
        })
    }
}
