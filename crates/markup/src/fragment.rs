use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::range::{TextRange, clamp_to_char_boundary};

pub type Attrs = BTreeMap<String, String>;

pub(crate) const VOID_TAGS: &[&str] = &["area", "br", "col", "hr", "img", "input", "wbr"];

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Fragment {
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode { text: text.into() })
    }

    pub fn element(tag: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(ElementNode {
            tag: tag.into(),
            attrs: Attrs::default(),
            children,
        })
    }

    pub fn element_with_attrs(
        tag: impl Into<String>,
        attrs: impl IntoIterator<Item = (&'static str, String)>,
        children: Vec<Node>,
    ) -> Self {
        Node::Element(ElementNode {
            tag: tag.into(),
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            children,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementNode {
    pub tag: String,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
}

impl Fragment {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self {
            children: vec![Node::text(text)],
        }
    }

    /// Concatenated text of the fragment. A `<br>` reads as a newline so
    /// offsets stay stable across line breaks.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for leaf in Leaves::flatten(self).items {
            out.push_str(leaf.content.text());
        }
        out
    }

    pub fn text_len(&self) -> usize {
        Leaves::flatten(self)
            .items
            .iter()
            .map(|leaf| leaf.content.len())
            .sum()
    }

    pub fn is_blank(&self) -> bool {
        fn has_image(nodes: &[Node]) -> bool {
            nodes.iter().any(|node| match node {
                Node::Element(el) => el.tag == "img" || has_image(&el.children),
                Node::Text(_) => false,
            })
        }
        self.text_content().trim().is_empty() && !has_image(&self.children)
    }

    pub fn text_in(&self, range: TextRange) -> String {
        let text = self.text_content();
        let range = range.clamped(&text);
        text[range.start..range.end].to_string()
    }

    /// Locates `needle` in the text content, preferring the occurrence whose
    /// start is closest to `near`.
    pub fn find_text(&self, needle: &str, near: usize) -> Option<TextRange> {
        if needle.is_empty() {
            return None;
        }
        let text = self.text_content();
        text.match_indices(needle)
            .map(|(ix, _)| ix)
            .min_by_key(|ix| ix.abs_diff(near))
            .map(|start| TextRange::new(start, start + needle.len()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Leaf {
    pub stack: Vec<Wrapper>,
    pub content: LeafContent,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Wrapper {
    pub id: usize,
    pub tag: String,
    pub attrs: Attrs,
}

impl Wrapper {
    pub fn same_format(&self, other: &Wrapper) -> bool {
        self.tag == other.tag && self.attrs == other.attrs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LeafContent {
    Text(String),
    Void { tag: String, attrs: Attrs },
    /// Stands in for an element with no content so a rebuild keeps it.
    Empty,
}

impl LeafContent {
    pub fn text(&self) -> &str {
        match self {
            LeafContent::Text(text) => text,
            LeafContent::Void { tag, .. } if tag == "br" => "\n",
            LeafContent::Void { .. } | LeafContent::Empty => "",
        }
    }

    pub fn len(&self) -> usize {
        self.text().len()
    }

    pub fn is_text(&self) -> bool {
        matches!(self, LeafContent::Text(_))
    }

    fn into_node(self) -> Option<Node> {
        match self {
            LeafContent::Text(text) => Some(Node::text(text)),
            LeafContent::Void { tag, attrs } => Some(Node::Element(ElementNode {
                tag,
                attrs,
                children: Vec::new(),
            })),
            LeafContent::Empty => None,
        }
    }
}

/// Flat view of a fragment. Every element gets a unique id so the tree can be
/// rebuilt after leaves have been split or had wrappers added and removed.
#[derive(Debug, Clone)]
pub(crate) struct Leaves {
    pub items: Vec<Leaf>,
    next_id: usize,
}

impl Leaves {
    pub fn flatten(fragment: &Fragment) -> Self {
        fn walk(nodes: &[Node], stack: &mut Vec<Wrapper>, next_id: &mut usize, out: &mut Vec<Leaf>) {
            for node in nodes {
                match node {
                    Node::Text(t) => {
                        if !t.text.is_empty() {
                            out.push(Leaf {
                                stack: stack.clone(),
                                content: LeafContent::Text(t.text.clone()),
                            });
                        }
                    }
                    Node::Element(el) if is_void_tag(&el.tag) => out.push(Leaf {
                        stack: stack.clone(),
                        content: LeafContent::Void {
                            tag: el.tag.clone(),
                            attrs: el.attrs.clone(),
                        },
                    }),
                    Node::Element(el) => {
                        stack.push(Wrapper {
                            id: *next_id,
                            tag: el.tag.clone(),
                            attrs: el.attrs.clone(),
                        });
                        *next_id += 1;
                        let before = out.len();
                        walk(&el.children, stack, next_id, out);
                        if out.len() == before {
                            out.push(Leaf {
                                stack: stack.clone(),
                                content: LeafContent::Empty,
                            });
                        }
                        stack.pop();
                    }
                }
            }
        }

        let mut items = Vec::new();
        let mut next_id = 0usize;
        walk(&fragment.children, &mut Vec::new(), &mut next_id, &mut items);
        Self { items, next_id }
    }

    pub fn fresh_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.items.len());
        let mut cursor = 0usize;
        for leaf in &self.items {
            offsets.push(cursor);
            cursor += leaf.content.len();
        }
        offsets
    }

    pub fn split_at(&mut self, at: usize) {
        let mut cursor = 0usize;
        for ix in 0..self.items.len() {
            let len = self.items[ix].content.len();
            if at > cursor && at < cursor + len {
                let LeafContent::Text(text) = &self.items[ix].content else {
                    return;
                };
                let local = clamp_to_char_boundary(text, at - cursor);
                if local == 0 || local == text.len() {
                    return;
                }
                let tail = text[local..].to_string();
                let head = text[..local].to_string();
                let stack = self.items[ix].stack.clone();
                self.items[ix].content = LeafContent::Text(head);
                self.items.insert(
                    ix + 1,
                    Leaf {
                        stack,
                        content: LeafContent::Text(tail),
                    },
                );
                return;
            }
            cursor += len;
        }
    }

    /// Indices of text leaves lying entirely inside `range`. Callers split at
    /// the range bounds first.
    pub fn selected(&self, range: TextRange) -> Vec<usize> {
        self.offsets()
            .into_iter()
            .enumerate()
            .filter(|&(ix, start)| {
                let leaf = &self.items[ix];
                let end = start + leaf.content.len();
                leaf.content.is_text() && start < end && start >= range.start && end <= range.end
            })
            .map(|(ix, _)| ix)
            .collect()
    }

    /// Indices of text leaves overlapping `range`; for a caret, the leaf the
    /// caret sits in (or right after).
    pub fn touching(&self, range: TextRange) -> Vec<usize> {
        let offsets = self.offsets();
        let mut out = Vec::new();
        for (ix, start) in offsets.iter().copied().enumerate() {
            let leaf = &self.items[ix];
            if !leaf.content.is_text() {
                continue;
            }
            let end = start + leaf.content.len();
            let hit = if range.is_collapsed() {
                (start < range.start && range.start <= end) || (start == 0 && range.start == 0)
            } else {
                start < range.end && range.start < end
            };
            if hit {
                out.push(ix);
            }
        }
        out
    }

    pub fn merge_adjacent(&mut self, mergeable: impl Fn(&str) -> bool) {
        for ix in 1..self.items.len() {
            loop {
                let prev = &self.items[ix - 1].stack;
                let cur = &self.items[ix].stack;
                let depth = prev
                    .iter()
                    .zip(cur.iter())
                    .take_while(|(a, b)| a.id == b.id)
                    .count();
                let (Some(a), Some(b)) = (prev.get(depth), cur.get(depth)) else {
                    break;
                };
                if !a.same_format(b) || !mergeable(&a.tag) {
                    break;
                }
                let (to, from) = (a.id, b.id);
                for leaf in self.items[ix..].iter_mut() {
                    match leaf.stack.get_mut(depth) {
                        Some(w) if w.id == from => w.id = to,
                        _ => break,
                    }
                }
            }
        }
    }

    pub fn drop_empty_text(&mut self) {
        self.items
            .retain(|leaf| !matches!(&leaf.content, LeafContent::Text(t) if t.is_empty()));
    }

    pub fn into_fragment(self) -> Fragment {
        fn build(leaves: &[Leaf], depth: usize) -> Vec<Node> {
            let mut out: Vec<Node> = Vec::new();
            let mut ix = 0usize;
            while ix < leaves.len() {
                let leaf = &leaves[ix];
                let Some(wrapper) = leaf.stack.get(depth) else {
                    match (out.last_mut(), leaf.content.clone().into_node()) {
                        (_, None) => {}
                        (Some(Node::Text(prev)), Some(Node::Text(next))) => {
                            prev.text.push_str(&next.text)
                        }
                        (_, Some(node)) => out.push(node),
                    }
                    ix += 1;
                    continue;
                };
                let mut end = ix + 1;
                while end < leaves.len()
                    && leaves[end].stack.get(depth).map(|w| w.id) == Some(wrapper.id)
                {
                    end += 1;
                }
                out.push(Node::Element(ElementNode {
                    tag: wrapper.tag.clone(),
                    attrs: wrapper.attrs.clone(),
                    children: build(&leaves[ix..end], depth + 1),
                }));
                ix = end;
            }
            out
        }

        Fragment {
            children: build(&self.items, 0),
        }
    }
}
