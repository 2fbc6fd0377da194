//! Lenient HTML fragment reader and `innerHTML`-style writer.
//!
//! Editable roots accept whatever markup the host hands them, so the reader
//! never fails: unknown tags are kept, stray closing tags are dropped and
//! anything left open is closed at the end of input.

use crate::fragment::{Attrs, ElementNode, Fragment, Node, TextNode, is_void_tag};

impl Fragment {
    pub fn parse(html: &str) -> Self {
        Parser::new(html).run()
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_nodes(&self.children, &mut out);
        out
    }
}

struct OpenElement {
    tag: String,
    attrs: Attrs,
    children: Vec<Node>,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    root: Vec<Node>,
    open: Vec<OpenElement>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            root: Vec::new(),
            open: Vec::new(),
        }
    }

    fn run(mut self) -> Fragment {
        while self.pos < self.src.len() {
            let rest = &self.src[self.pos..];
            if rest.starts_with("<!--") {
                self.pos = match rest[4..].find("-->") {
                    Some(end) => self.pos + 4 + end + 3,
                    None => self.src.len(),
                };
            } else if rest.starts_with("</") && starts_tag_name(&rest[2..]) {
                self.close_tag();
            } else if rest.starts_with('<') && starts_tag_name(&rest[1..]) {
                self.open_tag();
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                // Doctype or processing instruction; nothing to keep.
                self.pos = match rest.find('>') {
                    Some(end) => self.pos + end + 1,
                    None => self.src.len(),
                };
            } else {
                self.text();
            }
        }

        while let Some(el) = self.open.pop() {
            self.push_node(Node::Element(ElementNode {
                tag: el.tag,
                attrs: el.attrs,
                children: el.children,
            }));
        }

        Fragment {
            children: self.root,
        }
    }

    fn push_node(&mut self, node: Node) {
        let target = match self.open.last_mut() {
            Some(el) => &mut el.children,
            None => &mut self.root,
        };
        match (target.last_mut(), node) {
            (Some(Node::Text(prev)), Node::Text(next)) => prev.text.push_str(&next.text),
            (_, node) => target.push(node),
        }
    }

    fn text(&mut self) {
        let rest = &self.src[self.pos..];
        // A lone '<' that does not start a tag is literal text.
        let skip = usize::from(rest.starts_with('<'));
        let len = rest[skip..].find('<').map_or(rest.len(), |ix| ix + skip);
        let raw = &rest[..len];
        self.pos += len;
        let text = decode_entities(raw);
        if !text.is_empty() {
            self.push_node(Node::Text(TextNode { text }));
        }
    }

    fn close_tag(&mut self) {
        let rest = &self.src[self.pos + 2..];
        let name_len = tag_name_len(rest);
        let tag = rest[..name_len].to_ascii_lowercase();
        self.pos = match rest.find('>') {
            Some(end) => self.pos + 2 + end + 1,
            None => self.src.len(),
        };

        let Some(depth) = self.open.iter().rposition(|el| el.tag == tag) else {
            return;
        };
        while self.open.len() > depth {
            let Some(el) = self.open.pop() else { break };
            self.push_node(Node::Element(ElementNode {
                tag: el.tag,
                attrs: el.attrs,
                children: el.children,
            }));
        }
    }

    fn open_tag(&mut self) {
        let start = self.pos + 1;
        let name_len = tag_name_len(&self.src[start..]);
        let tag = self.src[start..start + name_len].to_ascii_lowercase();
        self.pos = start + name_len;

        let mut attrs = Attrs::default();
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            let rest = &self.src[self.pos..];
            if rest.is_empty() {
                break;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            let (name, value) = self.attribute();
            let valid = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'));
            if valid {
                attrs.entry(name).or_insert(value);
            }
        }

        if self_closing || is_void_tag(&tag) {
            self.push_node(Node::Element(ElementNode {
                tag,
                attrs,
                children: Vec::new(),
            }));
        } else {
            self.open.push(OpenElement {
                tag,
                attrs,
                children: Vec::new(),
            });
        }
    }

    fn attribute(&mut self) -> (String, String) {
        let rest = &self.src[self.pos..];
        let name_len = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/'))
            .unwrap_or(rest.len())
            .max(rest.chars().next().map_or(0, char::len_utf8));
        let name = rest[..name_len].to_ascii_lowercase();
        self.pos += name_len;
        self.skip_whitespace();

        if !self.src[self.pos..].starts_with('=') {
            return (name, String::new());
        }
        self.pos += 1;
        self.skip_whitespace();

        let rest = &self.src[self.pos..];
        let value = match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                let end = body.find(quote).unwrap_or(body.len());
                self.pos += 1 + end + usize::from(end < body.len());
                &body[..end]
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += end;
                &rest[..end]
            }
        };
        (name, decode_entities(value))
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }
}

fn starts_tag_name(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn tag_name_len(s: &str) -> usize {
    s.find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
        .unwrap_or(s.len())
}

pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &tail[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => {
                    entity[1..].parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            };
            ch.map(|ch| (ch, end))
        });
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(&escape_text(&t.text)),
            Node::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if is_void_tag(&el.tag) {
                    continue;
                }
                write_nodes(&el.children, out);
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}
