mod image;
mod repeatable;
mod text;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::time::Timestamp;

pub use image::{EditableImage, ImageAffordances};
pub use repeatable::{RepeatableField, RepeatableOp};
pub use text::{EditableText, ExternalSync, FieldDisplay};

/// Session-local handle for a mounted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(usize);

impl FieldId {
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field#{}", self.0)
    }
}

/// Element a text field renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTag {
    H1,
    H2,
    H3,
    #[default]
    P,
    Span,
    Button,
    Li,
    Div,
}

impl FieldTag {
    pub fn tag_name(self) -> &'static str {
        match self {
            FieldTag::H1 => "h1",
            FieldTag::H2 => "h2",
            FieldTag::H3 => "h3",
            FieldTag::P => "p",
            FieldTag::Span => "span",
            FieldTag::Button => "button",
            FieldTag::Li => "li",
            FieldTag::Div => "div",
        }
    }
}

/// Declares which store entry a field edits and how it renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinding {
    pub path: String,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub tag: FieldTag,
    #[serde(default)]
    pub disabled: bool,
}

impl FieldBinding {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default_value: String::new(),
            tag: FieldTag::default(),
            disabled: false,
        }
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn tag(mut self, tag: FieldTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// What every field variant shares: a store path, a current value, and a
/// way to take in values that changed elsewhere.
pub trait EditableField {
    fn path(&self) -> &str;
    fn value(&self) -> Value;
    fn is_disabled(&self) -> bool;
    fn receive_external(&mut self, value: &Value, now: Timestamp) -> ExternalSync;
}

pub enum Field {
    Text(EditableText),
    Image(EditableImage),
    Repeatable(RepeatableField),
}

impl Field {
    fn inner(&self) -> &dyn EditableField {
        match self {
            Field::Text(field) => field,
            Field::Image(field) => field,
            Field::Repeatable(field) => field,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn EditableField {
        match self {
            Field::Text(field) => field,
            Field::Image(field) => field,
            Field::Repeatable(field) => field,
        }
    }

    pub fn as_text(&self) -> Option<&EditableText> {
        match self {
            Field::Text(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut EditableText> {
        match self {
            Field::Text(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&EditableImage> {
        match self {
            Field::Image(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut EditableImage> {
        match self {
            Field::Image(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_repeatable(&self) -> Option<&RepeatableField> {
        match self {
            Field::Repeatable(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_repeatable_mut(&mut self) -> Option<&mut RepeatableField> {
        match self {
            Field::Repeatable(field) => Some(field),
            _ => None,
        }
    }
}

impl EditableField for Field {
    fn path(&self) -> &str {
        self.inner().path()
    }

    fn value(&self) -> Value {
        self.inner().value()
    }

    fn is_disabled(&self) -> bool {
        self.inner().is_disabled()
    }

    fn receive_external(&mut self, value: &Value, now: Timestamp) -> ExternalSync {
        self.inner_mut().receive_external(value, now)
    }
}
