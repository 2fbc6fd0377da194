use std::time::Duration;

use folio_markup::{
    ExecCommand, ExecEffect, Fragment, History, MarkupError, TextRange, escape_text,
};
use serde_json::Value;

use super::{EditableField, FieldBinding, FieldId};
use crate::config::EditorConfig;
use crate::store::ContentStore;
use crate::time::{Deadline, Timestamp};

const PLACEHOLDER_TEXT: &str = "Click to edit";
const PLACEHOLDER_STYLE: &str = "opacity: 0.5; font-style: italic";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalSync {
    Unchanged,
    /// The user is typing; the live DOM wins.
    Focused,
    /// Echo of the field's own recent write.
    Guarded,
    Scheduled,
    Applied,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDisplay {
    Html(String),
    Placeholder(String),
    Empty,
}

/// While focused the field's DOM is authoritative: every input is written
/// to the store, and values arriving from the store are ignored until blur.
/// An unfocused field adopts external values after a short settling delay,
/// unless the value is just the echo of its own last write.
pub struct EditableText {
    id: FieldId,
    binding: FieldBinding,
    dom: Fragment,
    value: String,
    focused: bool,
    guard_until: Option<Timestamp>,
    pending: Option<String>,
    sync: Deadline,
    history: History,
    guard: Duration,
    sync_delay: Duration,
}

impl EditableText {
    pub fn new(
        id: FieldId,
        binding: FieldBinding,
        initial: Option<&str>,
        config: &EditorConfig,
    ) -> Self {
        let value = initial.unwrap_or_default().to_string();
        Self {
            id,
            binding,
            dom: Fragment::parse(&value),
            value,
            focused: false,
            guard_until: None,
            pending: None,
            sync: Deadline::default(),
            history: History::new(config.max_history),
            guard: config.just_saved_guard(),
            sync_delay: config.external_sync_delay(),
        }
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn binding(&self) -> &FieldBinding {
        &self.binding
    }

    /// Last value written to or adopted from the store.
    pub fn html(&self) -> &str {
        &self.value
    }

    pub fn dom(&self) -> &Fragment {
        &self.dom
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_editable(&self, edit_mode: bool) -> bool {
        edit_mode && !self.binding.disabled
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.sync.at()
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self, store: &mut ContentStore, now: Timestamp) {
        self.focused = false;
        self.write_local(store, now);
    }

    pub fn on_input(&mut self, html: &str, store: &mut ContentStore, now: Timestamp) {
        let before = self.dom.to_html();
        self.dom = Fragment::parse(html);
        if self.dom.to_html() != before {
            self.history.record(before);
        }
        self.write_local(store, now);
    }

    /// Runs a formatting command against the live DOM. The caller follows up
    /// with [`Self::on_formatting_change`] to publish the result.
    pub fn exec(
        &mut self,
        command: &ExecCommand,
        range: TextRange,
    ) -> Result<ExecEffect, MarkupError> {
        let before = self.dom.to_html();
        let effect = self.dom.exec(command, range)?;
        if effect.changed {
            self.history.record(before);
        }
        Ok(effect)
    }

    pub fn on_formatting_change(&mut self, store: &mut ContentStore, now: Timestamp) {
        self.write_local(store, now);
    }

    pub fn undo(&mut self, store: &mut ContentStore, now: Timestamp) -> bool {
        let Some(previous) = self.history.undo(self.dom.to_html()) else {
            return false;
        };
        self.dom = Fragment::parse(&previous);
        self.write_local(store, now);
        true
    }

    pub fn redo(&mut self, store: &mut ContentStore, now: Timestamp) -> bool {
        let Some(next) = self.history.redo(self.dom.to_html()) else {
            return false;
        };
        self.dom = Fragment::parse(&next);
        self.write_local(store, now);
        true
    }

    fn write_local(&mut self, store: &mut ContentStore, now: Timestamp) {
        let html = self.dom.to_html();
        self.guard_until = Some(now + self.guard);
        self.pending = None;
        self.sync.cancel();
        self.value.clone_from(&html);
        let unchanged = match store.get(&self.binding.path) {
            None | Some(Value::Null) => html.is_empty(),
            Some(current) => current.as_str() == Some(html.as_str()),
        };
        if !unchanged {
            store.update_content(self.binding.path.clone(), html);
        }
    }

    pub fn poll(&mut self, now: Timestamp) -> bool {
        if !self.sync.fire(now) {
            return false;
        }
        let Some(incoming) = self.pending.take() else {
            return false;
        };
        if self.focused || incoming == self.value {
            return false;
        }
        tracing::debug!(field = %self.id, path = %self.binding.path, "adopting external value");
        self.dom = Fragment::parse(&incoming);
        self.value = incoming;
        true
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
        self.sync.cancel();
    }

    pub fn display(&self, edit_mode: bool) -> FieldDisplay {
        if !self.dom.is_blank() {
            return FieldDisplay::Html(self.dom.to_html());
        }
        let default_value = self.binding.default_value.trim();
        if !default_value.is_empty() {
            return FieldDisplay::Html(escape_text(default_value));
        }
        if self.is_editable(edit_mode) {
            FieldDisplay::Placeholder(PLACEHOLDER_TEXT.to_string())
        } else {
            FieldDisplay::Empty
        }
    }

    pub fn render(&self, edit_mode: bool) -> String {
        let tag = self.binding.tag.tag_name();
        let editable = if self.is_editable(edit_mode) {
            " contenteditable=\"true\""
        } else {
            ""
        };
        match self.display(edit_mode) {
            FieldDisplay::Html(html) => format!("<{tag}{editable}>{html}</{tag}>"),
            FieldDisplay::Placeholder(hint) => format!(
                "<{tag}{editable}><span style=\"{PLACEHOLDER_STYLE}\">{}</span></{tag}>",
                escape_text(&hint)
            ),
            FieldDisplay::Empty => format!("<{tag}{editable}></{tag}>"),
        }
    }
}

impl EditableField for EditableText {
    fn path(&self) -> &str {
        &self.binding.path
    }

    fn value(&self) -> Value {
        Value::String(self.value.clone())
    }

    fn is_disabled(&self) -> bool {
        self.binding.disabled
    }

    fn receive_external(&mut self, value: &Value, now: Timestamp) -> ExternalSync {
        let incoming = match value {
            Value::String(s) => s.as_str(),
            Value::Null => "",
            other => {
                tracing::debug!(field = %self.id, %other, "ignoring non-text value");
                return ExternalSync::Rejected;
            }
        };

        if self.focused {
            return ExternalSync::Focused;
        }
        if incoming == self.value {
            self.cancel_pending();
            return ExternalSync::Unchanged;
        }
        if self.guard_until.is_some_and(|until| now < until) {
            tracing::debug!(field = %self.id, "external value arrived inside the write guard");
            return ExternalSync::Guarded;
        }

        self.pending = Some(incoming.to_string());
        self.sync.arm(now, self.sync_delay);
        ExternalSync::Scheduled
    }
}
