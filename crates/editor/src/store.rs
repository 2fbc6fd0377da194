use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::time::Timestamp;

/// Field path (`hero.title`, `services.items`) to its current value. Text
/// fields hold HTML strings; repeatable sections hold arrays.
pub type ContentMap = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "at", rename_all = "snake_case")]
pub enum SaveStatus {
    Idle,
    Unsaved,
    Saving,
    Saved(Timestamp),
    LoginRequired,
}

impl SaveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "",
            SaveStatus::Unsaved => "Unsaved changes",
            SaveStatus::Saving => "Saving…",
            SaveStatus::Saved(_) => "Saved ✓",
            SaveStatus::LoginRequired => "Log in to save",
        }
    }
}

/// Shared editing state for one page. Every field reads and writes through
/// the setters here; nothing mutates another field's entry directly.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    content: ContentMap,
    edit_mode: bool,
    is_saving: bool,
    has_unsaved_changes: bool,
    last_saved: Option<Timestamp>,
    login_required: bool,
    revision: u64,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: ContentMap) -> Self {
        Self {
            content,
            ..Self::default()
        }
    }

    /// Merges one entry and marks the store dirty.
    pub fn update_content(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        self.content.insert(path.into(), value.into());
        self.has_unsaved_changes = true;
        self.revision += 1;
    }

    /// Replaces the whole map, e.g. after loading; the result is clean.
    pub fn set_content(&mut self, content: ContentMap) {
        self.content = content;
        self.has_unsaved_changes = false;
        self.revision += 1;
    }

    pub fn content(&self) -> &ContentMap {
        &self.content
    }

    pub fn snapshot(&self) -> ContentMap {
        self.content.clone()
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.content.get(path)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_edit_mode(&mut self, edit_mode: bool) {
        self.edit_mode = edit_mode;
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn set_is_saving(&mut self, is_saving: bool) {
        self.is_saving = is_saving;
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn set_last_saved(&mut self, at: Timestamp) {
        self.last_saved = Some(at);
    }

    pub fn last_saved(&self) -> Option<Timestamp> {
        self.last_saved
    }

    pub fn mark_unsaved_changes(&mut self, dirty: bool) {
        self.has_unsaved_changes = dirty;
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub fn set_login_required(&mut self, required: bool) {
        self.login_required = required;
    }

    pub fn status(&self) -> SaveStatus {
        if self.is_saving {
            return SaveStatus::Saving;
        }
        if self.has_unsaved_changes {
            return if self.login_required {
                SaveStatus::LoginRequired
            } else {
                SaveStatus::Unsaved
            };
        }
        match self.last_saved {
            Some(at) => SaveStatus::Saved(at),
            None => SaveStatus::Idle,
        }
    }
}
