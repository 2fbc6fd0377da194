use std::time::Duration;

use folio_markup::{ExecCommand, FormattingState};
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::geometry::Point;
use crate::time::{Deadline, Timestamp};

/// Colours offered by the swatch row.
pub const COLOR_SWATCHES: &[&str] = &[
    "#000000", "#4b5563", "#dc2626", "#ea580c", "#ca8a04", "#16a34a", "#2563eb", "#9333ea",
];

/// Sizes offered by the size menu, on the legacy 1-7 scale.
pub const FONT_SIZE_CHOICES: &[(u8, &str)] = &[
    (2, "Small"),
    (3, "Normal"),
    (4, "Medium"),
    (5, "Large"),
    (6, "X-Large"),
    (7, "Huge"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "control", content = "value", rename_all = "snake_case")]
pub enum ToolbarControl {
    Bold,
    Italic,
    FontSize(u8),
    Color(String),
    Link,
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarAction {
    Execute(Command),
    OpenLinkInput,
}

/// Floating toolbar state. Rendering belongs to the host; this tracks what
/// is shown, where, and which buttons are active.
#[derive(Debug, Default)]
pub struct FloatingToolbar {
    visible: bool,
    position: Point,
    formatting: FormattingState,
    link_input: Option<String>,
    hide: Deadline,
}

impl FloatingToolbar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn formatting(&self) -> &FormattingState {
        &self.formatting
    }

    pub fn link_input(&self) -> Option<&str> {
        self.link_input.as_deref()
    }

    pub fn show(&mut self, position: Point, formatting: FormattingState) {
        self.visible = true;
        self.position = position;
        self.formatting = formatting;
        self.hide.cancel();
    }

    pub fn set_formatting(&mut self, formatting: FormattingState) {
        self.formatting = formatting;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.link_input = None;
        self.hide.cancel();
    }

    pub fn schedule_hide(&mut self, now: Timestamp, delay: Duration) {
        if self.visible {
            self.hide.arm(now, delay);
        }
    }

    /// Hides the toolbar once a scheduled hide is due.
    pub fn poll(&mut self, now: Timestamp) -> bool {
        if self.hide.fire(now) {
            self.hide();
            return true;
        }
        false
    }

    pub fn cancel_hide(&mut self) {
        self.hide.cancel();
    }

    pub fn action_for(&self, control: &ToolbarControl) -> ToolbarAction {
        let command = match control {
            ToolbarControl::Bold => ExecCommand::Bold,
            ToolbarControl::Italic => ExecCommand::Italic,
            ToolbarControl::FontSize(size) => ExecCommand::FontSize(*size),
            ToolbarControl::Color(color) => ExecCommand::ForeColor(color.clone()),
            ToolbarControl::Link => {
                if self.formatting.link && self.link_input.is_none() {
                    ExecCommand::Unlink
                } else {
                    return ToolbarAction::OpenLinkInput;
                }
            }
            ToolbarControl::Undo => return ToolbarAction::Execute(Command::Undo),
            ToolbarControl::Redo => return ToolbarAction::Execute(Command::Redo),
        };
        ToolbarAction::Execute(Command::Format(command))
    }

    pub fn open_link_input(&mut self, prefill: String) {
        self.link_input = Some(prefill);
    }

    pub fn edit_link_input(&mut self, url: &str) {
        if let Some(input) = &mut self.link_input {
            input.clear();
            input.push_str(url);
        }
    }

    /// Closes the URL input, yielding the link command to run. An empty URL
    /// removes the link.
    pub fn submit_link(&mut self, url: &str) -> Command {
        self.link_input = None;
        let url = url.trim();
        if url.is_empty() {
            Command::Format(ExecCommand::Unlink)
        } else {
            Command::Format(ExecCommand::CreateLink(url.to_string()))
        }
    }

    pub fn cancel_link(&mut self) {
        self.link_input = None;
    }
}
