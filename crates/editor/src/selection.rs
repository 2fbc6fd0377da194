use folio_markup::{Fragment, TextRange};

use crate::config::EditorConfig;
use crate::field::FieldId;
use crate::geometry::{Point, Rect, Viewport};

/// A selection reported by the host: which field, which text, and where it
/// sits on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostSelection {
    pub field: FieldId,
    pub range: TextRange,
    pub bounds: Rect,
}

/// Snapshot of the last non-empty selection, kept after focus moves to the
/// toolbar so commands can still find their target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRange {
    pub field: FieldId,
    pub range: TextRange,
    pub text: String,
}

impl SavedRange {
    /// Maps the saved range onto `fragment` as it is now. When the offsets no
    /// longer cover the same text, the occurrence nearest the old start wins.
    pub fn resolve(&self, fragment: &Fragment) -> Option<TextRange> {
        let range = self.range.ordered();
        if !self.text.is_empty() && fragment.text_in(range) == self.text {
            return Some(range);
        }
        let found = fragment.find_text(&self.text, range.start);
        if found.is_none() {
            tracing::debug!(field = %self.field, "saved selection no longer matches the field");
        }
        found
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerUpdate {
    Show(Point),
    Hide,
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    saved: Option<SavedRange>,
    bounds: Option<Rect>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Option<&SavedRange> {
        self.saved.as_ref()
    }

    pub fn last_bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Handles a document selection change. Empty or collapsed selections
    /// hide the toolbar but keep the saved range.
    pub fn on_selection_change(
        &mut self,
        selection: Option<(&HostSelection, &Fragment)>,
        edit_mode: bool,
        viewport: Viewport,
        config: &EditorConfig,
    ) -> TrackerUpdate {
        let Some((selection, fragment)) = selection else {
            return TrackerUpdate::Hide;
        };
        if !edit_mode || selection.range.is_collapsed() {
            return TrackerUpdate::Hide;
        }
        let range = selection.range.ordered();
        let text = fragment.text_in(range);
        if text.trim().is_empty() {
            return TrackerUpdate::Hide;
        }

        self.save(selection.field, range, text, selection.bounds);
        TrackerUpdate::Show(toolbar_position(selection.bounds, viewport, config))
    }

    /// Replaces the saved range after a command moved the selection.
    pub fn save(&mut self, field: FieldId, range: TextRange, text: String, bounds: Rect) {
        self.saved = Some(SavedRange { field, range, text });
        self.bounds = Some(bounds);
    }

    pub fn forget_field(&mut self, field: FieldId) {
        if self.saved.as_ref().is_some_and(|saved| saved.field == field) {
            self.saved = None;
            self.bounds = None;
        }
    }

    pub fn clear(&mut self) {
        self.saved = None;
        self.bounds = None;
    }
}

/// Places the toolbar centred above `bounds`, clamped inside the viewport.
/// Falls back to below the selection when there is no room above, and to the
/// top margin when there is no room below either.
pub fn toolbar_position(bounds: Rect, viewport: Viewport, config: &EditorConfig) -> Point {
    let margin = config.viewport_margin_px;
    let width = config.toolbar_width_px;
    let height = config.toolbar_height_px;

    let max_left = (viewport.width - width - margin).max(margin);
    let left = (bounds.center_x() - width / 2.0).clamp(margin, max_left);

    let mut top = bounds.top - config.toolbar_offset_px;
    if top < margin {
        top = bounds.bottom() + margin;
        if top + height > viewport.height - margin {
            top = margin;
        }
    }

    Point {
        left: left.max(0.0),
        top: top.max(0.0),
    }
}
