use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A selection inside one editable root, as byte offsets into its text
/// content. `start` may exceed `end` for a backwards selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn ordered(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self::new(self.end, self.start)
        }
    }

    pub fn len(&self) -> usize {
        self.start.abs_diff(self.end)
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Orders the range and pulls both ends onto char boundaries of `text`.
    pub fn clamped(self, text: &str) -> Self {
        let ordered = self.ordered();
        Self::new(
            clamp_to_char_boundary(text, ordered.start),
            clamp_to_char_boundary(text, ordered.end),
        )
    }

    pub fn as_range(&self) -> Range<usize> {
        let ordered = self.ordered();
        ordered.start..ordered.end
    }
}

impl From<Range<usize>> for TextRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

pub fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}
