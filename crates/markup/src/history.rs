const DEFAULT_MAX_HISTORY: usize = 200;

/// Undo/redo stacks of `innerHTML` snapshots for one editable root.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<String>,
    redo_stack: Vec<String>,
    max_len: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl History {
    pub fn new(max_len: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_len: if max_len == 0 {
                DEFAULT_MAX_HISTORY
            } else {
                max_len
            },
        }
    }

    /// Records the state that existed before an edit.
    pub fn record(&mut self, before: impl Into<String>) {
        let before = before.into();
        if self.undo_stack.last() == Some(&before) {
            return;
        }
        self.undo_stack.push(before);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_len {
            self.undo_stack.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self, current: impl Into<String>) -> Option<String> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current.into());
        Some(previous)
    }

    pub fn redo(&mut self, current: impl Into<String>) -> Option<String> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current.into());
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
