use std::collections::TryReserveError;

/// Lengths of recorded user actions, most recent last.
///
/// `last_checkpoint` is the visible count at the end of the last recorded
/// action; a new record only covers what was added beyond it.
#[derive(Debug, Default)]
pub struct UndoStack {
    stack: Vec<usize>,
    last_checkpoint: usize,
}

impl UndoStack {
    /// Starts an empty stack on top of already visible geometry that
    /// should not be undoable, such as a loaded drawing.
    pub fn with_baseline(visible: usize) -> Self {
        Self {
            stack: Vec::new(),
            last_checkpoint: visible,
        }
    }

    /// Records the growth since the last checkpoint, if any, and returns
    /// the length of the new record.
    pub fn checkpoint(&mut self, visible: usize) -> Result<Option<usize>, TryReserveError> {
        let mut pushed = None;
        if visible > self.last_checkpoint {
            let length = visible - self.last_checkpoint;
            self.stack.try_reserve(1)?;
            self.stack.push(length);
            pushed = Some(length);
        }
        self.last_checkpoint = visible;
        Ok(pushed)
    }

    /// Pops the latest record if it fits inside `visible` and returns the
    /// new visible count.
    pub fn undo(&mut self, visible: usize) -> usize {
        match self.stack.last() {
            Some(&length) if visible >= length => {
                self.stack.pop();
                self.last_checkpoint = visible - length;
                self.last_checkpoint
            }
            _ => visible,
        }
    }

    /// Moves the mark to `visible` without recording anything, for jumps
    /// in the visible count that are not user actions.
    pub fn rebase(&mut self, visible: usize) {
        self.last_checkpoint = visible;
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn last_checkpoint(&self) -> usize {
        self.last_checkpoint
    }
}
