use std::collections::VecDeque;

use crate::data::table::Dataset;
use crate::error::SessionError;

pub const DEFAULT_CAPACITY: usize = 10;

/// Bounded undo stack of whole-session snapshots.
///
/// Each entry is a deep copy of the dataset collection taken just before a
/// mutation. When full, the oldest snapshot is dropped.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Vec<Dataset>>,
    max_entries: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl History {
    pub fn new(max_entries: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    /// Record the state about to be changed.
    pub fn push(&mut self, snapshot: &[Dataset]) {
        if self.max_entries == 0 {
            return;
        }
        self.undo_stack.push_back(snapshot.to_vec());
        while self.undo_stack.len() > self.max_entries {
            self.undo_stack.pop_front();
        }
    }

    /// Take the most recent snapshot.
    pub fn pop(&mut self) -> Result<Vec<Dataset>, SessionError> {
        self.undo_stack.pop_back().ok_or(SessionError::EmptyHistory)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
    }
}
