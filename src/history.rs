//! Bounded undo/redo history of whole-sheet snapshots.
//!
//! Entries are appended after the cursor, discarding any redo branch, and the
//! oldest entries fall off once the capacity is reached. The cursor always
//! points at a stored entry; entry 0 is the state at load time until it is
//! trimmed away.

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    entries: Vec<T>,
    cursor: usize,
    limit: usize,
}

impl<T: Clone> History<T> {
    pub fn new(initial: &T) -> Self {
        Self::with_limit(initial, DEFAULT_HISTORY_LIMIT)
    }

    /// A `limit` of zero is treated as one.
    pub fn with_limit(initial: &T, limit: usize) -> Self {
        Self {
            entries: vec![initial.clone()],
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Stores a copy of `state` as the newest entry.
    pub fn record(&mut self, state: &T) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(state.clone());
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Steps back one entry, returning a copy of it.
    pub fn undo(&mut self) -> Option<T> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].clone())
    }

    /// Steps forward one entry, returning a copy of it.
    pub fn redo(&mut self) -> Option<T> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn current(&self) -> &T {
        &self.entries[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
