//! Bounded, FIFO-evicting event history.

use std::collections::VecDeque;

use crate::event::Event;

/// Default number of events retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Ring of the most recently dispatched events, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<Event>,
    capacity: usize,
}

impl HistoryBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append an entry, evicting from the front until within capacity.
    pub fn push(&mut self, entry: Event) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Last `n` entries in chronological order (fewer if the buffer is shorter).
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<Event> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Full chronological snapshot.
    #[must_use]
    pub fn all(&self) -> Vec<Event> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
