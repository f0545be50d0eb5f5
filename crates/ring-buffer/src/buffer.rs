//! History Buffer Implementation

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default buffer capacity (10 samples)
pub const DEFAULT_CAPACITY: usize = 10;

/// Fixed-capacity FIFO buffer, oldest entry evicted first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBuffer<T> {
    /// Stored entries in arrival order (front = oldest)
    entries: VecDeque<T>,
    /// Maximum number of retained entries
    capacity: usize,
    /// Total entries ever pushed (for statistics)
    total_pushed: usize,
}

impl<T> HistoryBuffer<T> {
    /// Create a new buffer holding at most `capacity` entries.
    ///
    /// A zero capacity is bumped to one so the latest entry is always visible.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            total_pushed: 0,
        }
    }

    /// Create a buffer with default capacity (10 entries)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Push an entry, returning the evicted oldest entry if the buffer was full
    pub fn push(&mut self, entry: T) -> Option<T> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        self.total_pushed += 1;
        evicted
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently pushed entry
    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Iterate over all entries, oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Iterate over the last `count` entries in arrival order (oldest first)
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &T> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip)
    }

    /// Total entries ever pushed, including evicted ones
    pub fn total_pushed(&self) -> usize {
        self.total_pushed
    }

    /// Remove every entry and reset statistics
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_pushed = 0;
    }
}

impl<T> Default for HistoryBuffer<T> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_and_read() {
        let mut buffer = HistoryBuffer::new(10);

        for i in 0..5 {
            buffer.push(i);
        }

        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.latest(), Some(&4));

        let recent: Vec<_> = buffer.recent(3).copied().collect();
        assert_eq!(recent, vec![2, 3, 4]);
    }

    #[test]
    fn test_evicts_oldest() {
        let mut buffer = HistoryBuffer::new(10);

        for i in 0..12 {
            let evicted = buffer.push(i);
            if i < 10 {
                assert!(evicted.is_none());
            } else {
                assert_eq!(evicted, Some(i - 10));
            }
        }

        assert!(buffer.is_full());
        let held: Vec<_> = buffer.iter().copied().collect();
        assert_eq!(held, (2..12).collect::<Vec<_>>());
        assert_eq!(buffer.total_pushed(), 12);
    }

    #[test]
    fn test_recent_shorter_than_window() {
        let mut buffer = HistoryBuffer::new(10);
        buffer.push('a');
        buffer.push('b');

        let recent: Vec<_> = buffer.recent(5).copied().collect();
        assert_eq!(recent, vec!['a', 'b']);
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let mut buffer = HistoryBuffer::new(0);
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.latest(), Some(&2));
    }

    #[test]
    fn test_clear() {
        let mut buffer = HistoryBuffer::with_default_capacity();
        buffer.push(1);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.total_pushed(), 0);
    }

    proptest! {
        #[test]
        fn test_never_exceeds_capacity(capacity in 1usize..32, pushes in 0usize..100) {
            let mut buffer = HistoryBuffer::new(capacity);
            for i in 0..pushes {
                buffer.push(i);
            }
            prop_assert_eq!(buffer.len(), pushes.min(capacity));
            if pushes > 0 {
                prop_assert_eq!(buffer.latest(), Some(&(pushes - 1)));
            }
        }
    }
}
