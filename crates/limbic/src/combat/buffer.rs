//! Bounded, time-stamped FIFO for attack presses.
//!
//! A press made while the character is still recovering is kept for a short
//! window instead of being lost; anything older than the window silently
//! expires.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::CombatConfig;

/// One buffered entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Buffered<T> {
    pub item: T,
    /// Simulation time the entry was added
    pub time: f32,
}

/// Input buffer with drop-when-full back-pressure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBuffer<T> {
    entries: VecDeque<Buffered<T>>,
    capacity: usize,
    max_age: f32,
}

impl<T: Copy> InputBuffer<T> {
    pub fn new(capacity: usize, max_age: f32) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            max_age,
        }
    }

    pub fn from_config(config: &CombatConfig) -> Self {
        Self::new(config.buffer_capacity, config.buffer_max_age)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_age(&self) -> f32 {
        self.max_age
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add an entry; returns false (and drops it) when the buffer is full
    pub fn add(&mut self, item: T, now: f32) -> bool {
        if self.entries.len() >= self.capacity {
            tracing::warn!("Input buffer full ({}), dropping press", self.capacity);
            return false;
        }
        self.entries.push_back(Buffered { item, time: now });
        true
    }

    /// Remove and return the oldest live entry
    pub fn pop(&mut self, now: f32) -> Option<T> {
        self.purge(now);
        self.entries.pop_front().map(|entry| entry.item)
    }

    /// Oldest live entry, left in place
    pub fn peek(&mut self, now: f32) -> Option<T> {
        self.purge(now);
        self.entries.front().map(|entry| entry.item)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // Entries are added in time order, so stale ones are always at the front
    fn purge(&mut self, now: f32) {
        while let Some(front) = self.entries.front() {
            if now - front.time > self.max_age {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_when_full() {
        let mut buffer = InputBuffer::new(5, 0.5);
        for i in 0..6 {
            buffer.add(i, 0.0);
        }
        assert_eq!(buffer.len(), 5);
        // The overflow is the one dropped, not the oldest
        assert_eq!(buffer.pop(0.0), Some(0));
    }

    #[test]
    fn test_fifo_order() {
        let mut buffer = InputBuffer::new(5, 0.5);
        buffer.add('a', 0.0);
        buffer.add('b', 0.1);
        buffer.add('c', 0.2);
        assert_eq!(buffer.peek(0.2), Some('a'));
        assert_eq!(buffer.pop(0.2), Some('a'));
        assert_eq!(buffer.pop(0.2), Some('b'));
        assert_eq!(buffer.pop(0.2), Some('c'));
        assert_eq!(buffer.pop(0.2), None);
    }

    #[test]
    fn test_stale_entries_expire() {
        let mut buffer = InputBuffer::new(5, 0.5);
        buffer.add(1, 0.0);
        buffer.add(2, 0.3);
        assert_eq!(buffer.pop(0.5 + 1e-3), Some(2));
        assert!(buffer.is_empty());

        buffer.add(3, 1.0);
        assert_eq!(buffer.peek(1.6), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut buffer = InputBuffer::new(2, 0.5);
        buffer.add(1, 0.0);
        buffer.add(2, 0.0);
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.add(3, 0.0));
    }
}
