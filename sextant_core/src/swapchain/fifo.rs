// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded FIFO of free image indices.

use std::collections::VecDeque;

/// A first-in first-out queue of image indices with a fixed capacity.
#[derive(Clone, Debug)]
pub struct IndexFifo {
    indices: VecDeque<u32>,
    capacity: usize,
}

impl IndexFifo {
    /// Creates an empty FIFO holding at most `capacity` indices.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            indices: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Creates a full FIFO holding `0..count` in order.
    #[must_use]
    pub fn primed(count: u32) -> Self {
        Self {
            indices: (0..count).collect(),
            capacity: count as usize,
        }
    }

    /// Appends an index. Hands it back if the FIFO is full.
    pub fn push(&mut self, index: u32) -> Result<(), u32> {
        if self.is_full() {
            return Err(index);
        }
        self.indices.push_back(index);
        Ok(())
    }

    /// Removes the oldest index.
    pub fn pop(&mut self) -> Option<u32> {
        self.indices.pop_front()
    }

    /// Number of queued indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether no indices are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether no more indices fit.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.indices.len() >= self.capacity
    }

    /// Maximum number of indices.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primed_pops_in_order() {
        let mut fifo = IndexFifo::primed(3);
        assert!(fifo.is_full(), "primed is full");
        assert_eq!(fifo.pop(), Some(0), "first");
        assert_eq!(fifo.pop(), Some(1), "second");
        assert_eq!(fifo.pop(), Some(2), "third");
        assert_eq!(fifo.pop(), None, "empty");
    }

    #[test]
    fn push_rejects_when_full() {
        let mut fifo = IndexFifo::new(2);
        assert_eq!(fifo.push(1), Ok(()), "room");
        assert_eq!(fifo.push(0), Ok(()), "room");
        assert_eq!(fifo.push(2), Err(2), "full");
        assert_eq!(fifo.pop(), Some(1), "oldest first");
        assert_eq!(fifo.len(), 1, "one left");
    }
}
