//! In-memory priority queue, FIFO within equal priority.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry ordered by priority (highest first), then insertion sequence (earliest first).
struct PriorityEntry<T> {
    priority: i32,
    seq: u64,
    item: T,
}

impl<T> PartialEq for PriorityEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<T> Eq for PriorityEntry<T> {}

impl<T> PartialOrd for PriorityEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for PriorityEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first
        match self.priority.cmp(&other.priority) {
            // FIFO within same priority: lower sequence wins (reversed for max-heap)
            Ordering::Equal => other.seq.cmp(&self.seq),
            other => other,
        }
    }
}

/// Priority queue with stable ordering among equal priorities.
/// O(log n) push and pop.
pub struct PriorityQueue<T> {
    entries: BinaryHeap<PriorityEntry<T>>,
    next_seq: u64,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PriorityQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Insert `item`; it runs after every queued item of equal or higher priority.
    pub fn push(&mut self, priority: i32, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(PriorityEntry {
            priority,
            seq,
            item,
        });
    }

    /// Remove the highest-priority, earliest-inserted item.
    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop().map(|entry| entry.item)
    }

    /// Priority of the item [`pop`](Self::pop) would return.
    #[must_use]
    pub fn peek_priority(&self) -> Option<i32> {
        self.entries.peek().map(|entry| entry.priority)
    }

    /// Current depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every queued item.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
