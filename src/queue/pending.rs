//! Priority FIFO of pending requests.
//!
//! # Ordering
//! ```text
//! [ high(seq 4) high(seq 9) | normal(seq 1) normal(seq 2) normal(seq 7) ]
//!                         ^ new high entries land here
//!                                                   new normal entries ^
//! ```
//! `enqueue` stamps each entry's sequence number itself. Callers already hold
//! the queue lock, so stamping order and insertion order are the same order
//! and every tier stays sorted by sequence.

use std::collections::VecDeque;

use crate::queue::entry::QueueEntry;
use crate::queue::request::{Priority, RequestId};

/// Pending entries, high tier first.
#[derive(Debug, Default)]
pub struct RequestQueue {
    entries: VecDeque<QueueEntry>,
    next_sequence: u64,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the next sequence number and insert according to priority.
    pub fn enqueue(&mut self, mut entry: QueueEntry) {
        self.next_sequence += 1;
        entry.request.sequence = self.next_sequence;

        match entry.request.priority {
            Priority::Normal => self.entries.push_back(entry),
            Priority::High => {
                let position = self
                    .entries
                    .iter()
                    .position(|e| e.request.priority == Priority::Normal)
                    .unwrap_or(self.entries.len());
                self.entries.insert(position, entry);
            }
        }
    }

    /// Take the next entry to dispatch.
    pub fn dequeue(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    /// Take a not-yet-dispatched entry out of the queue.
    pub fn remove(&mut self, id: RequestId) -> Option<QueueEntry> {
        let position = self.entries.iter().position(|e| e.id() == id)?;
        self.entries.remove(position)
    }

    /// Take every entry, in dispatch order.
    pub fn drain_all(&mut self) -> Vec<QueueEntry> {
        self.entries.drain(..).collect()
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.entries.iter().any(|e| e.id() == id)
    }

    /// Ids in dispatch order.
    pub fn ids(&self) -> Vec<RequestId> {
        self.entries.iter().map(QueueEntry::id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
