//! Bounded FIFO of pending outbound messages. Mirrors the shape of
//! `neutronium::net::buffer::Buffer` (a capacity-bounded, head/tail queue)
//! but holds structured entries instead of raw bytes.

use std::collections::VecDeque;

pub const CAPACITY: usize = 10;

/// A single pending outbound message and its retransmission count.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct QueueEntry {
    pub dest: String,
    pub content: String,
    pub attempts: u32,
}

impl QueueEntry {
    pub fn new(dest: impl Into<String>, content: impl Into<String>) -> QueueEntry {
        QueueEntry {
            dest: dest.into(),
            content: content.into(),
            attempts: 0,
        }
    }
}

/// Result of attempting to enqueue into a bounded queue.
#[derive(Debug, Eq, PartialEq)]
pub enum EnqueueResult {
    Ok,
    Full,
}

/// A bounded, oldest-first FIFO queue of outbound entries.
pub struct OutboundQueue {
    entries: VecDeque<QueueEntry>,
}

impl OutboundQueue {
    pub fn new() -> OutboundQueue {
        OutboundQueue {
            entries: VecDeque::with_capacity(CAPACITY),
        }
    }

    /// Appends `entry` to the tail unless the queue is already at capacity.
    #[inline]
    pub fn enqueue(&mut self, entry: QueueEntry) -> EnqueueResult {
        if self.entries.len() >= CAPACITY {
            return EnqueueResult::Full;
        }
        self.entries.push_back(entry);
        EnqueueResult::Ok
    }

    /// Returns the head entry without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    /// Returns a mutable reference to the head entry, for in-place attempt
    /// counter mutation. Callers must hold the node-wide lock while using this.
    #[inline]
    pub fn peek_mut(&mut self) -> Option<&mut QueueEntry> {
        self.entries.front_mut()
    }

    /// Removes and returns the head entry.
    #[inline]
    pub fn dequeue(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Removes every pending entry, for the operator `/limparfila` command.
    pub fn drain(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }
}

impl Default for OutboundQueue {
    fn default() -> OutboundQueue {
        OutboundQueue::new()
    }
}
