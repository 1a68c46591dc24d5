// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Input queue and pending store.
//!
//! Producers push into the [`InputQueue`] from any thread. The scheduler
//! thread drains it in bounded batches and parks events that are not yet due
//! in the [`PendingStore`].

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::Event;

/// Unbounded multi-producer queue of events waiting to be admitted.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: Mutex<VecDeque<Event>>,
    next_arrival: AtomicU64,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, stamping it with the next arrival number
    pub fn push(&self, event: Event) {
        self.push_all(std::iter::once(event));
    }

    /// Append several events under one lock, preserving their order
    pub fn push_all(&self, events: impl IntoIterator<Item = Event>) {
        let mut queue = self.lock();
        for mut event in events {
            event.arrival = self.next_arrival.fetch_add(1, Ordering::Relaxed);
            queue.push_back(event);
        }
    }

    /// Pop up to `max` events from the front
    pub fn drain_batch(&self, max: usize) -> Vec<Event> {
        let mut queue = self.lock();
        let count = max.min(queue.len());
        queue.drain(..count).collect()
    }

    /// Number of events waiting
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard every waiting event
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Event>> {
        // A producer that panicked mid-push leaves the deque itself intact.
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Events admitted but not yet due, ordered by tick then arrival.
#[derive(Debug, Default)]
pub struct PendingStore {
    queue: BinaryHeap<Reverse<Event>>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event
    pub fn insert(&mut self, event: Event) {
        self.queue.push(Reverse(event));
    }

    /// Remove and return, in order, every event with `tick <= now`
    pub fn pop_due(&mut self, now: u64) -> Vec<Event> {
        let mut due = Vec::new();
        while let Some(Reverse(event)) = self.queue.peek() {
            if event.tick > now {
                break;
            }
            if let Some(Reverse(event)) = self.queue.pop() {
                due.push(event);
            }
        }
        due
    }

    /// Tick of the earliest pending event
    pub fn next_tick(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(event)| event.tick)
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Clear all pending events
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
