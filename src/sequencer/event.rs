// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scheduled MIDI events.

use std::cmp::Ordering;
use std::fmt;

/// A MIDI message due at a given tick.
///
/// Events order by tick, and events on the same tick keep the order in which
/// they entered the scheduler's input queue.
#[derive(Debug, Clone)]
pub struct Event {
    /// Tick at which the message is sent
    pub tick: u64,
    /// Raw MIDI bytes
    pub message: Vec<u8>,
    /// Arrival sequence number, assigned by the input queue
    pub(crate) arrival: u64,
}

impl Event {
    /// Create an event for `message` at `tick`
    pub fn new(tick: u64, message: impl Into<Vec<u8>>) -> Self {
        Self {
            tick,
            message: message.into(),
            arrival: 0,
        }
    }

    /// Shift the event later by `delta` ticks
    pub fn delayed(mut self, delta: u64) -> Self {
        self.tick = self.tick.saturating_add(delta);
        self
    }

    /// Position in the input queue's arrival order
    pub fn arrival(&self) -> u64 {
        self.arrival
    }
}

impl Eq for Event {}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick && self.arrival == other.arrival
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tick
            .cmp(&other.tick)
            .then(self.arrival.cmp(&other.arrival))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@ {:05} {:02X?}", self.tick, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_arrival(tick: u64, arrival: u64) -> Event {
        let mut event = Event::new(tick, vec![0x90, 60, 100]);
        event.arrival = arrival;
        event
    }

    #[test]
    fn test_orders_by_tick_then_arrival() {
        let mut events = vec![with_arrival(5, 0), with_arrival(2, 3), with_arrival(2, 1)];
        events.sort();

        let keys: Vec<_> = events.iter().map(|e| (e.tick, e.arrival)).collect();
        assert_eq!(keys, vec![(2, 1), (2, 3), (5, 0)]);
    }

    #[test]
    fn test_delayed() {
        let event = Event::new(10, vec![0x80, 60, 0]).delayed(5);
        assert_eq!(event.tick, 15);
    }

    #[test]
    fn test_delayed_saturates() {
        let event = Event::new(u64::MAX - 1, vec![0x80, 60, 0]).delayed(5);
        assert_eq!(event.tick, u64::MAX);
    }

    #[test]
    fn test_display() {
        let event = Event::new(42, vec![0x90, 60, 100]);
        assert_eq!(event.to_string(), "@ 00042 [90, 3C, 64]");
    }
}
