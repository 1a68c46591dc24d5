// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Per-tick scheduling work.
//!
//! The engine has no notion of wall-clock time: the scheduler thread calls
//! [`TickEngine::process_tick`] once per tick and the engine restarts
//! sequences, promotes due events and dispatches them.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::{InputQueue, PendingStore, SchedulerError, SchedulerObserver, SequenceRegistry};
use crate::midi::{self, messages, MidiOutput};
use crate::timing::BEATS_PER_BAR;

/// Outcome of a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Events the output accepted
    pub dispatched: usize,
    /// Events the output rejected
    pub failed: usize,
    /// Events generated by sequence restarts
    pub restarted: usize,
}

/// Owns the pending store and performs the work of one tick
#[derive(Debug)]
pub struct TickEngine {
    ppqn: u32,
    batch_size: usize,
    pending: PendingStore,
}

impl TickEngine {
    pub fn new(ppqn: u32, batch_size: usize) -> Self {
        Self {
            ppqn,
            batch_size,
            pending: PendingStore::new(),
        }
    }

    /// Events admitted but not yet due
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Run one tick.
    ///
    /// 1. On a bar boundary, expand every sequence restarting at `tick` into
    ///    the input queue.
    /// 2. Take pending events with `tick <= now` as due.
    /// 3. Drain up to `batch_size` events from the input queue; due ones join
    ///    the due set, the rest go to the pending store.
    /// 4. Send the due set in (tick, arrival) order.
    pub fn process_tick(
        &mut self,
        tick: u64,
        input: &InputQueue,
        sequences: &SequenceRegistry,
        output: &mut dyn MidiOutput,
        observer: &dyn SchedulerObserver,
    ) -> TickReport {
        let mut report = TickReport::default();

        if tick % (BEATS_PER_BAR * self.ppqn as u64) == 0 {
            let restarted = sequences.expand_restarts(tick, self.ppqn);
            if !restarted.is_empty() {
                debug!(tick, events = restarted.len(), "restarting sequences");
                report.restarted = restarted.len();
                input.push_all(restarted);
            }
        }

        let mut due = self.pending.pop_due(tick);

        for event in input.drain_batch(self.batch_size) {
            if event.tick <= tick {
                due.push(event);
            } else {
                self.pending.insert(event);
            }
        }

        due.sort_unstable();

        for event in due {
            match output.send(&event.message) {
                Ok(()) => report.dispatched += 1,
                Err(source) => {
                    report.failed += 1;
                    let err = SchedulerError::SinkDispatch {
                        message: event.message.clone(),
                        source,
                    };
                    warn!(tick, event = %event, error = %err, "dropping event");
                    observer.on_dispatch_error(&event, &err);
                }
            }
        }

        report
    }
}

/// Silence everything the scheduler may have left sounding.
///
/// Sends All Sound Off on channel 1, then for every channel: a Note Off for
/// each of the 128 pitches, All Sound Off and All Notes Off. Some devices
/// ignore the channel-mode messages, hence the explicit Note Offs.
///
/// Failures are logged and skipped. Returns the number of failed sends.
pub fn silence(output: &mut dyn MidiOutput, channels: &BTreeSet<u8>) -> usize {
    let mut failed = 0;
    let mut send = |message: Vec<u8>| {
        if let Err(e) = output.send(&message) {
            failed += 1;
            warn!(message = ?message, error = %e, "shutdown message not sent");
        }
    };

    send(midi::control_change(0, messages::ALL_SOUND_OFF, 0));

    for &channel in channels {
        for note in 0..=messages::DATA_MAX {
            send(midi::note_off(channel, note));
        }
        send(midi::control_change(channel, messages::ALL_SOUND_OFF, 0));
        send(midi::control_change(channel, messages::ALL_NOTES_OFF, 0));
    }

    failed
}
