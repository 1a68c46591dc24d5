// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Caller-supplied hooks into the scheduler lifecycle.

use std::io::Write;
use std::sync::Mutex;
use std::time::Instant;

use super::{Event, SchedulerError};

/// Observer invoked from the scheduler thread.
///
/// Every method defaults to a no-op. Implementations run on the timing-critical
/// thread and should return quickly.
pub trait SchedulerObserver: Send + Sync {
    /// The run loop is about to process tick 0
    fn on_start(&self, _bpm: f64, _ppqn: u32) {}

    /// A tick finished dispatching `dispatched` events
    fn on_tick(&self, _tick: u64, _dispatched: usize) {}

    /// The output rejected an event; the event is dropped
    fn on_dispatch_error(&self, _event: &Event, _error: &SchedulerError) {}

    /// The loop exited and the shutdown flush has been sent
    fn on_finished(&self, _last_tick: u64) {}
}

/// Observer that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SchedulerObserver for NoopObserver {}

/// Writes one line per tick: the tick number and seconds since start.
///
/// The writer belongs to the caller; the log is only as durable as it is.
pub struct TickLog<W: Write + Send> {
    writer: Mutex<W>,
    started: Mutex<Option<Instant>>,
}

impl<W: Write + Send> TickLog<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            started: Mutex::new(None),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn elapsed(&self) -> f64 {
        let mut started = self
            .started
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        started.get_or_insert_with(Instant::now).elapsed().as_secs_f64()
    }
}

impl<W: Write + Send> SchedulerObserver for TickLog<W> {
    fn on_start(&self, _bpm: f64, _ppqn: u32) {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
    }

    fn on_tick(&self, tick: u64, dispatched: usize) {
        let elapsed = self.elapsed();
        if let Ok(mut writer) = self.writer.lock() {
            if let Err(e) = writeln!(writer, "{}\t{:.6}\t{}", tick, elapsed, dispatched) {
                tracing::warn!(error = %e, "tick log write failed");
            }
        }
    }

    fn on_finished(&self, _last_tick: u64) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
