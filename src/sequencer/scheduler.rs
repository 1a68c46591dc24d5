// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Threaded event scheduler.
//!
//! [`Scheduler`] owns a worker thread that advances the tick clock, runs the
//! [`TickEngine`] once per tick and silences the output when it exits.
//! [`SchedulerHandle`] is the cloneable producer side: it registers sequences,
//! submits events and changes tempo from any thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::engine::{silence, TickEngine};
use super::{
    Event, InputQueue, NoopObserver, SchedulerConfig, SchedulerError, SchedulerObserver,
    Sequence, SequenceId, SequenceRegistry,
};
use crate::midi::MidiOutput;
use crate::timing::{tick_seconds, TickClock, BEATS_PER_BAR};

/// Default time `Drop` waits for the thread to flush and exit
const DROP_TIMEOUT: Duration = Duration::from_secs(5);

/// State shared between the scheduler thread and producers
#[derive(Debug)]
struct Shared {
    ppqn: u32,
    batch_size: usize,
    bpm_bits: AtomicU64,
    tick: AtomicU64,
    input: InputQueue,
    sequences: SequenceRegistry,
    stop_requested: AtomicBool,
    running: AtomicBool,
    finished: Mutex<bool>,
    finished_signal: Condvar,
}

impl Shared {
    fn bpm(&self) -> f64 {
        f64::from_bits(self.bpm_bits.load(Ordering::Acquire))
    }

    fn set_finished(&self, value: bool) {
        let mut finished = self
            .finished
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *finished = value;
        if value {
            self.finished_signal.notify_all();
        }
    }

    fn is_finished(&self) -> bool {
        *self
            .finished
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Block until finished or `timeout` elapses. Returns whether finished.
    fn wait_finished(&self, timeout: Duration) -> bool {
        let finished = self
            .finished
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let (finished, _) = self
            .finished_signal
            .wait_timeout_while(finished, timeout, |done| !*done)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *finished
    }
}

/// Raises the finished signal however the thread exits
struct FinishGuard<'a>(&'a Shared);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
        self.0.set_finished(true);
    }
}

/// Cloneable producer-side access to a scheduler
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    shared: Arc<Shared>,
}

impl SchedulerHandle {
    /// Register or replace a sequence.
    ///
    /// With `id = None` a fresh id is generated. Takes effect at the
    /// sequence's next restart boundary.
    pub fn set_sequence(&self, sequence: Sequence, id: Option<SequenceId>) -> SequenceId {
        let id = self.shared.sequences.insert(sequence, id);
        debug!(%id, "sequence registered");
        id
    }

    /// Unregister a sequence. Events already queued for it still play.
    pub fn remove_sequence(&self, id: &SequenceId) -> Option<Sequence> {
        self.shared.sequences.remove(id)
    }

    /// Mutate a registered sequence, e.g. to append notes between restarts
    pub fn update_sequence<R>(
        &self,
        id: &SequenceId,
        f: impl FnOnce(&mut Sequence) -> R,
    ) -> Result<R, SchedulerError> {
        self.shared
            .sequences
            .update(id, f)
            .ok_or_else(|| SchedulerError::UnknownSequence(id.clone()))
    }

    /// Copy of a registered sequence
    pub fn sequence(&self, id: &SequenceId) -> Option<Sequence> {
        self.shared.sequences.get(id)
    }

    /// Registered sequence ids, sorted
    pub fn sequence_ids(&self) -> Vec<SequenceId> {
        self.shared.sequences.ids()
    }

    /// Human-readable listing of every registered sequence
    pub fn describe_sequences(&self) -> String {
        self.shared.sequences.describe()
    }

    /// Queue a raw message.
    ///
    /// The tick defaults to the current tick; `delta` is added to it. Never blocks
    /// on the scheduler thread.
    pub fn submit(&self, message: impl Into<Vec<u8>>, tick: Option<u64>, delta: u64) {
        let tick = tick.unwrap_or_else(|| self.current_tick());
        self.shared.input.push(Event::new(tick.saturating_add(delta), message));
    }

    /// Queue a pre-built event at its own tick
    pub fn schedule(&self, event: Event) {
        self.shared.input.push(event);
    }

    /// Queue several events, keeping their relative order on equal ticks
    pub fn schedule_all(&self, events: impl IntoIterator<Item = Event>) {
        self.shared.input.push_all(events);
    }

    /// Change tempo; the new tick duration applies from the next tick.
    ///
    /// # Errors
    /// `InvalidSchedulerConfig` if `bpm` is not a positive finite number.
    pub fn set_bpm(&self, bpm: f64) -> Result<(), SchedulerError> {
        validate_bpm(bpm)?;
        self.shared.bpm_bits.store(bpm.to_bits(), Ordering::Release);
        Ok(())
    }

    /// Current tempo in BPM
    pub fn bpm(&self) -> f64 {
        self.shared.bpm()
    }

    /// Ticks per quarter note
    pub fn ppqn(&self) -> u32 {
        self.shared.ppqn
    }

    /// Seconds per tick, `60 / bpm / ppqn`
    pub fn tick_seconds(&self) -> f64 {
        tick_seconds(self.bpm(), self.shared.ppqn)
    }

    /// Duration of one tick at the current tempo
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(self.tick_seconds())
    }

    /// Tick the scheduler thread is on (0 before the first start)
    pub fn current_tick(&self) -> u64 {
        self.shared.tick.load(Ordering::Acquire)
    }

    /// Whether the scheduler thread is running its loop
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Whether the last run has exited and flushed the output
    pub fn is_finished(&self) -> bool {
        self.shared.is_finished()
    }

    /// Wait until the current run finishes. Returns whether it did.
    pub fn wait_until_finished(&self, timeout: Duration) -> bool {
        self.shared.wait_finished(timeout)
    }

    /// Events queued but not yet admitted by the scheduler thread
    pub fn queued_events(&self) -> usize {
        self.shared.input.len()
    }
}

/// Event scheduler driving a MIDI output from its own thread
pub struct Scheduler {
    handle: SchedulerHandle,
    observer: Arc<dyn SchedulerObserver>,
    output: Option<Box<dyn MidiOutput>>,
    worker: Option<JoinHandle<Box<dyn MidiOutput>>>,
}

impl Scheduler {
    /// Create a stopped scheduler.
    ///
    /// # Errors
    /// `InvalidSchedulerConfig` if the configuration does not validate.
    pub fn new(
        output: impl MidiOutput + 'static,
        config: SchedulerConfig,
    ) -> Result<Self, SchedulerError> {
        config.validate()?;

        let shared = Shared {
            ppqn: config.ppqn,
            batch_size: config.batch_size,
            bpm_bits: AtomicU64::new(config.bpm.to_bits()),
            tick: AtomicU64::new(0),
            input: InputQueue::new(),
            sequences: SequenceRegistry::new(),
            stop_requested: AtomicBool::new(false),
            running: AtomicBool::new(false),
            finished: Mutex::new(false),
            finished_signal: Condvar::new(),
        };

        Ok(Self {
            handle: SchedulerHandle {
                shared: Arc::new(shared),
            },
            observer: Arc::new(NoopObserver),
            output: Some(Box::new(output)),
            worker: None,
        })
    }

    /// Attach an observer for lifecycle callbacks
    pub fn with_observer(mut self, observer: Arc<dyn SchedulerObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Producer handle usable from other threads
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// See [`SchedulerHandle::set_sequence`]
    pub fn set_sequence(&self, sequence: Sequence, id: Option<SequenceId>) -> SequenceId {
        self.handle.set_sequence(sequence, id)
    }

    /// See [`SchedulerHandle::remove_sequence`]
    pub fn remove_sequence(&self, id: &SequenceId) -> Option<Sequence> {
        self.handle.remove_sequence(id)
    }

    /// See [`SchedulerHandle::submit`]
    pub fn submit(&self, message: impl Into<Vec<u8>>, tick: Option<u64>, delta: u64) {
        self.handle.submit(message, tick, delta)
    }

    /// See [`SchedulerHandle::schedule`]
    pub fn schedule(&self, event: Event) {
        self.handle.schedule(event)
    }

    /// See [`SchedulerHandle::set_bpm`]
    pub fn set_bpm(&self, bpm: f64) -> Result<(), SchedulerError> {
        self.handle.set_bpm(bpm)
    }

    /// See [`SchedulerHandle::tick_duration`]
    pub fn tick_duration(&self) -> Duration {
        self.handle.tick_duration()
    }

    /// See [`SchedulerHandle::current_tick`]
    pub fn current_tick(&self) -> u64 {
        self.handle.current_tick()
    }

    /// See [`SchedulerHandle::is_running`]
    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// See [`SchedulerHandle::is_finished`]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Start playback on a new thread.
    ///
    /// With `bars = Some(n)` the loop stops by itself once the tick counter
    /// passes `n` bars; `None` plays until [`Scheduler::stop`].
    ///
    /// # Errors
    /// `AlreadyRunning` if a previous run has not finished, and
    /// `InvalidSchedulerConfig` for `Some(0)`.
    pub fn start(&mut self, bars: Option<u32>) -> Result<(), SchedulerError> {
        if bars == Some(0) {
            return Err(SchedulerError::InvalidSchedulerConfig(
                "bar limit must be at least one bar".to_string(),
            ));
        }

        if self.worker.is_some() {
            if !self.handle.is_finished() {
                return Err(SchedulerError::AlreadyRunning);
            }
            self.reclaim_output();
        }

        let output = self.output.take().ok_or(SchedulerError::OutputUnavailable)?;
        let shared = Arc::clone(&self.handle.shared);

        shared.stop_requested.store(false, Ordering::Release);
        shared.tick.store(0, Ordering::Release);
        shared.set_finished(false);
        shared.running.store(true, Ordering::Release);

        let observer = Arc::clone(&self.observer);
        let spawned = thread::Builder::new()
            .name("loopseq-scheduler".to_string())
            .spawn(move || run(shared, output, observer, bars));

        match spawned {
            Ok(worker) => {
                self.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                // The closure, and with it the output, is gone.
                self.handle.shared.running.store(false, Ordering::Release);
                self.handle.shared.set_finished(true);
                Err(SchedulerError::Spawn(e))
            }
        }
    }

    /// Request a stop and wait up to `timeout` for the thread to flush and exit.
    ///
    /// Returns `Ok(())` once the thread has been joined (or was never
    /// started).
    ///
    /// # Errors
    /// `StopTimeout` if the thread has not finished in time. The thread is
    /// left running toward its exit; calling `stop` again resumes waiting.
    pub fn stop(&mut self, timeout: Duration) -> Result<(), SchedulerError> {
        self.handle
            .shared
            .stop_requested
            .store(true, Ordering::Release);

        if self.worker.is_none() {
            return Ok(());
        }

        if !self.handle.shared.wait_finished(timeout) {
            error!(?timeout, "scheduler did not finish in time; notes may still sound");
            return Err(SchedulerError::StopTimeout(timeout));
        }

        self.reclaim_output();
        Ok(())
    }

    /// Join a finished worker and take back the output
    fn reclaim_output(&mut self) {
        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(output) => self.output = Some(output),
                Err(_) => error!("scheduler thread panicked during shutdown; output lost"),
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.stop(DROP_TIMEOUT) {
                warn!(error = %e, "scheduler dropped while still running");
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("bpm", &self.handle.bpm())
            .field("ppqn", &self.handle.ppqn())
            .field("tick", &self.handle.current_tick())
            .field("running", &self.handle.is_running())
            .finish()
    }
}

pub(crate) fn validate_bpm(bpm: f64) -> Result<(), SchedulerError> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(SchedulerError::InvalidSchedulerConfig(format!(
            "bpm {} must be a positive number",
            bpm
        )));
    }
    Ok(())
}

/// Body of the scheduler thread
fn run(
    shared: Arc<Shared>,
    mut output: Box<dyn MidiOutput>,
    observer: Arc<dyn SchedulerObserver>,
    bars: Option<u32>,
) -> Box<dyn MidiOutput> {
    let _finished = FinishGuard(&shared);
    let ppqn = shared.ppqn;
    let ticks_to_play = bars.map(|b| {
        BEATS_PER_BAR
            .saturating_mul(b as u64)
            .saturating_mul(ppqn as u64)
    });

    info!(bpm = shared.bpm(), ppqn, ?bars, "scheduler started");
    observer.on_start(shared.bpm(), ppqn);

    let mut engine = TickEngine::new(ppqn, shared.batch_size);
    let mut clock = TickClock::new(shared.bpm(), ppqn);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        while !shared.stop_requested.load(Ordering::Acquire) {
            let tick = clock.tick();

            let bpm = shared.bpm();
            if bpm != clock.bpm() {
                debug!(tick, bpm, "tempo change");
                clock.set_bpm(bpm);
            }

            let report = engine.process_tick(
                tick,
                &shared.input,
                &shared.sequences,
                output.as_mut(),
                observer.as_ref(),
            );
            observer.on_tick(tick, report.dispatched);

            if ticks_to_play.is_some_and(|limit| tick > limit) {
                debug!(tick, "bar limit reached");
                break;
            }

            let next = clock.wait_and_advance();
            shared.tick.store(next, Ordering::Release);
        }
    }));

    if outcome.is_err() {
        error!("scheduler loop panicked; silencing output");
    }

    let last_tick = clock.tick();
    let channels = shared.sequences.channels();
    let failed = silence(output.as_mut(), &channels);
    if failed > 0 {
        warn!(failed, "some shutdown messages were not sent");
    }

    info!(last_tick, pending = engine.pending_len(), "scheduler stopped");
    observer.on_finished(last_tick);

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MemoryOutput;

    fn fast_config() -> SchedulerConfig {
        // 2.5ms ticks, 16 ticks per bar
        SchedulerConfig::default().with_bpm(6000.0).with_ppqn(4)
    }

    #[test]
    fn test_scheduler_creation() {
        let scheduler = Scheduler::new(MemoryOutput::new(), SchedulerConfig::default()).unwrap();
        assert!(!scheduler.is_running());
        assert!(!scheduler.is_finished());
        assert_eq!(scheduler.current_tick(), 0);
        assert_eq!(
            scheduler.tick_duration(),
            Duration::from_secs_f64(60.0 / 120.0 / 480.0)
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SchedulerConfig::default().with_bpm(0.0);
        assert!(matches!(
            Scheduler::new(MemoryOutput::new(), config),
            Err(SchedulerError::InvalidSchedulerConfig(_))
        ));
    }

    #[test]
    fn test_set_bpm_recomputes_tick_duration() {
        let scheduler = Scheduler::new(MemoryOutput::new(), SchedulerConfig::default()).unwrap();
        scheduler.set_bpm(60.0).unwrap();
        assert_eq!(scheduler.handle().tick_seconds(), 60.0 / 60.0 / 480.0);
        assert!(scheduler.set_bpm(-1.0).is_err());
        assert!(scheduler.set_bpm(f64::INFINITY).is_err());
        assert_eq!(scheduler.handle().bpm(), 60.0);
    }

    #[test]
    fn test_submit_defaults_to_current_tick() {
        let scheduler = Scheduler::new(MemoryOutput::new(), SchedulerConfig::default()).unwrap();
        scheduler.submit(vec![0x90, 60, 100], None, 0);
        scheduler.submit(vec![0x90, 61, 100], Some(10), 5);
        assert_eq!(scheduler.handle().queued_events(), 2);

        let events = scheduler.handle.shared.input.drain_batch(10);
        assert_eq!(events[0].tick, 0);
        assert_eq!(events[1].tick, 15);
    }

    #[test]
    fn test_submit_delta_saturates() {
        let scheduler = Scheduler::new(MemoryOutput::new(), SchedulerConfig::default()).unwrap();
        scheduler.submit(vec![0x90, 60, 100], Some(u64::MAX), 1);

        let events = scheduler.handle.shared.input.drain_batch(10);
        assert_eq!(events[0].tick, u64::MAX);
    }

    #[test]
    fn test_stop_before_start_is_ok() {
        let mut scheduler = Scheduler::new(MemoryOutput::new(), fast_config()).unwrap();
        assert!(scheduler.stop(Duration::from_millis(10)).is_ok());
    }

    #[test]
    fn test_zero_bar_limit_rejected() {
        let mut scheduler = Scheduler::new(MemoryOutput::new(), fast_config()).unwrap();
        assert!(scheduler.start(Some(0)).is_err());
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_double_start_rejected() {
        let mut scheduler = Scheduler::new(MemoryOutput::new(), fast_config()).unwrap();
        scheduler.start(None).unwrap();
        assert!(matches!(
            scheduler.start(None),
            Err(SchedulerError::AlreadyRunning)
        ));
        scheduler.stop(Duration::from_secs(2)).unwrap();
        assert!(scheduler.is_finished());
    }

    #[test]
    fn test_restart_after_stop() {
        let output = MemoryOutput::new();
        let mut scheduler = Scheduler::new(output.clone(), fast_config()).unwrap();

        scheduler.start(Some(1)).unwrap();
        assert!(scheduler.handle().wait_until_finished(Duration::from_secs(2)));
        scheduler.stop(Duration::from_secs(1)).unwrap();
        let first = output.len();

        scheduler.start(Some(1)).unwrap();
        scheduler.stop(Duration::from_secs(2)).unwrap();
        assert!(output.len() > first);
    }
}
