// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tick-accurate MIDI loop sequencer.
//!
//! Register looping [`Sequence`]s with a [`Scheduler`], start it, and a
//! background thread expands them on bar boundaries and sends their notes to
//! a [`MidiOutput`] at the right tick. Stopping always silences every
//! channel the scheduler has used.
//!
//! ```no_run
//! use std::time::Duration;
//! use loopseq::{MemoryOutput, Note, Scheduler, SchedulerConfig, Sequence};
//!
//! let output = MemoryOutput::new();
//! let mut scheduler = Scheduler::new(output.clone(), SchedulerConfig::default())?;
//!
//! let bass = Sequence::new(0, 1)?.with_notes([Note::new(36, 0.0, 0.5, 100)?]);
//! scheduler.set_sequence(bass, None);
//!
//! scheduler.start(Some(2))?;
//! scheduler.handle().wait_until_finished(Duration::from_secs(10));
//! scheduler.stop(Duration::from_secs(5))?;
//! # Ok::<(), loopseq::SchedulerError>(())
//! ```

pub mod config;
pub mod generators;
pub mod midi;
pub mod music;
pub mod sequencer;
pub mod timing;

pub use midi::{MemoryOutput, MidiOutput, MidirOutput};
pub use sequencer::{
    Event, Note, Scheduler, SchedulerConfig, SchedulerError, SchedulerHandle, SchedulerObserver,
    Sequence, SequenceId, TickLog,
};
pub use timing::TickClock;
