// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sequencer core for scheduling and playing MIDI events.
//!
//! This module provides the core sequencing infrastructure:
//! - Notes and looping sequences expanded on bar boundaries
//! - A multi-producer input queue and a tick-ordered pending store
//! - A per-tick engine with bounded input draining
//! - A threaded scheduler with cooperative stop and a shutdown flush

pub mod engine;
pub mod error;
pub mod event;
pub mod observer;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod sequence;

pub use engine::{silence, TickEngine, TickReport};
pub use error::SchedulerError;
pub use event::Event;
pub use observer::{NoopObserver, SchedulerObserver, TickLog};
pub use queue::{InputQueue, PendingStore};
pub use registry::SequenceRegistry;
pub use scheduler::{Scheduler, SchedulerHandle};
pub use sequence::{bars_to_ticks, Note, Sequence, SequenceId, MAX_NOTE_BARS};

use serde::{Deserialize, Serialize};

use crate::timing::{tick_seconds, BEATS_PER_BAR};

/// Scheduler settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Tempo in BPM
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    /// Ticks per quarter note
    #[serde(default = "default_ppqn")]
    pub ppqn: u32,
    /// Maximum input-queue events admitted per tick
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_bpm() -> f64 {
    120.0
}
fn default_ppqn() -> u32 {
    480
}
fn default_batch_size() -> usize {
    100
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            bpm: default_bpm(),
            ppqn: default_ppqn(),
            batch_size: default_batch_size(),
        }
    }
}

impl SchedulerConfig {
    /// Set the tempo
    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    /// Set the resolution
    pub fn with_ppqn(mut self, ppqn: u32) -> Self {
        self.ppqn = ppqn;
        self
    }

    /// Set the per-tick input batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Check every field is in range
    pub fn validate(&self) -> Result<(), SchedulerError> {
        scheduler::validate_bpm(self.bpm)?;
        if self.ppqn == 0 {
            return Err(SchedulerError::InvalidSchedulerConfig(
                "ppqn must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(SchedulerError::InvalidSchedulerConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Seconds per tick
    pub fn tick_seconds(&self) -> f64 {
        tick_seconds(self.bpm, self.ppqn)
    }

    /// Ticks per bar
    pub fn ticks_per_bar(&self) -> u64 {
        BEATS_PER_BAR * self.ppqn as u64
    }
}
