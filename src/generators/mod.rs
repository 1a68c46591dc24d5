// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note generators.
//!
//! Pure functions turning symbolic input (chord names, drum grids) into
//! [`Note`](crate::sequencer::Note)s ready to be added to a sequence.

pub mod arpeggio;
pub mod chord;
pub mod drums;

pub use arpeggio::{arpeggiate, ArpMode, ArpSettings, MAX_ARP_NOTES};
pub use chord::{chord_to_notes, Chord, ChordProgression, ChordQuality};
pub use drums::{gm_drums, DrumPattern};

use thiserror::Error;

use crate::sequencer::SchedulerError;

/// Errors raised while generating notes
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// A chord symbol could not be parsed
    #[error("Unknown chord: {0}")]
    UnknownChord(String),

    /// A note name could not be parsed
    #[error("Unknown note name: {0}")]
    UnknownNote(String),

    /// Nothing to generate from
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    /// Generator settings out of range
    #[error("Invalid generator settings: {0}")]
    InvalidSettings(String),

    /// A generated note was out of range
    #[error(transparent)]
    InvalidNote(#[from] SchedulerError),
}
