// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory utilities.
//!
//! Pitch classes and note-name conversion used by the generators and the
//! song file format.

pub mod pitch;

pub use pitch::{midi_to_name, name_to_midi, MidiNote, PitchClass};
