// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Arpeggiator.
//!
//! Spreads a set of pitches over a span of bars as a run of short notes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::GeneratorError;
use crate::music::MidiNote;
use crate::sequencer::Note;

/// Most notes a single `arpeggiate` call will produce
pub const MAX_ARP_NOTES: usize = 1 << 16;

/// Arpeggio pattern types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArpMode {
    /// Play notes ascending, velocity rising with pitch
    #[default]
    Up,
    /// Play notes descending, velocity falling with pitch
    Down,
    /// Random note selection with random velocity
    Random,
}

/// Arpeggiator settings
#[derive(Debug, Clone, PartialEq)]
pub struct ArpSettings {
    /// Spacing between note starts, in bars
    pub note_length: f64,
    /// Sounding length of each note, in bars
    pub gate_length: f64,
    /// Pattern
    pub mode: ArpMode,
    /// Centre velocity for `Up`/`Down`
    pub velocity: u8,
    /// Seed for `Random`; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for ArpSettings {
    fn default() -> Self {
        Self {
            note_length: 1.0 / 16.0,
            gate_length: 3.0 / 64.0,
            mode: ArpMode::Up,
            velocity: 90,
            seed: None,
        }
    }
}

/// Arpeggiate `pitches` over `bars` bars starting at `offset` (in bars).
///
/// `Up` and `Down` cycle through the sorted pitches; velocity ramps across
/// the cycle from `velocity - 40` upward. `Random` picks pitches and
/// velocities (70-105) at random.
pub fn arpeggiate(
    pitches: &[MidiNote],
    bars: f64,
    offset: f64,
    settings: &ArpSettings,
) -> Result<Vec<Note>, GeneratorError> {
    if pitches.is_empty() {
        return Err(GeneratorError::EmptyInput("arpeggio pitches"));
    }

    let mut sorted = pitches.to_vec();
    sorted.sort_unstable();
    if settings.mode == ArpMode::Down {
        sorted.reverse();
    }

    if !settings.note_length.is_finite() || settings.note_length <= 0.0 {
        return Err(GeneratorError::InvalidSettings(format!(
            "note length {} must be a positive bar fraction",
            settings.note_length
        )));
    }
    if !settings.gate_length.is_finite() || settings.gate_length <= 0.0 {
        return Err(GeneratorError::InvalidSettings(format!(
            "gate length {} must be a positive bar fraction",
            settings.gate_length
        )));
    }
    if !bars.is_finite() || bars < 0.0 {
        return Err(GeneratorError::InvalidSettings(format!(
            "span of {} bars must be a non-negative number",
            bars
        )));
    }

    let steps = (bars / settings.note_length).floor();
    if steps > MAX_ARP_NOTES as f64 {
        return Err(GeneratorError::InvalidSettings(format!(
            "{} steps exceeds the {} note limit",
            steps, MAX_ARP_NOTES
        )));
    }
    let count = steps as usize;
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut notes = Vec::with_capacity(count);
    for i in 0..count {
        let position = offset + i as f64 * settings.note_length;
        let (value, velocity) = match settings.mode {
            ArpMode::Up | ArpMode::Down => {
                let step = i % sorted.len();
                let ramp = (step as f64 / sorted.len() as f64 * 80.0) as i32;
                let velocity = (settings.velocity as i32 - 40 + ramp).clamp(1, 127) as u8;
                (sorted[step], velocity)
            }
            ArpMode::Random => {
                let value = sorted[rng.gen_range(0..sorted.len())];
                (value, rng.gen_range(70..=105))
            }
        };
        notes.push(Note::new(value, position, settings.gate_length, velocity)?);
    }

    Ok(notes)
}
