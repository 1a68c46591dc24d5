// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Drum grid parser.
//!
//! A pattern is one row per instrument: a note name, whitespace, then one
//! character per step where `*` is a hit and anything else is a rest.
//!
//! ```text
//! D#2 -------------*--
//!  D2 -*-*-*-*-*-*-*-*
//! C#2 ----*-------*---
//!  C2 *-------*-------
//! ```

use super::GeneratorError;
use crate::music::name_to_midi;
use crate::sequencer::Note;

/// Standard General MIDI drum notes
pub mod gm_drums {
    pub const KICK: u8 = 36;
    pub const RIM: u8 = 37;
    pub const SNARE: u8 = 38;
    pub const CLAP: u8 = 39;
    pub const CLOSED_HAT: u8 = 42;
    pub const OPEN_HAT: u8 = 46;
    pub const CRASH: u8 = 49;
    pub const RIDE: u8 = 51;
}

/// Default hit velocity
pub const DEFAULT_VELOCITY: u8 = 100;

/// Parsed drum pattern
#[derive(Debug, Clone, PartialEq)]
pub struct DrumPattern {
    notes: Vec<Note>,
    steps: usize,
    step_length: f64,
}

impl DrumPattern {
    /// Parse a grid where each step lasts `step_length` bars
    pub fn parse(pattern: &str, step_length: f64) -> Result<Self, GeneratorError> {
        Self::parse_with_velocity(pattern, step_length, DEFAULT_VELOCITY)
    }

    /// Parse a grid, giving every hit `velocity`
    pub fn parse_with_velocity(
        pattern: &str,
        step_length: f64,
        velocity: u8,
    ) -> Result<Self, GeneratorError> {
        let mut notes = Vec::new();
        let mut steps = 0;

        for line in pattern.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (name, grid) = line
                .split_once(char::is_whitespace)
                .ok_or_else(|| GeneratorError::UnknownNote(line.to_string()))?;
            let value =
                name_to_midi(name).ok_or_else(|| GeneratorError::UnknownNote(name.to_string()))?;

            let grid = grid.trim_start();
            steps = steps.max(grid.chars().count());

            for (i, _) in grid.chars().enumerate().filter(|&(_, c)| c == '*') {
                notes.push(Note::new(value, i as f64 * step_length, step_length, velocity)?);
            }
        }

        if steps == 0 {
            return Err(GeneratorError::EmptyInput("drum pattern"));
        }

        Ok(Self {
            notes,
            steps,
            step_length,
        })
    }

    /// Hits, row by row
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Consume the pattern, keeping its notes
    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }

    /// Longest row, in steps
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Length of the longest row, in bars
    pub fn bars(&self) -> f64 {
        self.steps as f64 * self.step_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERN: &str = "
D#2 -------------*--
 D2 -*-*-*-*-*-*-*-*
C#2 ----*-------*---
 C2 *-------*-------
";

    #[test]
    fn test_parse_pattern() {
        let pattern = DrumPattern::parse(PATTERN, 1.0 / 16.0).unwrap();

        assert_eq!(pattern.steps(), 16);
        assert_eq!(pattern.bars(), 1.0);
        assert_eq!(pattern.notes().len(), 1 + 8 + 2 + 2);

        let clap = &pattern.notes()[0];
        assert_eq!(clap.value(), gm_drums::CLAP);
        assert_eq!(clap.position(), 13.0 / 16.0);
        assert_eq!(clap.length(), 1.0 / 16.0);
        assert_eq!(clap.velocity(), DEFAULT_VELOCITY);

        let kicks: Vec<_> = pattern
            .notes()
            .iter()
            .filter(|n| n.value() == gm_drums::KICK)
            .map(|n| n.position())
            .collect();
        assert_eq!(kicks, vec![0.0, 0.5]);
    }

    #[test]
    fn test_custom_velocity() {
        let pattern = DrumPattern::parse_with_velocity("C2 *---", 0.25, 80).unwrap();
        assert_eq!(pattern.notes()[0].velocity(), 80);
    }

    #[test]
    fn test_unknown_note_name() {
        assert!(matches!(
            DrumPattern::parse("Q2 *---", 0.25),
            Err(GeneratorError::UnknownNote(_))
        ));
    }

    #[test]
    fn test_empty_pattern() {
        assert!(DrumPattern::parse("\n\n", 0.25).is_err());
    }
}
