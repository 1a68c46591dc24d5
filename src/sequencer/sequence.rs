// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Notes and looping sequences.
//!
//! A [`Sequence`] holds notes positioned in bar fractions and restarts every
//! `bars` bars. Expansion turns it into concrete note-on/note-off events
//! anchored at the restart tick.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Event, SchedulerError};
use crate::midi::{self, messages};
use crate::music::midi_to_name;
use crate::timing::BEATS_PER_BAR;

/// Furthest a note may end from its sequence's restart, in bars
pub const MAX_NOTE_BARS: f64 = u32::MAX as f64;

/// A single note within a sequence.
///
/// Positions and lengths are fractions of a bar: `position = 0.25` starts on
/// beat two, `length = 1.0 / 16.0` lasts a sixteenth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    value: u8,
    position: f64,
    length: f64,
    velocity: u8,
}

impl Note {
    /// Create a validated note.
    ///
    /// # Errors
    /// `InvalidSequenceConfig` if the pitch is above 127, the velocity is
    /// outside 1-127, the position is negative, the length is not positive,
    /// or the note ends more than [`MAX_NOTE_BARS`] bars after the restart.
    pub fn new(value: u8, position: f64, length: f64, velocity: u8) -> Result<Self, SchedulerError> {
        if value > messages::DATA_MAX {
            return Err(SchedulerError::InvalidSequenceConfig(format!(
                "note value {} is outside 0-127",
                value
            )));
        }
        if velocity == 0 || velocity > messages::DATA_MAX {
            return Err(SchedulerError::InvalidSequenceConfig(format!(
                "velocity {} is outside 1-127",
                velocity
            )));
        }
        if !position.is_finite() || position < 0.0 {
            return Err(SchedulerError::InvalidSequenceConfig(format!(
                "position {} must be a non-negative bar fraction",
                position
            )));
        }
        if !length.is_finite() || length <= 0.0 {
            return Err(SchedulerError::InvalidSequenceConfig(format!(
                "length {} must be a positive bar fraction",
                length
            )));
        }
        if position + length > MAX_NOTE_BARS {
            return Err(SchedulerError::InvalidSequenceConfig(format!(
                "note ending at bar {} is beyond the {} bar limit",
                position + length,
                MAX_NOTE_BARS
            )));
        }

        Ok(Self {
            value,
            position,
            length,
            velocity,
        })
    }

    /// MIDI note number
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Offset from the start of the sequence, in bars
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Duration in bars
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Velocity (1-127)
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Offset of the note-on from the restart tick
    pub fn on_offset(&self, ppqn: u32) -> u64 {
        bars_to_ticks(self.position, ppqn)
    }

    /// Offset of the note-off from the restart tick.
    ///
    /// One tick before the note's nominal end, so a release never lands on
    /// the same tick as a note-on that starts where this note ends. Never
    /// earlier than the note-on.
    pub fn off_offset(&self, ppqn: u32) -> u64 {
        let on = self.on_offset(ppqn);
        on.saturating_add(bars_to_ticks(self.length, ppqn).saturating_sub(1))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N({},{:.2}-{:.2})",
            midi_to_name(self.value),
            self.position,
            self.position + self.length
        )
    }
}

/// Convert a bar fraction into ticks, rounded to the nearest tick
pub fn bars_to_ticks(bars: f64, ppqn: u32) -> u64 {
    (bars * (BEATS_PER_BAR * ppqn as u64) as f64).round() as u64
}

/// A looping collection of notes on one MIDI channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    channel: u8,
    bars: u32,
    notes: Vec<Note>,
}

impl Sequence {
    /// Create an empty sequence.
    ///
    /// # Errors
    /// `InvalidSequenceConfig` if the channel is above 15 or `bars` is zero.
    pub fn new(channel: u8, bars: u32) -> Result<Self, SchedulerError> {
        if channel >= messages::CHANNELS {
            return Err(SchedulerError::InvalidSequenceConfig(format!(
                "channel {} is outside 0-15",
                channel
            )));
        }
        if bars == 0 {
            return Err(SchedulerError::InvalidSequenceConfig(
                "a sequence must span at least one bar".to_string(),
            ));
        }

        Ok(Self {
            channel,
            bars,
            notes: Vec::new(),
        })
    }

    /// Builder form of [`Sequence::add_notes`]
    pub fn with_notes(mut self, notes: impl IntoIterator<Item = Note>) -> Self {
        self.add_notes(notes);
        self
    }

    /// Append notes to the sequence
    pub fn add_notes(&mut self, notes: impl IntoIterator<Item = Note>) {
        self.notes.extend(notes);
    }

    /// MIDI channel (0-15)
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Loop length in bars
    pub fn bars(&self) -> u32 {
        self.bars
    }

    /// Notes in insertion order
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Loop length in ticks
    pub fn period_ticks(&self, ppqn: u32) -> u64 {
        BEATS_PER_BAR
            .saturating_mul(self.bars as u64)
            .saturating_mul(ppqn as u64)
    }

    /// Whether the sequence restarts at `tick`
    pub fn restarts_at(&self, tick: u64, ppqn: u32) -> bool {
        tick % self.period_ticks(ppqn) == 0
    }

    /// Expand every note into a note-on/note-off pair anchored at `tick`.
    ///
    /// Events are returned note by note, on before off, in note order.
    pub fn expand(&self, tick: u64, ppqn: u32) -> Vec<Event> {
        let mut events = Vec::with_capacity(self.notes.len() * 2);
        for note in &self.notes {
            events.push(Event::new(
                tick.saturating_add(note.on_offset(ppqn)),
                midi::note_on(self.channel, note.value, note.velocity),
            ));
            events.push(Event::new(
                tick.saturating_add(note.off_offset(ppqn)),
                midi::note_off(self.channel, note.value),
            ));
        }
        events
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let notes: Vec<String> = self.notes.iter().map(|n| n.to_string()).collect();
        write!(f, "S({})", notes.join(" "))
    }
}

/// Identifier of a registered sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(String);

impl SequenceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SequenceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SequenceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_validation() {
        assert!(Note::new(60, 0.0, 0.25, 100).is_ok());
        assert!(Note::new(128, 0.0, 0.25, 100).is_err());
        assert!(Note::new(60, 0.0, 0.25, 0).is_err());
        assert!(Note::new(60, 0.0, 0.25, 128).is_err());
        assert!(Note::new(60, -0.5, 0.25, 100).is_err());
        assert!(Note::new(60, 0.0, 0.0, 100).is_err());
        assert!(Note::new(60, f64::NAN, 0.25, 100).is_err());
    }

    #[test]
    fn test_note_beyond_bar_limit_rejected() {
        assert!(matches!(
            Note::new(60, 1e30, 0.5, 100),
            Err(SchedulerError::InvalidSequenceConfig(_))
        ));
        assert!(Note::new(60, 0.0, f64::MAX, 100).is_err());
        assert!(Note::new(60, MAX_NOTE_BARS - 1.0, 0.5, 100).is_ok());
    }

    #[test]
    fn test_expansion_saturates_instead_of_overflowing() {
        let note = Note::new(60, MAX_NOTE_BARS - 1.0, 0.5, 100).unwrap();
        let seq = Sequence::new(0, u32::MAX).unwrap().with_notes([note]);

        assert_eq!(seq.period_ticks(u32::MAX), u64::MAX);
        let events = seq.expand(u64::MAX - 10, u32::MAX);
        assert_eq!(events[0].tick, u64::MAX);
        assert_eq!(events[1].tick, u64::MAX);
    }

    #[test]
    fn test_sequence_validation() {
        assert!(Sequence::new(0, 1).is_ok());
        assert!(Sequence::new(15, 4).is_ok());
        assert!(matches!(
            Sequence::new(16, 1),
            Err(SchedulerError::InvalidSequenceConfig(_))
        ));
        assert!(Sequence::new(0, 0).is_err());
    }

    #[test]
    fn test_period_and_restart() {
        let seq = Sequence::new(0, 2).unwrap();
        assert_eq!(seq.period_ticks(480), 3840);
        assert!(seq.restarts_at(0, 480));
        assert!(!seq.restarts_at(1920, 480));
        assert!(seq.restarts_at(3840, 480));
    }

    #[test]
    fn test_whole_bar_note_expansion() {
        let seq = Sequence::new(0, 1)
            .unwrap()
            .with_notes([Note::new(60, 0.0, 1.0, 100).unwrap()]);

        let events = seq.expand(1920, 480);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].tick, 1920);
        assert_eq!(events[0].message, vec![0x90, 60, 100]);
        assert_eq!(events[1].tick, 1920 + 1919);
        assert_eq!(events[1].message, vec![0x80, 60, 0]);
    }

    #[test]
    fn test_positioned_note_expansion() {
        let seq = Sequence::new(3, 1)
            .unwrap()
            .with_notes([Note::new(64, 0.25, 1.0 / 16.0, 90).unwrap()]);

        let events = seq.expand(0, 24);
        // quarter of a 96-tick bar, a sixteenth lasts 6 ticks
        assert_eq!(events[0].tick, 24);
        assert_eq!(events[0].message, vec![0x93, 64, 90]);
        assert_eq!(events[1].tick, 24 + 5);
    }

    #[test]
    fn test_tiny_note_off_never_precedes_on() {
        let note = Note::new(60, 0.5, 0.001, 100).unwrap();
        assert_eq!(note.on_offset(24), 48);
        assert_eq!(note.off_offset(24), 48);
    }

    #[test]
    fn test_add_notes_appends() {
        let mut seq = Sequence::new(1, 1).unwrap();
        seq.add_notes([Note::new(60, 0.0, 0.5, 100).unwrap()]);
        seq.add_notes([Note::new(62, 0.5, 0.5, 100).unwrap()]);
        assert_eq!(seq.notes().len(), 2);
        assert_eq!(seq.notes()[1].value(), 62);
    }

    #[test]
    fn test_display() {
        let seq = Sequence::new(0, 1)
            .unwrap()
            .with_notes([Note::new(60, 0.0, 0.25, 100).unwrap()]);
        assert_eq!(seq.to_string(), "S(N(C4,0.00-0.25))");
    }
}
