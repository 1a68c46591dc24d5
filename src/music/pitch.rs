// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch classes and note names.
//!
//! Note names use scientific pitch notation with middle C as `C4` (MIDI 60),
//! so `C-1` is 0 and `G9` is 127.

use std::fmt;

use serde::{Deserialize, Serialize};

/// MIDI note number type (0-127)
pub type MidiNote = u8;

/// Pitch classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

impl PitchClass {
    /// All pitch classes in chromatic order
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Semitones above C (0-11)
    pub fn semitone(self) -> u8 {
        self as u8
    }

    /// Pitch class of a semitone offset (wraps modulo 12)
    pub fn from_semitone(semitone: u8) -> Self {
        PitchClass::ALL[(semitone % 12) as usize]
    }

    /// Parse a pitch class name (e.g., "C", "C#", "Db", "f#")
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_uppercase();
        match s.as_str() {
            "C" | "B#" => Some(PitchClass::C),
            "C#" | "DB" => Some(PitchClass::Cs),
            "D" => Some(PitchClass::D),
            "D#" | "EB" => Some(PitchClass::Ds),
            "E" | "FB" => Some(PitchClass::E),
            "F" | "E#" => Some(PitchClass::F),
            "F#" | "GB" => Some(PitchClass::Fs),
            "G" => Some(PitchClass::G),
            "G#" | "AB" => Some(PitchClass::Gs),
            "A" => Some(PitchClass::A),
            "A#" | "BB" => Some(PitchClass::As),
            "B" | "CB" => Some(PitchClass::B),
            _ => None,
        }
    }

    /// Transpose by semitones
    pub fn transpose(self, semitones: i8) -> Self {
        let pc = (self.semitone() as i8 + semitones).rem_euclid(12) as u8;
        PitchClass::from_semitone(pc)
    }

    /// MIDI note of this pitch class in `octave`, if in range
    pub fn in_octave(self, octave: i8) -> Option<MidiNote> {
        let value = (octave as i16 + 1) * 12 + self.semitone() as i16;
        (0..=127).contains(&value).then_some(value as MidiNote)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        };
        f.write_str(name)
    }
}

/// Parse a note name with octave (e.g., "C4", "D#2", "Bb-1") into a MIDI note
pub fn name_to_midi(name: &str) -> Option<MidiNote> {
    let name = name.trim();
    let split = name
        .char_indices()
        .find(|&(i, c)| i > 0 && (c.is_ascii_digit() || c == '-'))
        .map(|(i, _)| i)?;
    let (pitch, octave) = name.split_at(split);
    let octave: i8 = octave.parse().ok()?;
    PitchClass::parse(pitch)?.in_octave(octave)
}

/// Name of a MIDI note, using sharps (e.g., 60 -> "C4", 39 -> "D#2")
pub fn midi_to_name(note: MidiNote) -> String {
    let octave = note as i16 / 12 - 1;
    format!("{}{}", PitchClass::from_semitone(note % 12), octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_class_parse() {
        assert_eq!(PitchClass::parse("C"), Some(PitchClass::C));
        assert_eq!(PitchClass::parse("db"), Some(PitchClass::Cs));
        assert_eq!(PitchClass::parse("Bb"), Some(PitchClass::As));
        assert_eq!(PitchClass::parse("H"), None);
    }

    #[test]
    fn test_transpose() {
        assert_eq!(PitchClass::C.transpose(7), PitchClass::G);
        assert_eq!(PitchClass::C.transpose(-1), PitchClass::B);
        assert_eq!(PitchClass::A.transpose(3), PitchClass::C);
    }

    #[test]
    fn test_name_to_midi() {
        assert_eq!(name_to_midi("C4"), Some(60));
        assert_eq!(name_to_midi("A4"), Some(69));
        assert_eq!(name_to_midi("C2"), Some(36));
        assert_eq!(name_to_midi("C#2"), Some(37));
        assert_eq!(name_to_midi("D#2"), Some(39));
        assert_eq!(name_to_midi(" Eb3 "), Some(51));
        assert_eq!(name_to_midi("C-1"), Some(0));
        assert_eq!(name_to_midi("G9"), Some(127));
        assert_eq!(name_to_midi("G#9"), None);
        assert_eq!(name_to_midi("C"), None);
        assert_eq!(name_to_midi("X4"), None);
    }

    #[test]
    fn test_midi_to_name() {
        assert_eq!(midi_to_name(60), "C4");
        assert_eq!(midi_to_name(39), "D#2");
        assert_eq!(midi_to_name(0), "C-1");
        assert_eq!(midi_to_name(127), "G9");
    }
}
