// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord symbols and chord progressions.
//!
//! Chords are voiced with a bass note and upper voices. After the first chord
//! each upper voice moves to the octave closest to the previous voicing.

use std::fmt;

use super::GeneratorError;
use crate::music::{MidiNote, PitchClass};
use crate::sequencer::Note;

/// Velocity used for progression notes
const CHORD_VELOCITY: u8 = 100;

/// Chord qualities understood by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
    Sixth,
    MinorSixth,
    Seventh,
    MajorSeventh,
    MinorSeventh,
    HalfDiminished,
    DiminishedSeventh,
    AddNine,
    Ninth,
}

impl ChordQuality {
    /// Parse the quality suffix of a chord symbol ("", "m", "maj7", ...)
    pub fn parse(suffix: &str) -> Option<Self> {
        let quality = match suffix {
            "" | "maj" | "M" => ChordQuality::Major,
            "m" | "min" | "-" => ChordQuality::Minor,
            "dim" | "o" => ChordQuality::Diminished,
            "aug" | "+" => ChordQuality::Augmented,
            "sus2" => ChordQuality::Sus2,
            "sus4" | "sus" => ChordQuality::Sus4,
            "6" => ChordQuality::Sixth,
            "m6" => ChordQuality::MinorSixth,
            "7" => ChordQuality::Seventh,
            "maj7" | "M7" => ChordQuality::MajorSeventh,
            "m7" | "min7" => ChordQuality::MinorSeventh,
            "m7b5" | "m7-5" => ChordQuality::HalfDiminished,
            "dim7" | "o7" => ChordQuality::DiminishedSeventh,
            "add9" => ChordQuality::AddNine,
            "9" => ChordQuality::Ninth,
            _ => return None,
        };
        Some(quality)
    }

    /// Semitone offsets from the root
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
            ChordQuality::Sixth => &[0, 4, 7, 9],
            ChordQuality::MinorSixth => &[0, 3, 7, 9],
            ChordQuality::Seventh => &[0, 4, 7, 10],
            ChordQuality::MajorSeventh => &[0, 4, 7, 11],
            ChordQuality::MinorSeventh => &[0, 3, 7, 10],
            ChordQuality::HalfDiminished => &[0, 3, 6, 10],
            ChordQuality::DiminishedSeventh => &[0, 3, 6, 9],
            ChordQuality::AddNine => &[0, 4, 7, 14],
            ChordQuality::Ninth => &[0, 4, 7, 10, 14],
        }
    }
}

/// A parsed chord symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    root: PitchClass,
    quality: ChordQuality,
    symbol: String,
}

impl Chord {
    /// Parse a chord symbol such as "C", "Cm", "Ab", "F#m7", "Bbmaj7"
    pub fn parse(symbol: &str) -> Result<Self, GeneratorError> {
        let symbol = symbol.trim();
        let root_len = match symbol.chars().nth(1) {
            Some('#') | Some('b') => 2,
            _ => 1,
        };
        if symbol.len() < root_len || !symbol.is_char_boundary(root_len) {
            return Err(GeneratorError::UnknownChord(symbol.to_string()));
        }

        let (root, suffix) = symbol.split_at(root_len);
        let root =
            PitchClass::parse(root).ok_or_else(|| GeneratorError::UnknownChord(symbol.to_string()))?;
        let quality = ChordQuality::parse(suffix)
            .ok_or_else(|| GeneratorError::UnknownChord(symbol.to_string()))?;

        Ok(Self {
            root,
            quality,
            symbol: symbol.to_string(),
        })
    }

    pub fn root(&self) -> PitchClass {
        self.root
    }

    pub fn quality(&self) -> ChordQuality {
        self.quality
    }

    /// Pitch classes of the chord, root first
    pub fn components(&self) -> Vec<PitchClass> {
        self.quality
            .intervals()
            .iter()
            .map(|&i| self.root.transpose((i % 12) as i8))
            .collect()
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Voice a chord as `(bass, upper voices)`.
///
/// Without a previous voicing the upper voices sit in `chord_octave`.
/// Otherwise each voice takes the octave (1-8) closest to any note of
/// `previous`. The bass is the root in `bass_octave`, or `None` if `bass`
/// is false.
pub fn chord_to_notes(
    chord: &Chord,
    previous: Option<&[MidiNote]>,
    bass: bool,
    bass_octave: i8,
    chord_octave: i8,
) -> (Option<MidiNote>, Vec<MidiNote>) {
    let upper = match previous {
        Some(previous) if !previous.is_empty() => chord
            .components()
            .into_iter()
            .filter_map(|pc| {
                (1..=8)
                    .filter_map(|octave| pc.in_octave(octave))
                    .min_by_key(|&candidate| distance_to_nearest(candidate, previous))
            })
            .collect(),
        _ => chord
            .components()
            .into_iter()
            .filter_map(|pc| pc.in_octave(chord_octave))
            .collect(),
    };

    let bass_note = if bass {
        chord.root.in_octave(bass_octave)
    } else {
        None
    };

    (bass_note, upper)
}

fn distance_to_nearest(note: MidiNote, others: &[MidiNote]) -> u8 {
    others
        .iter()
        .map(|&other| note.abs_diff(other))
        .min()
        .unwrap_or(u8::MAX)
}

/// A sequence of chords spread evenly over a number of bars
#[derive(Debug, Clone, PartialEq)]
pub struct ChordProgression {
    chords: Vec<Chord>,
    bars: u32,
}

impl ChordProgression {
    /// Parse a whitespace-separated progression such as "Cm Ab Bb Gm"
    pub fn new(chords: &str, bars: u32) -> Result<Self, GeneratorError> {
        let chords = chords
            .split_whitespace()
            .map(Chord::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if chords.is_empty() {
            return Err(GeneratorError::EmptyInput("chord progression"));
        }
        if bars == 0 {
            return Err(GeneratorError::EmptyInput("progression bars"));
        }
        Ok(Self { chords, bars })
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn bars(&self) -> u32 {
        self.bars
    }

    /// Length of each chord in bars
    pub fn chord_length(&self) -> f64 {
        self.bars as f64 / self.chords.len() as f64
    }

    /// One group of notes per chord, each held for the chord's full length
    pub fn to_notes(
        &self,
        bass: bool,
        bass_octave: i8,
        chord_octave: i8,
    ) -> Result<Vec<Vec<Note>>, GeneratorError> {
        let length = self.chord_length();
        let mut previous: Option<Vec<MidiNote>> = None;
        let mut groups = Vec::with_capacity(self.chords.len());

        for (i, chord) in self.chords.iter().enumerate() {
            let (bass_note, upper) =
                chord_to_notes(chord, previous.as_deref(), bass, bass_octave, chord_octave);
            let position = i as f64 * length;

            let mut notes = Vec::with_capacity(upper.len() + 1);
            for value in bass_note.into_iter().chain(upper.iter().copied()) {
                notes.push(Note::new(value, position, length, CHORD_VELOCITY)?);
            }
            groups.push(notes);
            previous = Some(upper);
        }

        Ok(groups)
    }

    /// Every note of the default voicing (bass in octave 2, chords in octave 4)
    pub fn quick_notes(&self) -> Result<Vec<Note>, GeneratorError> {
        Ok(self.to_notes(true, 2, 4)?.into_iter().flatten().collect())
    }
}
