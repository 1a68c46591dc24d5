// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song file configuration.
//!
//! A song file sets the scheduler's tempo and resolution and describes the
//! sequences to register. Each sequence collects notes from any mix of
//! explicit notes, a chord progression and a drum grid.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::generators::{arpeggiate, ArpMode, ArpSettings, ChordProgression, DrumPattern};
use crate::music::name_to_midi;
use crate::sequencer::{Note, SchedulerConfig, Sequence, SequenceId};

/// Root configuration for a song
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SongFile {
    /// Song metadata and scheduler settings
    #[serde(default)]
    pub song: SongConfig,
    /// Sequence definitions
    #[serde(default)]
    pub sequences: Vec<SequenceConfig>,
}

impl SongFile {
    /// Load a song configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read song file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a song configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML song file")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize song to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write song file: {:?}", path.as_ref()))
    }

    /// Scheduler settings, validated
    pub fn scheduler_config(&self) -> Result<SchedulerConfig> {
        let config = SchedulerConfig {
            bpm: self.song.bpm,
            ppqn: self.song.ppqn,
            batch_size: self.song.batch_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build every sequence, paired with its configured id
    pub fn build_sequences(&self) -> Result<Vec<(Option<SequenceId>, Sequence)>> {
        self.sequences
            .iter()
            .enumerate()
            .map(|(i, config)| {
                let sequence = config
                    .build()
                    .with_context(|| format!("Invalid sequence #{}", i + 1))?;
                Ok((config.id.clone().map(SequenceId::from), sequence))
            })
            .collect()
    }
}

/// Song-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SongConfig {
    /// Song name
    #[serde(default = "default_name")]
    pub name: String,
    /// Tempo in BPM
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    /// Ticks per quarter note
    #[serde(default = "default_ppqn")]
    pub ppqn: u32,
    /// Maximum input events admitted per tick
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Bars to play before stopping (unbounded if absent)
    #[serde(default)]
    pub bars: Option<u32>,
}

fn default_name() -> String {
    "Untitled".to_string()
}
fn default_bpm() -> f64 {
    SchedulerConfig::default().bpm
}
fn default_ppqn() -> u32 {
    SchedulerConfig::default().ppqn
}
fn default_batch_size() -> usize {
    SchedulerConfig::default().batch_size
}

impl Default for SongConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            bpm: default_bpm(),
            ppqn: default_ppqn(),
            batch_size: default_batch_size(),
            bars: None,
        }
    }
}

/// Sequence configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceConfig {
    /// Sequence id (generated if absent)
    #[serde(default)]
    pub id: Option<String>,
    /// MIDI channel (0-15)
    #[serde(default)]
    pub channel: u8,
    /// Loop length in bars
    #[serde(default = "default_bars")]
    pub bars: u32,
    /// Explicit notes
    #[serde(default)]
    pub notes: Vec<NoteConfig>,
    /// Chord progression spread over the sequence
    #[serde(default)]
    pub chords: Option<ChordsConfig>,
    /// Drum grid
    #[serde(default)]
    pub drums: Option<DrumsConfig>,
}

fn default_bars() -> u32 {
    1
}

impl SequenceConfig {
    /// Build the sequence: explicit notes, then chords, then drums
    pub fn build(&self) -> Result<Sequence> {
        let mut sequence = Sequence::new(self.channel, self.bars)?;

        for note in &self.notes {
            sequence.add_notes([note.build()?]);
        }
        if let Some(ref chords) = self.chords {
            sequence.add_notes(chords.build(self.bars)?);
        }
        if let Some(ref drums) = self.drums {
            sequence.add_notes(drums.build()?);
        }

        Ok(sequence)
    }
}

/// A pitch given as a MIDI number or a note name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PitchValue {
    /// MIDI note number
    Number(u8),
    /// Note name (e.g., "C4", "D#2")
    Name(String),
}

impl PitchValue {
    pub fn to_midi(&self) -> Result<u8> {
        match self {
            PitchValue::Number(n) => Ok(*n),
            PitchValue::Name(name) => {
                name_to_midi(name).ok_or_else(|| anyhow!("Unknown note name: {}", name))
            }
        }
    }
}

/// A single explicit note
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteConfig {
    pub pitch: PitchValue,
    /// Start, in bars from the sequence start
    #[serde(default)]
    pub position: f64,
    /// Length in bars
    pub length: f64,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

fn default_velocity() -> u8 {
    100
}

impl NoteConfig {
    pub fn build(&self) -> Result<Note> {
        Ok(Note::new(
            self.pitch.to_midi()?,
            self.position,
            self.length,
            self.velocity,
        )?)
    }
}

/// How a chord progression is played
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChordStyle {
    /// Each chord held for its full length
    #[default]
    Pad,
    /// Each chord arpeggiated over its length
    Arpeggio,
}

/// Chord progression content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChordsConfig {
    /// Whitespace-separated chord symbols, e.g. "Cm Ab Bb Gm"
    pub progression: String,
    #[serde(default)]
    pub style: ChordStyle,
    /// Include a bass note (pad style only)
    #[serde(default = "default_true")]
    pub bass: bool,
    #[serde(default = "default_bass_octave")]
    pub bass_octave: i8,
    #[serde(default = "default_chord_octave")]
    pub chord_octave: i8,
    /// Arpeggio pattern
    #[serde(default)]
    pub mode: ArpMode,
    /// Arpeggio step, in bars
    #[serde(default = "default_note_length")]
    pub note_length: f64,
    /// Arpeggio gate, in bars
    #[serde(default = "default_gate_length")]
    pub gate_length: f64,
    /// Arpeggio base velocity
    #[serde(default = "default_arp_velocity")]
    pub velocity: u8,
    /// Seed for random arpeggios
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_true() -> bool {
    true
}
fn default_bass_octave() -> i8 {
    2
}
fn default_chord_octave() -> i8 {
    4
}
fn default_note_length() -> f64 {
    ArpSettings::default().note_length
}
fn default_gate_length() -> f64 {
    ArpSettings::default().gate_length
}
fn default_arp_velocity() -> u8 {
    ArpSettings::default().velocity
}

impl ChordsConfig {
    /// Generate notes for a progression spread over `bars`
    pub fn build(&self, bars: u32) -> Result<Vec<Note>> {
        let progression = ChordProgression::new(&self.progression, bars)?;

        match self.style {
            ChordStyle::Pad => Ok(progression
                .to_notes(self.bass, self.bass_octave, self.chord_octave)?
                .into_iter()
                .flatten()
                .collect()),
            ChordStyle::Arpeggio => {
                let settings = ArpSettings {
                    note_length: self.note_length,
                    gate_length: self.gate_length,
                    mode: self.mode,
                    velocity: self.velocity,
                    seed: self.seed,
                };
                let length = progression.chord_length();
                let groups = progression.to_notes(false, self.bass_octave, self.chord_octave)?;

                let mut notes = Vec::new();
                for (i, group) in groups.iter().enumerate() {
                    let pitches: Vec<u8> = group.iter().map(|n| n.value()).collect();
                    notes.extend(arpeggiate(&pitches, length, i as f64 * length, &settings)?);
                }
                Ok(notes)
            }
        }
    }
}

/// Drum grid content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrumsConfig {
    /// One row per instrument, `*` marks a hit
    pub pattern: String,
    /// Step length in bars
    #[serde(default = "default_step")]
    pub step: f64,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

fn default_step() -> f64 {
    1.0 / 16.0
}

impl DrumsConfig {
    pub fn build(&self) -> Result<Vec<Note>> {
        Ok(DrumPattern::parse_with_velocity(&self.pattern, self.step, self.velocity)?.into_notes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SONG: &str = r#"
song:
  name: "Endless"
  bpm: 100
  ppqn: 240

sequences:
  - id: arp
    channel: 0
    bars: 4
    chords:
      progression: "Cm Ab Bb Gm"
      style: arpeggio
      mode: up
  - id: pad
    channel: 1
    bars: 4
    chords:
      progression: "Cm Ab Bb Gm"
  - id: drums
    channel: 2
    bars: 1
    drums:
      step: 0.0625
      pattern: |
        D#2 -------------*--
         D2 -*-*-*-*-*-*-*-*
        C#2 ----*-------*---
         C2 *-------*-------
  - channel: 3
    notes:
      - { pitch: "C4", position: 0, length: 0.5 }
      - { pitch: 67, position: 0.5, length: 0.5, velocity: 80 }
"#;

    #[test]
    fn test_parse_song_config() {
        let song = SongFile::from_yaml(SONG).unwrap();

        assert_eq!(song.song.name, "Endless");
        assert_eq!(song.song.bpm, 100.0);
        assert_eq!(song.song.ppqn, 240);
        assert_eq!(song.song.batch_size, 100);
        assert_eq!(song.song.bars, None);
        assert_eq!(song.sequences.len(), 4);
        assert_eq!(song.sequences[0].chords.as_ref().unwrap().style, ChordStyle::Arpeggio);
    }

    #[test]
    fn test_build_sequences() {
        let song = SongFile::from_yaml(SONG).unwrap();
        let sequences = song.build_sequences().unwrap();

        let (id, arp) = &sequences[0];
        assert_eq!(id.as_ref().map(|i| i.as_str()), Some("arp"));
        // 4 chords x 16 sixteenths
        assert_eq!(arp.notes().len(), 64);

        let (_, pad) = &sequences[1];
        assert_eq!(pad.notes().len(), 16);
        assert_eq!(pad.channel(), 1);

        let (_, drums) = &sequences[2];
        assert_eq!(drums.notes().len(), 13);

        let (id, explicit) = &sequences[3];
        assert!(id.is_none());
        assert_eq!(explicit.bars(), 1);
        assert_eq!(explicit.notes()[0].value(), 60);
        assert_eq!(explicit.notes()[1].velocity(), 80);
    }

    #[test]
    fn test_scheduler_config() {
        let song = SongFile::from_yaml(SONG).unwrap();
        let config = song.scheduler_config().unwrap();
        assert_eq!(config.bpm, 100.0);
        assert_eq!(config.ppqn, 240);
        assert_eq!(config.batch_size, 100);
    }

    #[test]
    fn test_invalid_values_fail_fast() {
        let song = SongFile::from_yaml("song:\n  bpm: 0\n").unwrap();
        assert!(song.scheduler_config().is_err());

        let song = SongFile::from_yaml(
            "sequences:\n  - channel: 16\n    notes: [{ pitch: 60, length: 1 }]\n",
        )
        .unwrap();
        assert!(song.build_sequences().is_err());

        let song =
            SongFile::from_yaml("sequences:\n  - notes: [{ pitch: \"Z9\", length: 1 }]\n").unwrap();
        assert!(song.build_sequences().is_err());
    }

    #[test]
    fn test_zero_arpeggio_step_is_an_error() {
        let song = SongFile::from_yaml(
            r#"
sequences:
  - channel: 0
    chords:
      progression: "Cm Ab"
      style: arpeggio
      note_length: 0
"#,
        )
        .unwrap();

        let err = song.build_sequences().unwrap_err();
        assert!(format!("{:#}", err).contains("note length"));
    }

    #[test]
    fn test_far_note_is_an_error() {
        let song = SongFile::from_yaml(
            "sequences:\n  - channel: 0\n    notes:\n      - { pitch: 60, position: 1.0e30, length: 0.5 }\n",
        )
        .unwrap();
        assert!(song.build_sequences().is_err());
    }

    #[test]
    fn test_default_values() {
        let song = SongFile::from_yaml("song:\n  name: Minimal\n").unwrap();
        assert_eq!(song.song.bpm, 120.0);
        assert_eq!(song.song.ppqn, 480);
        assert!(song.sequences.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.yaml");

        let song = SongFile::from_yaml(SONG).unwrap();
        song.save(&path).unwrap();
        let loaded = SongFile::load(&path).unwrap();

        assert_eq!(song, loaded);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.yaml");
        fs::write(&path, "this is not valid yaml: [").unwrap();

        assert!(SongFile::load(&path).is_err());
        assert!(SongFile::load(dir.path().join("missing.yaml")).is_err());
    }
}
