// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI output abstraction layer.
//!
//! The scheduler only ever talks to a [`MidiOutput`]. Hardware ports are
//! reached through midir, and [`MemoryOutput`] records messages for dry runs
//! and tests.

pub mod memory;
pub mod midir_backend;

use anyhow::Result;

pub use memory::MemoryOutput;
pub use midir_backend::{list_destinations, print_destinations, MidirOutput};

/// Trait for MIDI output implementations.
///
/// Outputs are driven from a single scheduler thread, so implementations only
/// need to be `Send`.
pub trait MidiOutput: Send {
    /// Send a MIDI message immediately.
    ///
    /// # Arguments
    /// * `message` - Raw MIDI bytes (e.g., `[0x90, 60, 127]` for Note On)
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if the message could not be sent
    fn send(&mut self, message: &[u8]) -> Result<()>;
}

impl<T: MidiOutput + ?Sized> MidiOutput for Box<T> {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        (**self).send(message)
    }
}

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;

    // Channel Mode controller numbers (sent with CONTROL_CHANGE)
    pub const ALL_SOUND_OFF: u8 = 120;
    pub const RESET_ALL_CONTROLLERS: u8 = 121;
    pub const ALL_NOTES_OFF: u8 = 123;

    /// Highest valid data byte (note number, velocity, controller value)
    pub const DATA_MAX: u8 = 0x7F;

    /// Number of MIDI channels
    pub const CHANNELS: u8 = 16;
}

/// Build a Note On message
pub fn note_on(channel: u8, note: u8, velocity: u8) -> Vec<u8> {
    vec![
        messages::NOTE_ON | (channel & 0x0F),
        note & messages::DATA_MAX,
        velocity & messages::DATA_MAX,
    ]
}

/// Build a Note Off message (release velocity 0)
pub fn note_off(channel: u8, note: u8) -> Vec<u8> {
    vec![messages::NOTE_OFF | (channel & 0x0F), note & messages::DATA_MAX, 0]
}

/// Build a Control Change message
pub fn control_change(channel: u8, controller: u8, value: u8) -> Vec<u8> {
    vec![
        messages::CONTROL_CHANGE | (channel & 0x0F),
        controller & messages::DATA_MAX,
        value & messages::DATA_MAX,
    ]
}
