// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Cross-platform MIDI backend.
//!
//! This module provides a midir implementation of the `MidiOutput` trait,
//! allowing the sequencer to send MIDI messages to any port the host exposes
//! (Core MIDI, ALSA, WinMM).

use anyhow::{anyhow, Result};
use midir::{MidiOutput as MidirClient, MidiOutputConnection};

use super::MidiOutput;

const CLIENT_NAME: &str = "loopseq";

/// midir output connected to a single port.
pub struct MidirOutput {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidirOutput {
    /// Create a new output connected to the specified destination.
    ///
    /// # Arguments
    /// * `destination_index` - Index of the port in the system's MIDI output list
    ///
    /// # Returns
    /// * `Ok(MidirOutput)` on success
    /// * `Err` if the client could not be created or the port does not exist
    pub fn new(destination_index: usize) -> Result<Self> {
        let client = MidirClient::new(CLIENT_NAME)
            .map_err(|e| anyhow!("Failed to create MIDI client: {}", e))?;

        let ports = client.ports();
        if destination_index >= ports.len() {
            return Err(anyhow!(
                "MIDI destination {} not found (only {} available)",
                destination_index,
                ports.len()
            ));
        }

        let port = &ports[destination_index];
        let port_name = client
            .port_name(port)
            .unwrap_or_else(|_| format!("Unknown {}", destination_index));

        let connection = client
            .connect(port, "loopseq-out")
            .map_err(|e| anyhow!("Failed to connect to '{}': {}", port_name, e))?;

        Ok(Self {
            connection,
            port_name,
        })
    }

    /// Create a new output connected to a destination by name.
    ///
    /// # Arguments
    /// * `name` - Partial name to match against destination names
    pub fn new_by_name(name: &str) -> Result<Self> {
        let destinations = list_destinations()?;
        let index = destinations
            .iter()
            .position(|(_, n)| n.to_lowercase().contains(&name.to_lowercase()))
            .ok_or_else(|| anyhow!("No MIDI destination matching '{}' found", name))?;

        Self::new(destinations[index].0)
    }

    /// Name of the connected port
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl MidiOutput for MidirOutput {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        self.connection
            .send(message)
            .map_err(|e| anyhow!("Failed to send MIDI message: {}", e))
    }
}

/// List all available MIDI destinations.
///
/// # Returns
/// A vector of (index, name) tuples.
pub fn list_destinations() -> Result<Vec<(usize, String)>> {
    let client = MidirClient::new(CLIENT_NAME)
        .map_err(|e| anyhow!("Failed to create MIDI client: {}", e))?;

    Ok(client
        .ports()
        .iter()
        .enumerate()
        .map(|(i, port)| {
            let name = client
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown {}", i));
            (i, name)
        })
        .collect())
}

/// Print all available MIDI destinations to stdout.
pub fn print_destinations() -> Result<()> {
    let destinations = list_destinations()?;
    if destinations.is_empty() {
        println!("No MIDI destinations found.");
    } else {
        println!("Available MIDI destinations:");
        for (i, name) in destinations {
            println!("  {}: {}", i, name);
        }
    }
    Ok(())
}
