// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! In-memory MIDI output.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use super::MidiOutput;

type FailurePredicate = Arc<dyn Fn(&[u8]) -> bool + Send + Sync>;

/// Records every message it is asked to send.
///
/// Clones share the same log, so a test can hand one clone to the scheduler
/// and inspect the other.
#[derive(Clone, Default)]
pub struct MemoryOutput {
    messages: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_when: Option<FailurePredicate>,
}

impl MemoryOutput {
    /// Create an empty recording output
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an output that rejects any message matching `predicate`.
    ///
    /// Rejected messages are not recorded.
    pub fn failing_when<F>(predicate: F) -> Self
    where
        F: Fn(&[u8]) -> bool + Send + Sync + 'static,
    {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
            fail_when: Some(Arc::new(predicate)),
        }
    }

    /// Snapshot of all recorded messages, in send order
    pub fn messages(&self) -> Vec<Vec<u8>> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Number of recorded messages
    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all recorded messages
    pub fn clear(&self) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.clear();
        }
    }
}

impl MidiOutput for MemoryOutput {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        if let Some(ref fail_when) = self.fail_when {
            if fail_when(message) {
                return Err(anyhow!("Output rejected message {:02X?}", message));
            }
        }

        self.messages
            .lock()
            .map_err(|_| anyhow!("Output log lock poisoned"))?
            .push(message.to_vec());
        Ok(())
    }
}

impl std::fmt::Debug for MemoryOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryOutput")
            .field("messages", &self.len())
            .field("failing", &self.fail_when.is_some())
            .finish()
    }
}
