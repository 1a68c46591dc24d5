// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scheduler error types.

use std::time::Duration;

use thiserror::Error;

use super::SequenceId;

/// Errors raised by the scheduler and its building blocks
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A note or sequence was built with out-of-range values
    #[error("Invalid sequence configuration: {0}")]
    InvalidSequenceConfig(String),

    /// Tempo, resolution, batch size or bar limit out of range
    #[error("Invalid scheduler configuration: {0}")]
    InvalidSchedulerConfig(String),

    /// The output rejected a message. Contained per event; never stops playback.
    #[error("Failed to send {message:02X?} to MIDI output: {source}")]
    SinkDispatch {
        message: Vec<u8>,
        #[source]
        source: anyhow::Error,
    },

    /// The scheduler thread did not confirm shutdown in time; notes may still sound
    #[error("Scheduler did not finish within {0:?}")]
    StopTimeout(Duration),

    /// `start` was called while the scheduler thread is still running
    #[error("Scheduler is already running")]
    AlreadyRunning,

    /// No sequence is registered under the id
    #[error("Unknown sequence: {0}")]
    UnknownSequence(SequenceId),

    /// The output was lost when the scheduler thread panicked
    #[error("MIDI output is no longer available")]
    OutputUnavailable,

    /// The scheduler thread could not be spawned
    #[error("Failed to spawn scheduler thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_error_messages() {
        let err = SchedulerError::SinkDispatch {
            message: vec![0x90, 60, 100],
            source: anyhow!("port closed"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to send [90, 3C, 64] to MIDI output: port closed"
        );

        let err = SchedulerError::StopTimeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Scheduler did not finish within 250ms");
    }
}
