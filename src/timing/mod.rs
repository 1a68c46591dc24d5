// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing and clock module.
//!
//! This module provides the tick clock that paces the scheduler thread.

pub mod clock;

pub use clock::{tick_seconds, TickClock, BEATS_PER_BAR};
