// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tick clock implementation.
//!
//! Converts wall-clock time into a discrete tick counter at the rate implied
//! by a BPM and a PPQN resolution. Deadlines are absolute
//! (`anchor + n * tick_duration`), so time spent doing per-tick work never
//! accumulates into drift: an overrun tick simply leaves less (or no) sleep
//! for the ticks that follow.

use std::time::{Duration, Instant};

/// Beats (quarter notes) per bar. Sequences loop on bar boundaries.
pub const BEATS_PER_BAR: u64 = 4;

/// Seconds per tick: `60 / bpm / ppqn`
pub fn tick_seconds(bpm: f64, ppqn: u32) -> f64 {
    60.0 / bpm / ppqn as f64
}

/// Tick clock with absolute deadlines
#[derive(Debug, Clone)]
pub struct TickClock {
    /// Current tempo in BPM
    bpm: f64,
    /// Ticks per quarter note
    ppqn: u32,
    /// Seconds per tick, derived from `bpm` and `ppqn`
    tick_seconds: f64,
    /// Current tick
    tick: u64,
    /// Wall-clock instant at which `anchor_tick` began
    anchor: Instant,
    /// Tick the anchor refers to; moves on tempo changes
    anchor_tick: u64,
}

impl TickClock {
    /// Create a clock at tick 0 anchored at `Instant::now()`
    pub fn new(bpm: f64, ppqn: u32) -> Self {
        Self::starting_at(bpm, ppqn, Instant::now())
    }

    /// Create a clock at tick 0 anchored at `start`
    pub fn starting_at(bpm: f64, ppqn: u32, start: Instant) -> Self {
        Self {
            bpm,
            ppqn,
            tick_seconds: tick_seconds(bpm, ppqn),
            tick: 0,
            anchor: start,
            anchor_tick: 0,
        }
    }

    /// Get the current tempo in BPM
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Get the resolution in ticks per quarter note
    pub fn ppqn(&self) -> u32 {
        self.ppqn
    }

    /// Get the current tick
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Seconds per tick at the current tempo
    pub fn tick_seconds(&self) -> f64 {
        self.tick_seconds
    }

    /// Duration of one tick at the current tempo
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(self.tick_seconds)
    }

    /// Ticks in one bar
    pub fn ticks_per_bar(&self) -> u64 {
        BEATS_PER_BAR * self.ppqn as u64
    }

    /// Change tempo.
    ///
    /// The anchor moves to the start of the current tick, so ticks already
    /// elapsed keep their old spacing and later ticks use the new one.
    pub fn set_bpm(&mut self, bpm: f64) {
        if bpm == self.bpm {
            return;
        }
        self.anchor = self.deadline_for(self.tick);
        self.anchor_tick = self.tick;
        self.bpm = bpm;
        self.tick_seconds = tick_seconds(bpm, self.ppqn);
    }

    /// Wall-clock instant at which `tick` begins
    pub fn deadline_for(&self, tick: u64) -> Instant {
        let offset = tick.saturating_sub(self.anchor_tick) as f64 * self.tick_seconds;
        self.anchor + Duration::from_secs_f64(offset)
    }

    /// Wall-clock instant at which the next tick begins
    pub fn next_deadline(&self) -> Instant {
        self.deadline_for(self.tick + 1)
    }

    /// Time left until the next tick, zero when already late
    pub fn time_until_next_tick(&self, now: Instant) -> Duration {
        self.next_deadline().saturating_duration_since(now)
    }

    /// Move to the next tick without waiting
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Sleep until the next tick boundary, then advance to it.
    ///
    /// Returns the new tick. Never sleeps when the deadline has passed.
    pub fn wait_and_advance(&mut self) -> u64 {
        let remaining = self.time_until_next_tick(Instant::now());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
        self.advance()
    }

    /// Whether `tick` falls on a bar boundary
    pub fn is_bar_start(&self, tick: u64) -> bool {
        tick % self.ticks_per_bar() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_seconds_formula() {
        assert_eq!(tick_seconds(120.0, 480), 60.0 / 120.0 / 480.0);
        assert!((tick_seconds(6000.0, 4) - 0.0025).abs() < 1e-12);
    }

    #[test]
    fn test_clock_creation() {
        let clock = TickClock::new(120.0, 480);
        assert_eq!(clock.bpm(), 120.0);
        assert_eq!(clock.ppqn(), 480);
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.ticks_per_bar(), 1920);
    }

    #[test]
    fn test_bar_duration() {
        let clock = TickClock::new(120.0, 480);
        let bar = clock.tick_seconds() * clock.ticks_per_bar() as f64;
        // 120 BPM: one 4/4 bar lasts two seconds
        assert!((bar - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_deadlines_are_absolute() {
        let start = Instant::now();
        let clock = TickClock::starting_at(120.0, 480, start);

        let d = clock.deadline_for(400);
        let expected = start + Duration::from_secs_f64(400.0 * clock.tick_seconds());
        assert_eq!(d, expected);
    }

    #[test]
    fn test_set_bpm_rebases_at_current_tick() {
        let start = Instant::now();
        let mut clock = TickClock::starting_at(120.0, 480, start);
        for _ in 0..100 {
            clock.advance();
        }

        let before = clock.deadline_for(100);
        clock.set_bpm(60.0);

        assert_eq!(clock.tick_seconds(), 60.0 / 60.0 / 480.0);
        // The current tick keeps its start time
        let after = clock.deadline_for(100);
        let diff = if after > before { after - before } else { before - after };
        assert!(diff < Duration::from_micros(1));
        // The next tick is one new-tempo tick later
        let next = clock.next_deadline() - after;
        assert!((next.as_secs_f64() - 1.0 / 480.0).abs() < 1e-6);
    }

    #[test]
    fn test_late_clock_does_not_sleep() {
        let start = Instant::now() - Duration::from_secs(1);
        let clock = TickClock::starting_at(120.0, 480, start);
        assert_eq!(clock.time_until_next_tick(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn test_wait_and_advance() {
        let mut clock = TickClock::new(6000.0, 4); // 2.5ms ticks
        let begin = Instant::now();
        clock.wait_and_advance();
        clock.wait_and_advance();
        assert_eq!(clock.tick(), 2);
        assert!(begin.elapsed() >= Duration::from_millis(4));
    }

    #[test]
    fn test_bar_start() {
        let clock = TickClock::new(120.0, 24);
        assert!(clock.is_bar_start(0));
        assert!(clock.is_bar_start(96));
        assert!(!clock.is_bar_start(95));
    }
}
