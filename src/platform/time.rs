//! Time sources and the fixed-step frame driver

use std::cell::Cell;

use crate::consts::{MAX_FRAME_DELTA_MS, MAX_SUBSTEPS, SIM_DT_MS};

/// Source of the current time in milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Real wall-clock time (Unix epoch milliseconds)
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl Clock for WallClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Hand-driven clock for tests and replays
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

/// Converts variable host frame timestamps into a count of fixed ticks.
#[derive(Debug, Clone, Default)]
pub struct FrameDriver {
    last_frame_ms: Option<f64>,
    accumulator: f64,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the host timestamp of a new frame; returns how many fixed ticks are due.
    ///
    /// The first frame only establishes the baseline. Long gaps (tab in the
    /// background) are clamped so the sim does not fast-forward.
    pub fn advance(&mut self, now_ms: f64) -> u32 {
        let Some(last) = self.last_frame_ms.replace(now_ms) else {
            return 0;
        };

        let delta = (now_ms - last).clamp(0.0, MAX_FRAME_DELTA_MS);
        self.accumulator += delta;

        let mut steps = 0;
        while self.accumulator >= SIM_DT_MS && steps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT_MS;
            steps += 1;
        }
        // Drop whatever the substep cap left behind
        if steps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT_MS);
        }
        steps
    }

    /// Forget the baseline (after the host was suspended)
    pub fn reset(&mut self) {
        self.last_frame_ms = None;
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_is_baseline() {
        let mut driver = FrameDriver::new();
        assert_eq!(driver.advance(1000.0), 0);
        assert_eq!(driver.advance(1000.0 + SIM_DT_MS + 0.5), 1);
    }

    #[test]
    fn test_accumulates_partial_frames() {
        let mut driver = FrameDriver::new();
        driver.advance(0.0);
        assert_eq!(driver.advance(SIM_DT_MS * 0.6), 0);
        assert_eq!(driver.advance(SIM_DT_MS * 1.2), 1);
        assert_eq!(driver.advance(SIM_DT_MS * 3.1), 2);
    }

    #[test]
    fn test_long_gap_is_capped() {
        let mut driver = FrameDriver::new();
        driver.advance(0.0);
        assert_eq!(driver.advance(60_000.0), MAX_SUBSTEPS);
        // Backlog was discarded, next normal frame runs normally
        assert!(driver.advance(60_000.0 + SIM_DT_MS) <= 2);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(5.0);
        clock.advance(10.0);
        assert_eq!(clock.now_ms(), 15.0);
        clock.set(1.0);
        assert_eq!((&clock).now_ms(), 1.0);
    }
}
