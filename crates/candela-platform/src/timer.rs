//! High-Resolution Timers
//!
//! Monotonic frame clock and scoped timing spans.

use std::time::Instant;

/// Monotonic timer reporting milliseconds since creation
#[derive(Debug)]
pub struct HighResTimer {
    start: Instant,
}

impl HighResTimer {
    /// Create and start a new timer
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for HighResTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped timer that emits a tracing event on drop
pub struct ScopedTimer<'a> {
    name: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    /// Start timing a span called `name`
    pub fn traced(name: &'a str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        tracing::debug!(
            target: "timing",
            name = self.name,
            duration_us = duration.as_micros() as u64,
            "Timer completed"
        );
    }
}
