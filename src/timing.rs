// ==============================================================================
// timing.rs - Command Timing
// ==============================================================================
// Description: Per-command stopwatch used in progress and summary logs
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

use std::fmt;
use std::time::{Duration, Instant};

/// Started once per command and handed to whatever reports progress
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start()
    }
}

/// Renders as `[12.34567s]`
impl fmt::Display for Stopwatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.5}s]", self.elapsed().as_secs_f64())
    }
}
