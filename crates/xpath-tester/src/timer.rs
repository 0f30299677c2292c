use std::time::{Duration, Instant};

use tracing::debug;

use crate::diagnostic::Phase;

/// Wall-clock time spent in each phase of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimings {
    pub parse: Duration,
    pub compile: Duration,
    pub evaluate: Duration,
}

impl PhaseTimings {
    pub fn total(&self) -> Duration {
        self.parse + self.compile + self.evaluate
    }
}

/// Stopwatch for a single phase. Each phase gets its own, so one phase's
/// duration never includes another's.
#[derive(Debug)]
pub struct PhaseTimer {
    phase: Phase,
    started: Instant,
}

impl PhaseTimer {
    pub fn start(phase: Phase) -> Self {
        Self { phase, started: Instant::now() }
    }

    pub fn stop(self) -> Duration {
        let elapsed = self.started.elapsed();
        debug!(phase = %self.phase, elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX), "phase finished");
        elapsed
    }
}
