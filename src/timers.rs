//! Phase timing for engine evaluations.

use std::time::{Duration, Instant};

use crate::metrics::EvaluationPhases;

/// Adds the time between its creation and its drop to `slot`.
///
/// ```rust,ignore
/// let mut spent = Duration::ZERO;
/// {
///     let _timer = PhaseTimer::new(&mut spent);
///     // measured work
/// }
/// ```
pub struct PhaseTimer<'a> {
    start: Instant,
    slot: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub fn new(slot: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            slot,
        }
    }
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        *self.slot += self.start.elapsed();
    }
}

/// Accumulated phase durations of a single evaluation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EvaluationTimings {
    started: Instant,
    pub lock: Duration,
    pub authorize: Duration,
}

impl EvaluationTimings {
    pub fn start() -> Self {
        EvaluationTimings {
            started: Instant::now(),
            lock: Duration::ZERO,
            authorize: Duration::ZERO,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn phases(&self, total: Duration) -> EvaluationPhases {
        EvaluationPhases {
            lock_ms: millis(self.lock),
            authorize_ms: millis(self.authorize),
            total_ms: millis(total),
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
