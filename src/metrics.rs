//! Vendor-agnostic metrics collection via a pluggable sink.
//!
//! The engine reports every evaluation and reload to a process-wide
//! [`MetricsSink`]. Nothing is recorded until a host installs one with
//! [`set_sink`], so the library stays free of any particular backend
//! (Prometheus, OpenTelemetry, StatsD and so on).
//!
//! ```ignore
//! use treetop_eval::metrics::{MetricsSink, EvaluationStats, ReloadStats};
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! struct Counter {
//!     denies: AtomicU64,
//! }
//!
//! impl MetricsSink for Counter {
//!     fn on_evaluation(&self, stats: &EvaluationStats) {
//!         if !stats.allowed {
//!             self.denies.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn on_reload(&self, stats: &ReloadStats) {
//!         eprintln!("{} policies loaded", stats.policies);
//!     }
//! }
//!
//! treetop_eval::metrics::set_sink(Arc::new(Counter { denies: AtomicU64::new(0) }));
//! ```

use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime};
use tracing::warn;

/// Snapshot of one engine evaluation, passed to [`MetricsSink::on_evaluation`].
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationStats {
    /// Wall-clock time for the whole evaluation, lock acquisition included.
    pub duration: Duration,
    /// Whether the decision was Allow. Always false for undecided partial requests.
    pub allowed: bool,
    /// Principal uid in canonical form, `?` when unknown.
    pub principal_id: String,
    /// Action uid in canonical form, `?` when unknown.
    pub action_id: String,
    /// Number of policies that failed to evaluate.
    pub errors: usize,
}

/// Evaluation time broken down by phase, in milliseconds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationPhases {
    /// Waiting for the policy set read lock.
    pub lock_ms: f64,
    /// Running every policy through the authorizer.
    pub authorize_ms: f64,
    /// Total evaluation time.
    pub total_ms: f64,
}

impl EvaluationPhases {
    /// Time not covered by a measured phase.
    pub fn overhead_ms(&self) -> f64 {
        self.total_ms - (self.lock_ms + self.authorize_ms)
    }
}

/// Emitted after a policy set has been swapped in.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadStats {
    pub reload_time: SystemTime,
    /// Size of the new policy set.
    pub policies: usize,
}

/// Consumer of engine metrics.
///
/// Called synchronously on the evaluation path, possibly from many threads at
/// once, so implementations must be cheap and thread-safe.
pub trait MetricsSink: Send + Sync {
    fn on_evaluation(&self, stats: &EvaluationStats);

    fn on_reload(&self, stats: &ReloadStats);

    /// Per-phase timings. Ignored unless overridden.
    fn on_evaluation_phases(&self, _stats: &EvaluationStats, _phases: &EvaluationPhases) {}
}

static SINK: OnceLock<Arc<dyn MetricsSink>> = OnceLock::new();

/// Install the global metrics sink.
///
/// The sink can be set once; later calls are ignored with a warning.
pub fn set_sink(sink: Arc<dyn MetricsSink>) {
    if SINK.set(sink).is_err() {
        warn!(
            event = "Metrics",
            phase = "SetSink",
            "Metrics sink was already initialized. Ignoring subsequent set_sink call."
        );
    }
}

pub(crate) fn record_evaluation(stats: &EvaluationStats, phases: &EvaluationPhases) {
    if let Some(sink) = SINK.get() {
        sink.on_evaluation(stats);
        sink.on_evaluation_phases(stats, phases);
    }
}

pub(crate) fn record_reload(policies: usize) {
    if let Some(sink) = SINK.get() {
        sink.on_reload(&ReloadStats {
            reload_time: SystemTime::now(),
            policies,
        });
    }
}
