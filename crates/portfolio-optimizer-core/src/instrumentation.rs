//! Injectable timing instrumentation.
//!
//! Callers that want per-call timings hand a [`TimingHook`] to the optimizer
//! instead of relying on a process-wide collector.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Receives the wall-clock duration of an instrumented operation.
pub trait TimingHook: Send + Sync {
    fn record(&self, operation: &str, elapsed: Duration);
}

/// Emits each timing as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTimingHook;

impl TimingHook for TracingTimingHook {
    fn record(&self, operation: &str, elapsed: Duration) {
        tracing::info!(
            operation,
            elapsed_us = elapsed.as_micros() as u64,
            "operation timed"
        );
    }
}

/// Keeps every recorded timing in memory, in call order.
#[derive(Debug, Default)]
pub struct RecordingTimingHook {
    samples: Mutex<Vec<(String, Duration)>>,
}

impl RecordingTimingHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<(String, Duration)> {
        match self.samples.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TimingHook for RecordingTimingHook {
    fn record(&self, operation: &str, elapsed: Duration) {
        let mut guard = match self.samples.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((operation.to_string(), elapsed));
    }
}

/// Run `f`, report its duration to `hook` (if any), and return its value.
///
/// The duration is reported whether `f` succeeds or fails.
pub fn timed<T>(hook: Option<&dyn TimingHook>, operation: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let value = f();
    if let Some(hook) = hook {
        hook.record(operation, start.elapsed());
    }
    value
}
