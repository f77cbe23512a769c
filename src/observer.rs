//! # Observability hooks for pool activity.
//!
//! [`Observe`] receives task-level and resize-level telemetry. All methods
//! default to no-ops, so an implementation overrides only what it needs; the
//! pool installs [`NopObserver`] when none is supplied and never branches on
//! observer presence.
//!
//! Hooks are invoked synchronously from worker tasks (and, for
//! [`worker_count_changed`](Observe::worker_count_changed), under the pool
//! lock), so implementations must be cheap and thread-safe.

use std::time::Duration;

use crate::error::TaskError;

/// Telemetry hooks invoked by the pool.
///
/// No ordering is promised across workers; for a single input the sequence
/// is always `task_started` → task invocation → `task_finished` → result
/// send.
pub trait Observe: Send + Sync + 'static {
    /// Called just before a worker invokes the task for a dequeued input.
    fn task_started(&self) {}

    /// Called after the task returns (or panics), with the elapsed wall
    /// time and the error, if any.
    fn task_finished(&self, elapsed: Duration, error: Option<&TaskError>) {
        let _ = (elapsed, error);
    }

    /// Called under the pool lock after a resize commits a new target.
    ///
    /// Reports the post-resize target, not the physical population, which
    /// may lag while shrink signals are in flight. Implementations must not
    /// call back into the pool from this hook: the pool lock is held and a
    /// re-entrant `resize` or `current_workers` would deadlock.
    fn worker_count_changed(&self, workers: usize) {
        let _ = workers;
    }
}

/// Observer that ignores every event.
pub(crate) struct NopObserver;

impl Observe for NopObserver {}

/// Base observer that logs events to stdout.
///
/// Enabled via the `logging` feature. Useful for demos and debugging; not
/// intended for production use.
#[cfg(feature = "logging")]
pub struct LogWriter;

#[cfg(feature = "logging")]
impl Observe for LogWriter {
    fn task_started(&self) {
        println!("[task-started]");
    }

    fn task_finished(&self, elapsed: Duration, error: Option<&TaskError>) {
        match error {
            Some(err) => println!("[task-finished] elapsed={elapsed:?} err={err}"),
            None => println!("[task-finished] elapsed={elapsed:?}"),
        }
    }

    fn worker_count_changed(&self, workers: usize) {
        println!("[workers] count={workers}");
    }
}
