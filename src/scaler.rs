//! # Metric-driven autoscaler sidecar.
//!
//! [`AutoScaler`] samples an external metric on a fixed interval and drives
//! the size of a [`Pool`] through a [`ScalePolicy`], clamped to configured
//! bounds.
//!
//! ## Evaluation (one tick)
//! ```text
//! fetcher() ──► metric
//! pool.current_workers() ──► current
//! policy.desired(current, metric) ──► desired
//! desired.clamp(min, max) ──► target
//! target != current ──► pool.resize(target)
//! ```
//!
//! ## Rules
//! - Fetchers are assumed infallible and fast; a slow fetcher degrades the
//!   tick cadence.
//! - Resizes are issued on a fresh, never-cancelled token: scaling is a
//!   control-plane action and survives data-plane cancellation.
//! - A panicking policy or fetcher skips that tick, never the loop.
//! - [`stop`](AutoScaler::stop) waits for the loop to exit and never
//!   touches the pool. Stopped is terminal.

use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{ConfigError, RuntimeError},
    policy::ScalePolicy,
    pool::Pool,
};

/// Metric sampler: returns the current value of the driving signal
/// (e.g. CPU %, memory bytes, queue depth).
pub type MetricFn = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Lifecycle: `Idle --start--> Running --stop--> Stopped`.
enum ScalerState {
    Idle,
    Running {
        cancel: CancellationToken,
        evaluator: JoinHandle<()>,
    },
    Stopped,
}

/// Periodically resizes a pool from a sampled metric.
///
/// Created inert; call [`start`](AutoScaler::start). The default policy is
/// [`ScalePolicy::Identity`], which never changes the size — install a real
/// policy with [`set_policy`](AutoScaler::set_policy).
pub struct AutoScaler<I, R> {
    pool: Arc<Pool<I, R>>,
    interval: Duration,
    min: usize,
    max: usize,
    fetcher: MetricFn,
    policy: Arc<Mutex<ScalePolicy>>,
    state: Mutex<ScalerState>,
}

impl<I, R> AutoScaler<I, R>
where
    I: Send + 'static,
    R: Send + 'static,
{
    /// Creates the sidecar; it does not start sampling until
    /// [`start`](AutoScaler::start).
    ///
    /// Rejects a zero `interval` and inverted bounds.
    pub fn new(
        pool: Arc<Pool<I, R>>,
        interval: Duration,
        min: usize,
        max: usize,
        fetcher: impl Fn() -> f64 + Send + Sync + 'static,
    ) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if min > max {
            return Err(ConfigError::BoundsInverted { min, max });
        }

        Ok(Self {
            pool,
            interval,
            min,
            max,
            fetcher: Arc::new(fetcher),
            policy: Arc::new(Mutex::new(ScalePolicy::default())),
            state: Mutex::new(ScalerState::Idle),
        })
    }

    /// Replaces the scaling policy. Takes effect on the next tick.
    pub fn set_policy(&self, policy: ScalePolicy) {
        *self
            .policy
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = policy;
    }

    /// Starts the evaluation loop.
    ///
    /// The first evaluation happens one full interval after this call.
    /// Must be called within a tokio runtime; at most once.
    pub fn start(&self) -> Result<(), RuntimeError> {
        let mut state = self.lock_state();
        match *state {
            ScalerState::Idle => {}
            ScalerState::Running { .. } => return Err(RuntimeError::AlreadyStarted),
            ScalerState::Stopped => return Err(RuntimeError::ScalerStopped),
        }

        let cancel = CancellationToken::new();
        let evaluator = Evaluator {
            pool: Arc::clone(&self.pool),
            policy: Arc::clone(&self.policy),
            fetcher: Arc::clone(&self.fetcher),
            interval: self.interval,
            min: self.min,
            max: self.max,
        };
        let evaluator = tokio::spawn(evaluator.run(cancel.clone()));

        *state = ScalerState::Running { cancel, evaluator };
        Ok(())
    }

    /// Stops the evaluation loop and waits until it has exited.
    ///
    /// After this returns no further resizes will be made by this scaler.
    /// Idempotent; does not stop the pool. A stopped scaler cannot be
    /// started again.
    pub async fn stop(&self) {
        let previous = {
            let mut state = self.lock_state();
            mem::replace(&mut *state, ScalerState::Stopped)
        };

        if let ScalerState::Running { cancel, evaluator } = previous {
            cancel.cancel();
            let _ = evaluator.await;
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ScalerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The periodic activity behind a running scaler.
struct Evaluator<I, R> {
    pool: Arc<Pool<I, R>>,
    policy: Arc<Mutex<ScalePolicy>>,
    fetcher: MetricFn,
    interval: Duration,
    min: usize,
    max: usize,
}

impl<I, R> Evaluator<I, R>
where
    I: Send + 'static,
    R: Send + 'static,
{
    async fn run(self, cancel: CancellationToken) {
        // interval_at: the first tick fires after one full period, not
        // immediately.
        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {
                    // A panicking policy or fetcher forfeits this tick only.
                    let _ = panic::catch_unwind(AssertUnwindSafe(|| self.evaluate()));
                }
            }
        }
    }

    /// One control-loop pass: sample, decide, clamp, apply.
    fn evaluate(&self) {
        let metric = (self.fetcher)();
        let current = self.pool.current_workers();

        let desired = {
            let policy = self.policy.lock().unwrap_or_else(PoisonError::into_inner);
            policy.desired(current, metric)
        };
        let desired = desired.clamp(self.min, self.max);

        if desired != current {
            self.pool.resize(&CancellationToken::new(), desired);
        }
    }
}
