//! # Dynamically-sized worker pool.
//!
//! [`Pool`] executes a user [`Task`](crate::Task) on a variable population
//! of workers that compete for items on a shared input stream and emit
//! results (value or error) on an output stream.
//!
//! ## Architecture
//! ```text
//!                  ┌──────────┐
//! inputs ────────► │ worker 1 │──┐
//!   (shared MPMC)  │ worker 2 │──┼──► results
//!                  │   ...    │──┘    (closed when the last
//!                  │ worker N │        worker exits)
//!                  └────▲─────┘
//!                       │ shrink signals ("exit, whoever hears first")
//!                  resize(target)
//! ```
//!
//! ## Rules
//! - [`Pool::resize`] is O(1) under the pool lock and never waits for
//!   workers to drain; shrink signals are delivered by a detached task.
//! - [`Pool::current_workers`] reflects the last resize target immediately;
//!   the physical population converges as signals are consumed.
//! - Result order is unrelated to input order.
//! - Cancelling the token passed to [`Pool::run`] retires the workers it
//!   spawned and abandons in-flight result sends; the result stream closes
//!   once every worker has exited.
//! - Dropping the pool closes the shrink channel, which retires idle
//!   workers after their current task.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    error::RuntimeError,
    observer::{NopObserver, Observe},
    task::{TaskRef, TaskResult},
    worker::Worker,
};

/// State behind the pool lock.
struct Inner<R> {
    /// Authoritative count: the last resize target, not the physical
    /// population.
    workers: usize,
    /// Set once `run` has attached the result stream.
    started: bool,
    /// Mints result senders for new workers. Workers hold the strong
    /// clones, so the upgrade fails exactly when the pool has terminated.
    results: Option<mpsc::WeakSender<TaskResult<R>>>,
}

/// Pool of concurrent workers over a shared input stream.
///
/// Created inert; [`run`](Pool::run) attaches the result stream and applies
/// the initial size. Wrap it in an [`Arc`] to share with an
/// [`AutoScaler`](crate::AutoScaler) or with other resize callers.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
/// use flexpool::{Pool, TaskError, TaskFn};
///
/// # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (tx, inputs) = async_channel::bounded(16);
/// let pool = Arc::new(Pool::new(
///     4,
///     inputs,
///     TaskFn::arc(|_ctx: CancellationToken, n: u64| async move {
///         Ok::<_, TaskError>(n * 2)
///     }),
/// ));
///
/// let mut results = pool.run(CancellationToken::new())?;
/// for n in 0..64u64 {
///     tx.send(n).await?;
/// }
/// drop(tx);
///
/// while let Some(result) = results.recv().await {
///     println!("{result:?}");
/// }
/// # Ok(()) }
/// ```
pub struct Pool<I, R> {
    task: TaskRef<I, R>,
    observer: Arc<dyn Observe>,
    initial_workers: usize,
    inputs: async_channel::Receiver<I>,
    remove_tx: async_channel::Sender<()>,
    remove_rx: async_channel::Receiver<()>,
    inner: Mutex<Inner<R>>,
}

impl<I, R> Pool<I, R>
where
    I: Send + 'static,
    R: Send + 'static,
{
    /// Creates an inert pool; no workers are spawned until [`run`](Pool::run).
    pub fn new(initial_workers: usize, inputs: async_channel::Receiver<I>, task: TaskRef<I, R>) -> Self {
        let (remove_tx, remove_rx) = async_channel::bounded(1);

        Self {
            task,
            observer: Arc::new(NopObserver),
            initial_workers,
            inputs,
            remove_tx,
            remove_rx,
            inner: Mutex::new(Inner {
                workers: 0,
                started: false,
                results: None,
            }),
        }
    }

    /// Attaches observability hooks. Without this the pool observes nothing.
    #[must_use]
    pub fn with_observer(mut self, observer: impl Observe) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Starts the pool and returns the result stream.
    ///
    /// Applies the initial size from construction, superseding any resize
    /// made before this call; the stream closes once the input stream is
    /// drained and every worker has exited, or after `ctx` is cancelled and
    /// the workers have retired.
    ///
    /// Must be called within a tokio runtime. A second call is rejected.
    pub fn run(
        &self,
        ctx: CancellationToken,
    ) -> Result<mpsc::Receiver<TaskResult<R>>, RuntimeError> {
        let (tx, rx) = mpsc::channel(1);

        {
            let mut inner = self.lock_inner();
            if inner.started {
                return Err(RuntimeError::AlreadyRunning);
            }
            inner.started = true;
            inner.results = Some(tx.downgrade());
            // The physical population starts from zero no matter what was
            // requested before the stream existed; the resize below rebuilds
            // the count from the initial size.
            inner.workers = 0;
        }

        // `tx` must outlive the resize so the initial workers can clone it;
        // afterwards only workers hold strong senders.
        self.resize(&ctx, self.initial_workers);
        drop(tx);

        Ok(rx)
    }

    /// Changes the number of active workers.
    ///
    /// Growth spawns workers bound to `ctx`. Shrink enqueues anonymous exit
    /// signals consumed by whichever workers receive them first; delivery is
    /// asynchronous and abandoned if `ctx` is cancelled. Either way the
    /// count reported by [`current_workers`](Pool::current_workers) is the
    /// target as soon as this returns.
    ///
    /// Safe to call concurrently with other resizes and with running
    /// workers, and callable at any point in the pool's life. Before
    /// [`run`](Pool::run) only the count changes; `run` then applies the
    /// initial size over it.
    pub fn resize(&self, ctx: &CancellationToken, target: usize) {
        let mut inner = self.lock_inner();
        if target == inner.workers {
            return;
        }

        let current = inner.workers;
        // The upgrade doubles as a liveness probe: before `run` there is no
        // stream to spawn against, and once the last worker has exited there
        // is nothing to grow from or shrink. The count stays authoritative
        // either way.
        if let Some(results) = inner.results.as_ref().and_then(mpsc::WeakSender::upgrade) {
            if target > current {
                for _ in 0..target - current {
                    self.spawn_worker(ctx.clone(), results.clone());
                }
            } else {
                self.request_shrink(ctx.clone(), current - target);
            }
        }

        inner.workers = target;
        self.observer.worker_count_changed(target);
    }

    /// Returns the current number of active workers.
    ///
    /// Reflects the last resize decision; the physical population may lag
    /// above it while shrink signals are in flight.
    pub fn current_workers(&self) -> usize {
        self.lock_inner().workers
    }

    fn spawn_worker(&self, ctx: CancellationToken, results: mpsc::Sender<TaskResult<R>>) {
        let worker = Worker {
            task: Arc::clone(&self.task),
            observer: Arc::clone(&self.observer),
            inputs: self.inputs.clone(),
            remove: self.remove_rx.clone(),
            results,
        };
        tokio::spawn(worker.run(ctx));
    }

    /// Delivery runs detached so a resize never waits on busy workers.
    fn request_shrink(&self, ctx: CancellationToken, count: usize) {
        let remove = self.remove_tx.clone();

        tokio::spawn(async move {
            for _ in 0..count {
                tokio::select! {
                    res = remove.send(()) => {
                        if res.is_err() {
                            return;
                        }
                    }
                    _ = ctx.cancelled() => return,
                }
            }
        });
    }

    // A panicking observer must not wedge the pool, so poisoning is ignored.
    fn lock_inner(&self) -> MutexGuard<'_, Inner<R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
