//! # Task abstraction and function-backed task implementation.
//!
//! This module defines the [`Task`] trait (async, cancelable, one input in,
//! one result out) and a convenient function-backed implementation
//! [`TaskFn`]. The common handle type is [`TaskRef`], an `Arc<dyn Task>`
//! suitable for sharing across every worker in a pool.
//!
//! A task receives a [`CancellationToken`] alongside its input and should
//! check it to stop cooperatively when the pool shuts down. The pool invokes
//! the same task object concurrently from many workers, so implementations
//! take `&self` and must not rely on shared mutable state between calls.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Outcome of one task invocation, delivered on the pool's result stream.
pub type TaskResult<R> = Result<R, TaskError>;

/// # Shared handle to a task object.
///
/// This is the primary type consumed by [`Pool::new`](crate::Pool::new).
pub type TaskRef<I, R> = Arc<dyn Task<I, R>>;

/// # Asynchronous, cancelable processing unit.
///
/// A `Task` turns one input of type `I` into one result of type `R`. The
/// pool calls [`run`](Task::run) from any number of workers at once; each
/// call is independent.
///
/// Panics inside `run` are caught by the pool's fault barrier and surface
/// as [`TaskError::Panicked`] results; they do not terminate the worker.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use flexpool::{Task, TaskError};
///
/// struct Doubler;
///
/// #[async_trait]
/// impl Task<u64, u64> for Doubler {
///     async fn run(&self, ctx: CancellationToken, input: u64) -> Result<u64, TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         Ok(input * 2)
///     }
/// }
/// ```
#[async_trait]
pub trait Task<I, R>: Send + Sync + 'static
where
    I: Send + 'static,
    R: Send + 'static,
{
    /// Processes one input until completion or cancellation.
    ///
    /// Long-running implementations should watch `ctx` and exit quickly to
    /// honor pool shutdown.
    async fn run(&self, ctx: CancellationToken, input: I) -> Result<R, TaskError>;
}

/// # Function-backed task implementation.
///
/// [`TaskFn`] wraps a closure `Fn(CancellationToken, I) -> Fut`. Every call
/// creates a fresh, independent future, so a single `TaskFn` serves any
/// number of concurrent workers without synchronization. State captured by
/// the closure must be `Sync` (or wrapped in `Arc<Mutex<_>>` by the caller).
///
/// Use [`TaskFn::arc`] for a one-liner that returns a [`TaskRef`].
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use flexpool::{TaskFn, TaskRef, TaskError};
///
/// let t: TaskRef<u64, u64> = TaskFn::arc(|_ctx: CancellationToken, n: u64| async move {
///     Ok::<_, TaskError>(n * 2)
/// });
/// ```
#[derive(Debug)]
pub struct TaskFn<F> {
    func: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`].
    pub fn new(func: F) -> Self {
        Self { func }
    }

    /// Creates the task and returns it as a shared handle (`Arc<dyn Task>`).
    pub fn arc<I, R, Fut>(func: F) -> TaskRef<I, R>
    where
        I: Send + 'static,
        R: Send + 'static,
        F: Fn(CancellationToken, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
    {
        Arc::new(Self::new(func))
    }
}

#[async_trait]
impl<I, R, F, Fut> Task<I, R> for TaskFn<F>
where
    I: Send + 'static,
    R: Send + 'static,
    F: Fn(CancellationToken, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken, input: I) -> Result<R, TaskError> {
        (self.func)(ctx, input).await
    }
}
