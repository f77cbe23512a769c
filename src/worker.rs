//! # Worker activity: the select loop and the fault barrier.
//!
//! Each [`Worker`] is an anonymous tokio task spawned by the pool. It
//! competes with its siblings for inputs on a shared stream and retires
//! itself on the first of three events:
//!
//! ```text
//! ┌────────────────── worker loop ──────────────────┐
//! │  ctx cancelled ──────────────► exit             │
//! │  shrink signal ──────────────► exit             │
//! │  input received ──► safe_execute ──► loop       │
//! │  input stream closed ────────► exit             │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - The three waits have **no priority**; any ready branch may win.
//! - Shrink signals are anonymous: whichever worker receives one exits.
//! - A panicking task becomes a [`TaskError::Panicked`] result; the worker
//!   returns to the loop.
//! - A result send interrupted by cancellation is abandoned, as is a send
//!   to a dropped consumer; neither fails the worker.
//! - On exit the worker drops its result sender; the stream closes when the
//!   last sender is gone.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Instant};

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    error::TaskError,
    observer::Observe,
    task::{TaskRef, TaskResult},
};

/// One member of the pool's worker population.
pub(crate) struct Worker<I, R> {
    pub(crate) task: TaskRef<I, R>,
    pub(crate) observer: Arc<dyn Observe>,
    pub(crate) inputs: async_channel::Receiver<I>,
    pub(crate) remove: async_channel::Receiver<()>,
    pub(crate) results: mpsc::Sender<TaskResult<R>>,
}

impl<I, R> Worker<I, R>
where
    I: Send + 'static,
    R: Send + 'static,
{
    /// Runs until cancellation, a shrink signal, or input-stream closure.
    pub(crate) async fn run(self, ctx: CancellationToken) {
        loop {
            tokio::select! {
                _ = ctx.cancelled() => return,
                _ = self.remove.recv() => return,
                input = self.inputs.recv() => match input {
                    Ok(input) => self.safe_execute(&ctx, input).await,
                    Err(_) => return,
                },
            }
        }
    }

    /// Executes one task invocation behind the fault barrier.
    async fn safe_execute(&self, ctx: &CancellationToken, input: I) {
        self.observer.task_started();
        let started = Instant::now();

        let attempt = AssertUnwindSafe(self.task.run(ctx.clone(), input))
            .catch_unwind()
            .await;
        let result = match attempt {
            Ok(result) => result,
            Err(payload) => Err(TaskError::Panicked {
                message: panic_message(payload),
            }),
        };

        self.observer
            .task_finished(started.elapsed(), result.as_ref().err());

        tokio::select! {
            _ = self.results.send(result) => {}
            _ = ctx.cancelled() => {}
        }
    }
}

/// Renders a panic payload the way the default panic hook would.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
