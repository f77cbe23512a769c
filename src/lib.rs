//! # flexpool
//!
//! **Flexpool** is a dynamically-sized async worker pool with a
//! metric-driven autoscaler sidecar.
//!
//! The pool executes a caller-supplied task on N concurrent workers that
//! compete for items on a shared input stream and emit results on an output
//! stream. The autoscaler periodically samples a metric, asks a policy for
//! a desired worker count, clamps it to bounds, and resizes the pool.
//!
//! ## Features
//!
//! | Area             | Description                                                    | Key types / traits                         |
//! |------------------|----------------------------------------------------------------|--------------------------------------------|
//! | **Pool**         | Variable worker population over a shared input stream.         | [`Pool`], [`TaskResult`]                   |
//! | **Tasks**        | Define tasks as closures or trait impls, easy to compose.      | [`Task`], [`TaskFn`], [`TaskRef`]          |
//! | **Scaling**      | Periodic metric sampling drives the pool size within bounds.   | [`AutoScaler`], [`ScalePolicy`]            |
//! | **Observer API** | Hook into task and resize telemetry (metrics, custom logging). | [`Observe`]                                |
//! | **Errors**       | Typed errors for tasks, lifecycle, and configuration.          | [`TaskError`], [`RuntimeError`], [`ConfigError`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] observer _(demo/reference only)_.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use flexpool::{AutoScaler, Pool, ScalePolicy, TaskError, TaskFn};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, inputs) = async_channel::bounded(64);
//!     let depth = inputs.clone();
//!
//!     // A pool of four workers doubling numbers.
//!     let pool = Arc::new(Pool::new(
//!         4,
//!         inputs,
//!         TaskFn::arc(|_ctx: CancellationToken, n: u64| async move {
//!             Ok::<_, TaskError>(n * 2)
//!         }),
//!     ));
//!
//!     let ctx = CancellationToken::new();
//!     let mut results = pool.run(ctx.clone())?;
//!
//!     // Chase the input queue depth between 1 and 16 workers.
//!     let scaler = AutoScaler::new(
//!         Arc::clone(&pool),
//!         Duration::from_millis(250),
//!         1,
//!         16,
//!         move || depth.len() as f64,
//!     )?;
//!     scaler.set_policy(ScalePolicy::threshold(4.0, 32.0, 2)?);
//!     scaler.start()?;
//!
//!     for n in 0..128u64 {
//!         tx.send(n).await?;
//!     }
//!     drop(tx);
//!
//!     while let Some(result) = results.recv().await {
//!         println!("{result:?}");
//!     }
//!
//!     scaler.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ---

mod error;
mod observer;
mod policy;
mod pool;
mod scaler;
mod task;
mod worker;

// ---- Public re-exports ----

pub use error::{ConfigError, RuntimeError, TaskError};
pub use observer::Observe;
pub use policy::{ScaleFn, ScalePolicy};
pub use pool::Pool;
pub use scaler::{AutoScaler, MetricFn};
pub use task::{Task, TaskFn, TaskRef, TaskResult};

// Optional: expose a simple built-in stdout observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observer::LogWriter;
