//! Queue-depth-driven autoscaling demo.
//!
//! Feeds bursts of work into a small pool while the scaler chases the
//! input queue depth between 1 and 8 workers.
//!
//! Run with: `cargo run --example autoscale`

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use flexpool::{AutoScaler, Observe, Pool, ScalePolicy, TaskError, TaskFn};

struct PrintObserver;

impl Observe for PrintObserver {
    fn worker_count_changed(&self, workers: usize) {
        println!("[workers] count={workers}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (tx, inputs) = async_channel::bounded::<u64>(256);
    let depth = inputs.clone();

    let task = TaskFn::arc(|_ctx: CancellationToken, n: u64| async move {
        tokio::time::sleep(Duration::from_millis(25)).await;
        Ok::<_, TaskError>(n * n)
    });

    let pool = Arc::new(Pool::new(1, inputs, task).with_observer(PrintObserver));
    let ctx = CancellationToken::new();
    let mut results = pool.run(ctx.clone())?;

    let scaler = AutoScaler::new(
        Arc::clone(&pool),
        Duration::from_millis(100),
        1,
        8,
        move || depth.len() as f64,
    )?;
    scaler.set_policy(ScalePolicy::threshold(4.0, 16.0, 2)?);
    scaler.start()?;

    let producer = tokio::spawn(async move {
        for burst in 0..4u64 {
            for n in 0..64 {
                if tx.send(burst * 64 + n).await.is_err() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    });

    let mut done = 0usize;
    while let Some(result) = results.recv().await {
        match result {
            Ok(_) => done += 1,
            Err(err) => eprintln!("task failed: {err}"),
        }
    }
    println!("processed {done} items");

    producer.await?;
    scaler.stop().await;
    Ok(())
}
