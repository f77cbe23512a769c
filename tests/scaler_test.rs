//! Integration tests for the autoscaler: threshold policies, bounds
//! enforcement, and lifecycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use flexpool::{
    AutoScaler, ConfigError, Pool, RuntimeError, ScalePolicy, TaskError, TaskFn, TaskRef,
};

fn noop_task() -> TaskRef<u64, u64> {
    TaskFn::arc(|_ctx: CancellationToken, _n: u64| async move { Ok::<_, TaskError>(0) })
}

/// Shared mutable metric the test body controls while the scaler samples.
#[derive(Clone, Default)]
struct Metric(Arc<AtomicU64>);

impl Metric {
    fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    fn fetcher(&self) -> impl Fn() -> f64 + Send + Sync + 'static {
        let bits = Arc::clone(&self.0);
        move || f64::from_bits(bits.load(Ordering::Relaxed))
    }
}

/// A running pool whose workers sit idle on the input stream.
fn idle_pool(initial: usize) -> (Arc<Pool<u64, u64>>, async_channel::Sender<u64>) {
    let (tx, inputs) = async_channel::bounded(1);
    (Arc::new(Pool::new(initial, inputs, noop_task())), tx)
}

#[tokio::test(flavor = "multi_thread")]
async fn threshold_scales_up_then_down() {
    let (pool, _tx) = idle_pool(5);
    let _results = pool.run(CancellationToken::new()).unwrap();

    let metric = Metric::default();
    let scaler = AutoScaler::new(
        Arc::clone(&pool),
        Duration::from_millis(10),
        1,
        10,
        metric.fetcher(),
    )
    .unwrap();
    scaler.set_policy(ScalePolicy::threshold(20.0, 80.0, 2).unwrap());
    scaler.start().unwrap();

    metric.set(90.0);
    sleep(Duration::from_millis(50)).await;
    let scaled_up = pool.current_workers();
    assert!(scaled_up > 5, "expected scale up from 5, got {scaled_up}");

    metric.set(10.0);
    sleep(Duration::from_millis(50)).await;
    let scaled_down = pool.current_workers();
    assert!(
        scaled_down < scaled_up,
        "expected scale down from {scaled_up}, got {scaled_down}"
    );

    scaler.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn inverse_threshold_sheds_workers_under_pressure() {
    let (pool, _tx) = idle_pool(5);
    let _results = pool.run(CancellationToken::new()).unwrap();

    let metric = Metric::default();
    metric.set(95.0);

    let scaler = AutoScaler::new(
        Arc::clone(&pool),
        Duration::from_millis(10),
        1,
        10,
        metric.fetcher(),
    )
    .unwrap();
    scaler.set_policy(ScalePolicy::inverse_threshold(20.0, 80.0, 2).unwrap());
    scaler.start().unwrap();

    sleep(Duration::from_millis(50)).await;
    let workers = pool.current_workers();
    assert!(workers < 5, "expected scale down from 5, got {workers}");

    scaler.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn bounds_cap_an_aggressive_policy() {
    let (pool, _tx) = idle_pool(2);
    let _results = pool.run(CancellationToken::new()).unwrap();

    let scaler = AutoScaler::new(
        Arc::clone(&pool),
        Duration::from_millis(10),
        1,
        5,
        || 100.0,
    )
    .unwrap();
    scaler.set_policy(ScalePolicy::custom(|current, _metric| current + 10));
    scaler.start().unwrap();

    sleep(Duration::from_millis(50)).await;
    let workers = pool.current_workers();
    assert!(workers <= 5, "expected the ceiling of 5, got {workers}");

    scaler.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn identity_policy_never_resizes() {
    let (pool, _tx) = idle_pool(5);
    let _results = pool.run(CancellationToken::new()).unwrap();

    let scaler = AutoScaler::new(
        Arc::clone(&pool),
        Duration::from_millis(10),
        1,
        10,
        || 1_000.0,
    )
    .unwrap();
    scaler.start().unwrap();

    sleep(Duration::from_millis(50)).await;
    assert_eq!(pool.current_workers(), 5);

    scaler.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_leaves_the_pool_running() {
    let task: TaskRef<u64, u64> =
        TaskFn::arc(|_ctx: CancellationToken, n: u64| async move { Ok::<_, TaskError>(n + 1) });

    let (tx, inputs) = async_channel::bounded(1);
    let pool = Arc::new(Pool::new(2, inputs, task));
    let mut results = pool.run(CancellationToken::new()).unwrap();

    let scaler = AutoScaler::new(Arc::clone(&pool), Duration::from_millis(10), 1, 5, || 0.0)
        .unwrap();
    scaler.start().unwrap();
    scaler.stop().await;

    tx.send(41).await.unwrap();
    assert_eq!(results.recv().await.unwrap().unwrap(), 42);
}

#[tokio::test]
async fn configuration_is_validated() {
    let (pool, _tx) = idle_pool(1);

    assert!(matches!(
        AutoScaler::new(Arc::clone(&pool), Duration::ZERO, 1, 5, || 0.0).err(),
        Some(ConfigError::ZeroInterval)
    ));
    assert!(matches!(
        AutoScaler::new(Arc::clone(&pool), Duration::from_millis(10), 6, 5, || 0.0).err(),
        Some(ConfigError::BoundsInverted { min: 6, max: 5 })
    ));
}

#[tokio::test]
async fn lifecycle_is_enforced() {
    let (pool, _tx) = idle_pool(1);
    let scaler = AutoScaler::new(pool, Duration::from_millis(10), 1, 5, || 0.0).unwrap();

    scaler.start().unwrap();
    assert!(matches!(scaler.start(), Err(RuntimeError::AlreadyStarted)));

    scaler.stop().await;
    scaler.stop().await; // idempotent
    assert!(matches!(scaler.start(), Err(RuntimeError::ScalerStopped)));
}

#[tokio::test]
async fn stop_before_start_is_terminal() {
    let (pool, _tx) = idle_pool(1);
    let scaler = AutoScaler::new(pool, Duration::from_millis(10), 1, 5, || 0.0).unwrap();

    scaler.stop().await;
    assert!(matches!(scaler.start(), Err(RuntimeError::ScalerStopped)));
}
