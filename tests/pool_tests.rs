use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use svckit::lifecycle::{Lifecycle, Managed};
use svckit::metrics::MetricRegistry;
use svckit::pool::{ManagedPool, PoolConfig, ResourcePool};

use tracing_util::TestTracing;

/// A fake connection with an id, to stand in for anything pooled.
struct Conn {
    #[allow(dead_code)]
    id: usize,
}

fn conn_pool(config: PoolConfig) -> Arc<ResourcePool<Conn>> {
    let ids = AtomicUsize::new(0);
    Arc::new(ResourcePool::new(
        config,
        Box::new(move || {
            Ok(Conn {
                id: ids.fetch_add(1, Ordering::SeqCst),
            })
        }),
    ))
}

#[test]
fn managed_pool_registers_gauges_on_start_and_removes_them_on_stop() {
    let _tracing = TestTracing::init();
    let metrics = Arc::new(MetricRegistry::new());
    let pool = conn_pool(PoolConfig {
        max_size: 4,
        min_idle: 2,
        checkout_timeout_ms: 100,
    });
    let managed = ManagedPool::new("db.pool", Arc::clone(&pool), Arc::clone(&metrics));

    assert_eq!(metrics.gauge_value("db.pool.size"), None);
    managed.start().expect("pool start");

    // min_idle resources exist up front.
    assert_eq!(metrics.gauge_value("db.pool.size"), Some(2.0));
    assert_eq!(metrics.gauge_value("db.pool.idle"), Some(2.0));
    assert_eq!(metrics.gauge_value("db.pool.active"), Some(0.0));
    assert_eq!(metrics.gauge_value("db.pool.waiting"), Some(0.0));

    let held = pool.checkout().expect("checkout");
    assert_eq!(metrics.gauge_value("db.pool.active"), Some(1.0));
    assert_eq!(metrics.gauge_value("db.pool.idle"), Some(1.0));
    drop(held);

    managed.stop().expect("pool stop");
    // A stopped pool reports nothing, rather than stale values.
    assert_eq!(metrics.gauge_value("db.pool.active"), None);
    assert_eq!(metrics.gauge_value("db.pool.idle"), None);
    assert_eq!(metrics.gauge_value("db.pool.waiting"), None);
    assert_eq!(metrics.gauge_value("db.pool.size"), None);
}

#[test]
fn pool_participates_in_the_lifecycle() {
    let _tracing = TestTracing::init();
    let metrics = Arc::new(MetricRegistry::new());
    let pool = conn_pool(PoolConfig {
        max_size: 2,
        min_idle: 1,
        checkout_timeout_ms: 100,
    });
    let managed = Arc::new(ManagedPool::new(
        "db.pool",
        Arc::clone(&pool),
        Arc::clone(&metrics),
    ));

    let mut lifecycle = Lifecycle::new();
    lifecycle
        .manage(Arc::clone(&managed) as Arc<dyn Managed>)
        .unwrap();
    lifecycle.start().unwrap();
    assert_eq!(pool.size(), 1);
    assert!(metrics.render_prometheus().contains("db_pool_size"));

    lifecycle.stop().unwrap();
    assert!(!metrics.render_prometheus().contains("db_pool_size"));
    assert!(matches!(
        pool.checkout(),
        Err(svckit::pool::PoolError::Closed)
    ));
}

#[test]
fn blocked_checkout_wakes_when_a_resource_returns() {
    let _tracing = TestTracing::init();
    let pool = conn_pool(PoolConfig {
        max_size: 1,
        min_idle: 0,
        checkout_timeout_ms: 2000,
    });
    let held = pool.checkout().expect("first checkout");

    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.checkout().map(|guard| drop(guard)))
    };
    // Give the waiter time to park on the condvar.
    thread::sleep(Duration::from_millis(50));
    assert_eq!(pool.waiting(), 1);

    drop(held);
    waiter
        .join()
        .expect("waiter thread panicked")
        .expect("waiter checkout");
    assert_eq!(pool.waiting(), 0);
    assert_eq!(pool.idle(), 1);
    // The resource was reused, not recreated.
    assert_eq!(pool.size(), 1);
}

#[test]
fn waiting_gauge_reflects_parked_callers() {
    let _tracing = TestTracing::init();
    let metrics = Arc::new(MetricRegistry::new());
    let pool = conn_pool(PoolConfig {
        max_size: 1,
        min_idle: 0,
        checkout_timeout_ms: 500,
    });
    let managed = ManagedPool::new("work.pool", Arc::clone(&pool), Arc::clone(&metrics));
    managed.start().expect("pool start");

    let held = pool.checkout().expect("checkout");
    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            let _ = pool.checkout().map(|g| drop(g));
        })
    };
    thread::sleep(Duration::from_millis(50));
    assert_eq!(metrics.gauge_value("work.pool.waiting"), Some(1.0));
    drop(held);
    waiter.join().expect("waiter thread panicked");
    assert_eq!(metrics.gauge_value("work.pool.waiting"), Some(0.0));
}
