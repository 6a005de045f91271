//! # Pool Module
//!
//! Generic pooled-resource management with lifecycle-bound gauges.
//!
//! ## Overview
//!
//! [`ResourcePool`] hands out factory-built resources (database connections,
//! client handles, buffers) up to a configured ceiling, parking callers on a
//! condvar — bounded by the checkout timeout — when everything is in use.
//! Checked-out resources come back automatically through the
//! [`PooledResource`] guard's `Drop`.
//!
//! [`ManagedPool`] binds a pool to the service lifecycle: `start()` pre-fills
//! the minimum idle set and registers `active`/`idle`/`waiting`/`size`
//! gauges; `stop()` drains idle resources and deregisters the gauges so a
//! stopped pool reports nothing.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use svckit::pool::{PoolConfig, ResourcePool};
//!
//! let pool = Arc::new(ResourcePool::new(
//!     PoolConfig::default(),
//!     Box::new(|| Ok(Vec::<u8>::with_capacity(4096))),
//! ));
//! let buf = pool.checkout().unwrap();
//! assert_eq!(pool.active(), 1);
//! drop(buf);
//! assert_eq!(pool.idle(), 1);
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::lifecycle::{BoxError, Managed};
use crate::metrics::MetricRegistry;

/// Pool sizing and wait behavior. Deserializable from the service YAML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Ceiling on resources alive at once (idle + checked out).
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Resources created up front by `ManagedPool::start`.
    #[serde(default)]
    pub min_idle: usize,
    /// How long `checkout` waits for a resource before timing out.
    #[serde(default = "default_checkout_timeout_ms")]
    pub checkout_timeout_ms: u64,
}

fn default_max_size() -> usize {
    8
}

fn default_checkout_timeout_ms() -> u64 {
    5000
}

impl PoolConfig {
    pub fn checkout_timeout(&self) -> Duration {
        Duration::from_millis(self.checkout_timeout_ms)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            min_idle: 0,
            checkout_timeout_ms: default_checkout_timeout_ms(),
        }
    }
}

/// Checkout failure.
#[derive(Debug)]
pub enum PoolError {
    /// The pool stayed saturated for the whole checkout timeout.
    Timeout {
        /// How long the caller waited.
        waited: Duration,
    },
    /// The resource factory failed; the error is the factory's.
    Factory(BoxError),
    /// The pool has been stopped.
    Closed,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Timeout { waited } => {
                write!(f, "timed out after {waited:?} waiting for a pooled resource")
            }
            PoolError::Factory(e) => write!(f, "resource factory failed: {e}"),
            PoolError::Closed => write!(f, "pool is closed"),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PoolError::Factory(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

type Factory<T> = Box<dyn Fn() -> Result<T, BoxError> + Send + Sync>;

struct PoolInner<T> {
    idle: Vec<T>,
    /// Resources alive: idle + checked out + factory calls in flight.
    total: usize,
    active: usize,
    closed: bool,
}

/// Factory-driven resource pool with bounded checkout waits.
///
/// Thread-safe behind one mutex + condvar; the live counts backing the pool
/// gauges (`waiting` especially) are atomics readable without the lock.
pub struct ResourcePool<T> {
    config: PoolConfig,
    factory: Factory<T>,
    inner: Mutex<PoolInner<T>>,
    available: Condvar,
    waiting: AtomicUsize,
}

impl<T: Send + 'static> ResourcePool<T> {
    pub fn new(config: PoolConfig, factory: Factory<T>) -> Self {
        Self {
            config,
            factory,
            inner: Mutex::new(PoolInner {
                idle: Vec::new(),
                total: 0,
                active: 0,
                closed: false,
            }),
            available: Condvar::new(),
            waiting: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Check out a resource, creating one if the pool is under its ceiling.
    ///
    /// # Errors
    ///
    /// [`PoolError::Timeout`] when the pool stays saturated past the
    /// configured timeout, [`PoolError::Factory`] when creating a new
    /// resource fails (the failure does not consume pool capacity), and
    /// [`PoolError::Closed`] after `close`.
    pub fn checkout(&self) -> Result<PooledResource<'_, T>, PoolError> {
        let deadline = Instant::now() + self.config.checkout_timeout();
        let mut inner = self.lock_inner();
        loop {
            if inner.closed {
                return Err(PoolError::Closed);
            }
            if let Some(resource) = inner.idle.pop() {
                inner.active += 1;
                return Ok(PooledResource {
                    pool: self,
                    resource: Some(resource),
                });
            }
            if inner.total < self.config.max_size {
                // Reserve the slot, then build outside the lock so a slow
                // factory does not block checkins.
                inner.total += 1;
                drop(inner);
                match (self.factory)() {
                    Ok(resource) => {
                        let mut inner = self.lock_inner();
                        inner.active += 1;
                        return Ok(PooledResource {
                            pool: self,
                            resource: Some(resource),
                        });
                    }
                    Err(e) => {
                        let mut inner = self.lock_inner();
                        inner.total -= 1;
                        self.available.notify_one();
                        return Err(PoolError::Factory(e));
                    }
                }
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(PoolError::Timeout {
                    waited: self.config.checkout_timeout(),
                });
            }
            self.waiting.fetch_add(1, Ordering::Relaxed);
            let (guard, _timed_out) = self
                .available
                .wait_timeout(inner, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            self.waiting.fetch_sub(1, Ordering::Relaxed);
            inner = guard;
        }
    }

    /// Resources currently checked out.
    pub fn active(&self) -> usize {
        self.lock_inner().active
    }

    /// Resources parked in the pool.
    pub fn idle(&self) -> usize {
        self.lock_inner().idle.len()
    }

    /// Callers blocked in `checkout`.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Relaxed)
    }

    /// Resources alive (idle + checked out).
    pub fn size(&self) -> usize {
        self.lock_inner().total
    }

    /// Pre-create `count` idle resources.
    fn prefill(&self, count: usize) -> Result<(), BoxError> {
        for _ in 0..count {
            let resource = (self.factory)()?;
            let mut inner = self.lock_inner();
            inner.idle.push(resource);
            inner.total += 1;
        }
        Ok(())
    }

    /// Drop idle resources and refuse further checkouts. Checked-out
    /// resources are dropped as their guards return them.
    fn close(&self) {
        let mut inner = self.lock_inner();
        inner.closed = true;
        let drained = inner.idle.len();
        inner.total -= drained;
        inner.idle.clear();
        drop(inner);
        self.available.notify_all();
        debug!(drained, "pool closed");
    }

    fn checkin(&self, resource: T) {
        let mut inner = self.lock_inner();
        inner.active -= 1;
        if inner.closed {
            inner.total -= 1;
            drop(resource);
        } else {
            inner.idle.push(resource);
        }
        drop(inner);
        self.available.notify_one();
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, PoolInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// RAII guard for a checked-out resource; returns it to the pool on drop.
pub struct PooledResource<'a, T: Send + 'static> {
    pool: &'a ResourcePool<T>,
    resource: Option<T>,
}

impl<T: Send + 'static> Deref for PooledResource<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Invariant: `resource` is only taken in Drop.
        match &self.resource {
            Some(r) => r,
            None => unreachable!("pooled resource accessed after drop"),
        }
    }
}

impl<T: Send + 'static> DerefMut for PooledResource<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.resource {
            Some(r) => r,
            None => unreachable!("pooled resource accessed after drop"),
        }
    }
}

impl<T: Send + 'static> Drop for PooledResource<'_, T> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.pool.checkin(resource);
        }
    }
}

/// Lifecycle wrapper publishing pool gauges for the hosting environment.
///
/// On `start`: pre-fills `min_idle` resources and registers
/// `<name>.active`, `<name>.idle`, `<name>.waiting`, and `<name>.size`
/// gauges with the given registry. On `stop`: deregisters the gauge family
/// and closes the pool.
pub struct ManagedPool<T: Send + 'static> {
    name: String,
    pool: Arc<ResourcePool<T>>,
    metrics: Arc<MetricRegistry>,
}

impl<T: Send + 'static> ManagedPool<T> {
    pub fn new(
        name: impl Into<String>,
        pool: Arc<ResourcePool<T>>,
        metrics: Arc<MetricRegistry>,
    ) -> Self {
        Self {
            name: name.into(),
            pool,
            metrics,
        }
    }

    pub fn pool(&self) -> &Arc<ResourcePool<T>> {
        &self.pool
    }
}

impl<T: Send + 'static> Managed for ManagedPool<T> {
    fn start(&self) -> Result<(), BoxError> {
        self.pool.prefill(self.pool.config.min_idle)?;
        for (stat, sample) in [
            ("active", sampler(&self.pool, ResourcePool::active)),
            ("idle", sampler(&self.pool, ResourcePool::idle)),
            ("waiting", sampler(&self.pool, ResourcePool::waiting)),
            ("size", sampler(&self.pool, ResourcePool::size)),
        ] {
            self.metrics
                .register_gauge(&format!("{}.{}", self.name, stat), sample);
        }
        info!(
            pool = %self.name,
            min_idle = self.pool.config.min_idle,
            max_size = self.pool.config.max_size,
            "pool started"
        );
        Ok(())
    }

    fn stop(&self) -> Result<(), BoxError> {
        self.metrics.deregister_prefix(&format!("{}.", self.name));
        self.pool.close();
        info!(pool = %self.name, "pool stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn sampler<T: Send + 'static>(
    pool: &Arc<ResourcePool<T>>,
    stat: fn(&ResourcePool<T>) -> usize,
) -> impl Fn() -> f64 + Send + Sync + 'static {
    let pool = Arc::clone(pool);
    move || stat(&pool) as f64
}
