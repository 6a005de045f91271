use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

/// Monotonic counter shared between the registry and the reporting
/// component.
///
/// All operations use relaxed atomics: totals are eventually consistent and
/// extremely cheap to bump from hot paths.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

type GaugeFn = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Named counters and gauges for one service.
///
/// Counters are registered on first use and live for the registry's
/// lifetime; gauges are callbacks owned by the reporting component and are
/// expected to be removed (see [`deregister`](MetricRegistry::deregister)
/// and [`deregister_prefix`](MetricRegistry::deregister_prefix)) when that
/// component stops.
pub struct MetricRegistry {
    counters: DashMap<String, Arc<Counter>>,
    gauges: DashMap<String, GaugeFn>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self {
            counters: DashMap::new(),
            gauges: DashMap::new(),
        }
    }

    /// Get or create the counter registered under `name`.
    pub fn counter(&self, name: &str) -> Arc<Counter> {
        Arc::clone(
            &self
                .counters
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Counter::default())),
        )
    }

    /// Register a gauge callback under `name`, replacing any previous one.
    pub fn register_gauge(
        &self,
        name: &str,
        gauge: impl Fn() -> f64 + Send + Sync + 'static,
    ) {
        self.gauges.insert(name.to_string(), Arc::new(gauge));
    }

    /// Sample the gauge registered under `name`.
    pub fn gauge_value(&self, name: &str) -> Option<f64> {
        self.gauges.get(name).map(|g| g())
    }

    /// Remove the metric registered under `name`. Returns whether anything
    /// was removed.
    pub fn deregister(&self, name: &str) -> bool {
        let counter = self.counters.remove(name).is_some();
        let gauge = self.gauges.remove(name).is_some();
        counter || gauge
    }

    /// Remove every metric whose name starts with `prefix`. Returns how many
    /// were removed.
    ///
    /// This is the stop-time path for components that registered a family of
    /// gauges (`db.pool.active`, `db.pool.idle`, ...) at start.
    pub fn deregister_prefix(&self, prefix: &str) -> usize {
        // Counted inside the retain closures; diffing map lengths would race
        // with concurrent registrations.
        let mut removed = 0;
        self.counters.retain(|name, _| {
            let keep = !name.starts_with(prefix);
            if !keep {
                removed += 1;
            }
            keep
        });
        self.gauges.retain(|name, _| {
            let keep = !name.starts_with(prefix);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Render every counter and gauge in the Prometheus text exposition
    /// format, names sorted for stable output.
    pub fn render_prometheus(&self) -> String {
        let mut counters: Vec<(String, u64)> = self
            .counters
            .iter()
            .map(|e| (e.key().clone(), e.value().get()))
            .collect();
        counters.sort_by(|a, b| a.0.cmp(&b.0));
        let mut gauges: Vec<(String, f64)> = self
            .gauges
            .iter()
            .map(|e| (e.key().clone(), (e.value())()))
            .collect();
        gauges.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = String::new();
        for (name, value) in counters {
            let name = sanitize(&name);
            let _ = writeln!(out, "# TYPE {name} counter");
            let _ = writeln!(out, "{name} {value}");
        }
        for (name, value) in gauges {
            let name = sanitize(&name);
            let _ = writeln!(out, "# TYPE {name} gauge");
            let _ = writeln!(out, "{name} {value}");
        }
        out
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a dotted metric name onto the Prometheus charset.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | ':' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_shared_by_name() {
        let registry = MetricRegistry::new();
        registry.counter("a.total").inc();
        registry.counter("a.total").add(2);
        assert_eq!(registry.counter("a.total").get(), 3);
    }

    #[test]
    fn gauge_samples_at_read_time() {
        let registry = MetricRegistry::new();
        let source = Arc::new(AtomicU64::new(7));
        let sampled = Arc::clone(&source);
        registry.register_gauge("q.depth", move || sampled.load(Ordering::Relaxed) as f64);
        assert_eq!(registry.gauge_value("q.depth"), Some(7.0));
        source.store(11, Ordering::Relaxed);
        assert_eq!(registry.gauge_value("q.depth"), Some(11.0));
    }

    #[test]
    fn deregister_prefix_removes_the_family() {
        let registry = MetricRegistry::new();
        registry.register_gauge("db.pool.active", || 1.0);
        registry.register_gauge("db.pool.idle", || 2.0);
        registry.register_gauge("other.size", || 3.0);
        assert_eq!(registry.deregister_prefix("db.pool."), 2);
        assert_eq!(registry.gauge_value("db.pool.active"), None);
        assert_eq!(registry.gauge_value("other.size"), Some(3.0));
    }

    #[test]
    fn deregister_prefix_counts_counters_and_gauges() {
        let registry = MetricRegistry::new();
        registry.counter("db.pool.timeouts").inc();
        registry.register_gauge("db.pool.active", || 1.0);
        registry.register_gauge("db.pool.idle", || 2.0);
        registry.counter("ingest.records").inc();
        assert_eq!(registry.deregister_prefix("db.pool."), 3);
        assert_eq!(registry.deregister_prefix("db.pool."), 0);
        assert_eq!(registry.counter("ingest.records").get(), 1);
    }

    #[test]
    fn prometheus_rendering_is_sorted_and_sanitized() {
        let registry = MetricRegistry::new();
        registry.counter("ingest.records").add(5);
        registry.register_gauge("db.pool.size", || 4.0);
        let text = registry.render_prometheus();
        assert!(text.contains("# TYPE ingest_records counter\ningest_records 5\n"));
        assert!(text.contains("# TYPE db_pool_size gauge\ndb_pool_size 4\n"));
    }
}
