//! # Metrics Module
//!
//! Explicit metric registry: counters and callback gauges.
//!
//! ## Overview
//!
//! A [`MetricRegistry`] is an ordinary value constructed at bootstrap and
//! passed into each component that reports metrics — there is no process-wide
//! ambient registry. Components register [`Counter`]s (shared atomic totals)
//! and gauges (callbacks sampled at render time), and **deregister** their
//! gauges when they stop so a stopped component reports nothing rather than
//! stale values.
//!
//! Metric names are dotted paths (`db.pool.active`). Rendering to the
//! Prometheus text exposition format sanitizes them to underscore form; how
//! the rendered text is served (HTTP endpoint, push gateway) is the host
//! application's concern.
//!
//! ## Usage
//!
//! ```rust
//! use svckit::metrics::MetricRegistry;
//!
//! let registry = MetricRegistry::new();
//! let requests = registry.counter("ingest.records");
//! requests.inc();
//! registry.register_gauge("ingest.queue_depth", || 0.0);
//! let text = registry.render_prometheus();
//! assert!(text.contains("ingest_records 1"));
//! ```

mod registry;

pub use registry::{Counter, MetricRegistry};
