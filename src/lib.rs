//! # svckit
//!
//! **svckit** is a service bootstrap kit: the glue a REST-ish service needs
//! around its business logic — a managed start/stop lifecycle, resilient
//! record sinks over unreliable transports, metric and health-check
//! registries, and a declarative YAML configuration layer — without bundling
//! an HTTP server, a serializer, or a logging backend. Those come from the
//! ecosystem (`tracing`/`tracing-subscriber`, `serde`); svckit wires them
//! together and gives application authors the extension points.
//!
//! ## Architecture
//!
//! - **[`lifecycle`]** - `Managed` trait and the start/stop coordinator
//!   (fail-fast bootstrap, best-effort reverse-order shutdown)
//! - **[`sink`]** - resilient output sinks: suppressed errors, counted
//!   drops, interval-paced reconnection over TCP/UDP/file transports
//! - **[`clock`]** - injectable monotonic time source (deterministic
//!   recovery tests)
//! - **[`metrics`]** - explicit counter/gauge registry with Prometheus text
//!   rendering
//! - **[`pool`]** - factory-driven resource pool whose lifecycle wrapper
//!   publishes `active`/`idle`/`waiting`/`size` gauges
//! - **[`health`]** - named health checks and an aggregated report
//! - **[`config`]** - YAML sink/pool configuration plus `SVCKIT_` env
//!   overrides
//! - **[`logging`]** - `MakeWriter` bridge shipping `tracing` events
//!   through a resilient sink
//! - **[`environment`]** - per-service composition root owning the three
//!   registries
//!
//! ## Bootstrap Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Main as main()
//!     participant Cfg as config::ServiceConfig
//!     participant Env as Environment
//!     participant LC as Lifecycle
//!     participant Pool as ManagedPool
//!     participant Sink as ResilientSink
//!
//!     Main->>Cfg: ServiceConfig::load("service.yaml")
//!     Main->>Env: Environment::new("orders")
//!     Main->>Sink: SinkConfig::build(clock)
//!     Main->>Env: manage(pool), manage(flusher), ...
//!     Main->>Env: start()
//!     Env->>LC: start()
//!     LC->>Pool: start()  — prefill + register gauges
//!     LC-->>Main: Running (or StartError, fatal)
//!     Note over Main: serve traffic
//!     Main->>Env: stop()
//!     Env->>LC: stop()  — reverse order, best effort
//!     LC->>Pool: stop()  — drain + deregister gauges
//!     LC-->>Main: Ok or aggregated ShutdownErrors
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use svckit::environment::Environment;
//! use svckit::lifecycle::{BoxError, Managed};
//!
//! struct CacheWarmer;
//!
//! impl Managed for CacheWarmer {
//!     fn start(&self) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//!     fn stop(&self) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//!     fn name(&self) -> &str {
//!         "cache-warmer"
//!     }
//! }
//!
//! let mut env = Environment::new("orders");
//! env.manage(Arc::new(CacheWarmer)).unwrap();
//! env.health().register("always", || svckit::health::HealthStatus::Healthy);
//! env.start().unwrap();
//! // ... serve traffic ...
//! env.stop().unwrap();
//! ```
//!
//! ## Delivery Semantics
//!
//! Sinks are best-effort by contract: a write never returns an error, never
//! panics, and never blocks behind a reconnect. When the transport is down,
//! records are dropped and counted, and the sink retries the connection at
//! its configured recovery interval. Use the `failures()`/`dropped()`
//! counters for diagnosis; do not build exactly-once pipelines on top of a
//! record sink.

pub mod clock;
pub mod config;
pub mod environment;
pub mod health;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod pool;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, RuntimeConfig, ServiceConfig, SinkConfig};
pub use environment::Environment;
pub use health::{HealthCheck, HealthRegistry, HealthReport, HealthStatus};
pub use lifecycle::{
    BoxError, Lifecycle, LifecycleError, LifecycleState, Managed, ShutdownErrors, StartError,
};
pub use metrics::{Counter, MetricRegistry};
pub use pool::{ManagedPool, PoolConfig, PoolError, PooledResource, ResourcePool};
pub use sink::{Connector, FileConnector, ResilientSink, TcpConnector, UdpConnector};
