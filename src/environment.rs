//! # Environment Module
//!
//! The per-service composition root: one lifecycle, one metric registry,
//! one health registry.
//!
//! ## Overview
//!
//! An [`Environment`] is built during bootstrap and handed to extension code
//! so it can plug in managed objects, health checks, and metrics. All three
//! registries are explicit values owned here — components receive them
//! through constructors, never through process-wide singletons.
//!
//! `start` and `stop` delegate to the [`Lifecycle`]: fail-fast bootstrap in
//! registration order, best-effort shutdown in reverse order.

use std::sync::Arc;

use tracing::info;

use crate::health::HealthRegistry;
use crate::lifecycle::{Lifecycle, LifecycleError, Managed, ShutdownErrors, StartError};
use crate::metrics::MetricRegistry;

/// Everything a running service owns: managed objects, metrics, health
/// checks.
pub struct Environment {
    name: String,
    lifecycle: Lifecycle,
    metrics: Arc<MetricRegistry>,
    health: HealthRegistry,
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lifecycle: Lifecycle::new(),
            metrics: Arc::new(MetricRegistry::new()),
            health: HealthRegistry::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The service's metric registry; clone the `Arc` into components that
    /// report metrics.
    pub fn metrics(&self) -> &Arc<MetricRegistry> {
        &self.metrics
    }

    pub fn health(&self) -> &HealthRegistry {
        &self.health
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Register a managed object; start order is registration order.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyStarted`] after `start` has run.
    pub fn manage(&mut self, object: Arc<dyn Managed>) -> Result<(), LifecycleError> {
        self.lifecycle.manage(object)
    }

    /// Start every managed object; fatal on first failure.
    pub fn start(&mut self) -> Result<(), StartError> {
        info!(service = %self.name, "starting environment");
        self.lifecycle.start()
    }

    /// Stop every managed object, best effort, reverse order.
    pub fn stop(&mut self) -> Result<(), ShutdownErrors> {
        info!(service = %self.name, "stopping environment");
        self.lifecycle.stop()
    }
}
