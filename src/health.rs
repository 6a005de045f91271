//! # Health Module
//!
//! Named health checks and an aggregated report.
//!
//! ## Overview
//!
//! Application authors register [`HealthCheck`]s by name; the hosting
//! environment runs them on demand and serializes the aggregate
//! [`HealthReport`] for whatever surface exposes it (an HTTP probe handler,
//! a CLI subcommand — out of scope here). A service is healthy exactly when
//! every registered check is.
//!
//! Plain closures work as checks:
//!
//! ```rust
//! use svckit::health::{HealthRegistry, HealthStatus};
//!
//! let registry = HealthRegistry::new();
//! registry.register("deadlocks", || HealthStatus::Healthy);
//! assert!(registry.run_all().healthy);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::warn;

/// Outcome of a single health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy {
        /// Operator-facing explanation of what is wrong.
        message: String,
    },
}

impl HealthStatus {
    pub fn unhealthy(message: impl Into<String>) -> Self {
        HealthStatus::Unhealthy {
            message: message.into(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// A point-in-time liveness/readiness probe for one component.
pub trait HealthCheck: Send + Sync {
    fn check(&self) -> HealthStatus;
}

impl<F> HealthCheck for F
where
    F: Fn() -> HealthStatus + Send + Sync,
{
    fn check(&self) -> HealthStatus {
        self()
    }
}

/// Aggregate result of running every registered check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Conjunction of all check outcomes.
    pub healthy: bool,
    /// Per-check outcomes, keyed by registration name, sorted.
    pub checks: BTreeMap<String, HealthStatus>,
}

/// Named collection of health checks.
///
/// Interior-mutable so extension code can register checks through a shared
/// reference during bootstrap.
pub struct HealthRegistry {
    checks: Mutex<BTreeMap<String, Arc<dyn HealthCheck>>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            checks: Mutex::new(BTreeMap::new()),
        }
    }

    /// Register `check` under `name`, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, check: impl HealthCheck + 'static) {
        let mut checks = self.checks.lock().unwrap_or_else(PoisonError::into_inner);
        checks.insert(name.into(), Arc::new(check));
    }

    /// Remove the check registered under `name`.
    pub fn deregister(&self, name: &str) -> bool {
        let mut checks = self.checks.lock().unwrap_or_else(PoisonError::into_inner);
        checks.remove(name).is_some()
    }

    pub fn check_count(&self) -> usize {
        self.checks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run every registered check and aggregate the outcomes.
    pub fn run_all(&self) -> HealthReport {
        let checks: Vec<(String, Arc<dyn HealthCheck>)> = {
            let guard = self.checks.lock().unwrap_or_else(PoisonError::into_inner);
            guard
                .iter()
                .map(|(name, check)| (name.clone(), Arc::clone(check)))
                .collect()
        };
        // Checks run outside the registry lock; a slow check must not block
        // registration or other probes.
        let mut results = BTreeMap::new();
        let mut healthy = true;
        for (name, check) in checks {
            let status = check.check();
            if let HealthStatus::Unhealthy { message } = &status {
                healthy = false;
                warn!(check = %name, message = %message, "health check failed");
            }
            results.insert(name, status);
        }
        HealthReport {
            healthy,
            checks: results,
        }
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}
