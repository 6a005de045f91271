use std::sync::Arc;

use tracing::{error, info, warn};

use super::error::{LifecycleError, ShutdownErrors, StartError};
use super::managed::Managed;

/// Where a [`Lifecycle`] is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Running,
    Stopped,
    /// Bootstrap aborted on a start failure. Terminal: a retried `start`
    /// is a logged no-op, so no object's `start` hook ever runs twice.
    Failed,
}

/// Sequences start/stop calls for registered [`Managed`] objects.
///
/// Objects start in registration order and stop in reverse registration
/// order, so resources come up before their dependents and are released
/// only after dependents have stopped. See the
/// [module docs](crate::lifecycle) for the fail-fast start / best-effort
/// stop contract.
pub struct Lifecycle {
    objects: Vec<Arc<dyn Managed>>,
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            state: LifecycleState::NotStarted,
        }
    }

    /// Register a managed object. Registration order is start order.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyStarted`] once `start` has run; the
    /// registration list is frozen at bootstrap.
    pub fn manage(&mut self, object: Arc<dyn Managed>) -> Result<(), LifecycleError> {
        if self.state != LifecycleState::NotStarted {
            return Err(LifecycleError::AlreadyStarted);
        }
        self.objects.push(object);
        Ok(())
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn managed_count(&self) -> usize {
        self.objects.len()
    }

    /// Start every managed object in registration order.
    ///
    /// Fail-fast: the first failure aborts bootstrap, moves the lifecycle
    /// to [`LifecycleState::Failed`], and objects after the failing one are
    /// never started. Objects already started are left running; the
    /// expected operator response to a [`StartError`] is to exit.
    ///
    /// Calling `start` when not in the `NotStarted` state is a logged
    /// no-op, so a failed bootstrap is never retried against objects that
    /// already ran their `start` hook.
    pub fn start(&mut self) -> Result<(), StartError> {
        if self.state != LifecycleState::NotStarted {
            warn!(state = ?self.state, "lifecycle start ignored");
            return Ok(());
        }
        for (index, object) in self.objects.iter().enumerate() {
            info!(object = object.name(), index, "starting managed object");
            if let Err(source) = object.start() {
                error!(
                    object = object.name(),
                    index,
                    error = %source,
                    "managed object failed to start, aborting bootstrap"
                );
                self.state = LifecycleState::Failed;
                return Err(StartError {
                    index,
                    name: object.name().to_string(),
                    source,
                });
            }
        }
        self.state = LifecycleState::Running;
        info!(count = self.objects.len(), "all managed objects started");
        Ok(())
    }

    /// Stop every managed object in reverse registration order.
    ///
    /// Best-effort: every object receives a stop attempt regardless of
    /// earlier failures; all failures come back in the returned
    /// [`ShutdownErrors`]. Idempotent — a second call (or a call before
    /// `start`) is a no-op.
    pub fn stop(&mut self) -> Result<(), ShutdownErrors> {
        if self.state != LifecycleState::Running {
            return Ok(());
        }
        self.state = LifecycleState::Stopped;
        let mut errors = ShutdownErrors::default();
        for object in self.objects.iter().rev() {
            info!(object = object.name(), "stopping managed object");
            if let Err(e) = object.stop() {
                warn!(
                    object = object.name(),
                    error = %e,
                    "managed object failed to stop, continuing shutdown"
                );
                errors.push(object.name().to_string(), e);
            }
        }
        if errors.is_empty() {
            info!(count = self.objects.len(), "all managed objects stopped");
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
