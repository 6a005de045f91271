/// Boxed error type carried across the `Managed` seam.
///
/// Managed objects come from application code with arbitrary error types;
/// the coordinator only needs to report them, not match on them.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A component with explicit start/stop lifecycle hooks.
///
/// Implementations are registered with a
/// [`Lifecycle`](super::Lifecycle) (directly or through an
/// [`Environment`](crate::environment::Environment)) and are started when
/// the host transitions to serving and stopped when shutdown begins.
///
/// `start` may register observability gauges for the component; `stop` must
/// deregister them (or render them inert) so a stopped component never
/// reports stale values.
pub trait Managed: Send + Sync {
    /// Bring the component up. Called once, before the service accepts
    /// work. A failure here is fatal to bootstrap.
    fn start(&self) -> Result<(), BoxError>;

    /// Release the component. Called once during shutdown; failures are
    /// collected and reported, never fatal to the rest of shutdown.
    fn stop(&self) -> Result<(), BoxError>;

    /// Name used in lifecycle logs and error reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
