use std::fmt;

use super::managed::BoxError;

/// Coordinator misuse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// `manage` was called after `start`; the registration list is frozen
    /// once bootstrap begins.
    AlreadyStarted,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::AlreadyStarted => {
                write!(
                    f,
                    "cannot register a managed object after the lifecycle has started"
                )
            }
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Fatal bootstrap failure: the managed object at `index` failed to start.
///
/// Objects registered after the failing one were never started; objects
/// before it are left running for the operator (typically the process exits
/// on this error).
#[derive(Debug)]
pub struct StartError {
    /// Registration index of the failing object.
    pub index: usize,
    /// Name of the failing object.
    pub name: String,
    /// The underlying start failure.
    pub source: BoxError,
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "managed object '{}' (registered #{}) failed to start: {}",
            self.name, self.index, self.source
        )
    }
}

impl std::error::Error for StartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Aggregate of every failure collected during a best-effort shutdown.
///
/// Shutdown attempts every managed object; this error reports all the ones
/// that failed rather than only the first.
#[derive(Debug, Default)]
pub struct ShutdownErrors {
    failures: Vec<(String, BoxError)>,
}

impl ShutdownErrors {
    pub(super) fn push(&mut self, name: String, error: BoxError) {
        self.failures.push((name, error));
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// The collected `(object name, error)` pairs, in stop order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &BoxError)> {
        self.failures.iter().map(|(n, e)| (n.as_str(), e))
    }
}

impl fmt::Display for ShutdownErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} managed object(s) failed to stop:", self.failures.len())?;
        for (name, error) in &self.failures {
            write!(f, " [{name}: {error}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for ShutdownErrors {}
