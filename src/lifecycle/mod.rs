//! # Lifecycle Module
//!
//! Ordered start/stop coordination for managed objects.
//!
//! ## Overview
//!
//! Anything a service owns that must come up before traffic is served and be
//! released after draining — a connection pool, a background flusher, a
//! record sink — implements the [`Managed`] trait. A [`Lifecycle`] owns the
//! registered objects in registration order and drives them through
//! bootstrap and shutdown:
//!
//! - `start()` runs in registration order and is **fail-fast**: the first
//!   failure aborts bootstrap and is returned as a [`StartError`]. Later
//!   objects are never started.
//! - `stop()` runs in reverse registration order and is **best-effort**:
//!   every object gets a stop attempt regardless of earlier failures, and
//!   all failures come back aggregated in [`ShutdownErrors`].
//!
//! Registration order is the dependency order: a pool registered before the
//! component that borrows from it is available when that component starts
//! and still alive when it stops.
//!
//! ## Threading
//!
//! Start and stop are control-plane operations driven from the single thread
//! orchestrating bootstrap/shutdown; the coordinator takes `&mut self` and
//! is not meant for concurrent invocation.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use svckit::lifecycle::{BoxError, Lifecycle, Managed};
//!
//! struct Flusher;
//!
//! impl Managed for Flusher {
//!     fn start(&self) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//!     fn stop(&self) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//!     fn name(&self) -> &str {
//!         "flusher"
//!     }
//! }
//!
//! let mut lifecycle = Lifecycle::new();
//! lifecycle.manage(Arc::new(Flusher)).unwrap();
//! lifecycle.start().unwrap();
//! lifecycle.stop().unwrap();
//! ```

mod coordinator;
mod error;
mod managed;

pub use coordinator::{Lifecycle, LifecycleState};
pub use error::{LifecycleError, ShutdownErrors, StartError};
pub use managed::{BoxError, Managed};
