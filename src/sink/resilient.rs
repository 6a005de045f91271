use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::Connector;
use crate::clock::Clock;

/// Resilient output sink: suppressed errors, periodic reconnection.
///
/// Wraps a reopenable stream produced by a [`Connector`] and delivers records
/// best-effort. The write path has a hard contract: it never returns an
/// error, never panics, and never blocks behind a reopen attempt. A failed
/// write marks the sink dirty, drops the stream handle, and suppresses
/// further writes until the recovery interval has elapsed; the next write
/// after that attempts exactly one reopen.
///
/// Diagnosis happens through counters instead of exceptions:
/// [`failures`](ResilientSink::failures) counts consecutive transport
/// errors and resets when the transport recovers,
/// [`dropped`](ResilientSink::dropped) counts every record that was not
/// delivered over the sink's lifetime.
///
/// ## Locking
///
/// One mutex guards the stream handle and the clean/dirty state, so a write
/// and a concurrent reopen can never race to replace the handle. Writers
/// take the lock with `try_lock`: if another thread is mid-reopen (or
/// mid-write), the record is dropped and counted rather than queued. Slow
/// recovery therefore costs records, never caller latency.
pub struct ResilientSink {
    connector: Box<dyn Connector>,
    recovery_interval: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<SinkState>,
    failures: AtomicU64,
    dropped: AtomicU64,
}

struct SinkState {
    /// Live stream handle; `None` whenever the sink is dirty or closed.
    stream: Option<Box<dyn Write + Send>>,
    /// The last write or open on this handle succeeded.
    presumed_clean: bool,
    /// When the last failed write or reopen attempt happened.
    last_attempt: Option<Instant>,
    closed: bool,
}

impl ResilientSink {
    /// Create a sink, eagerly opening the transport.
    ///
    /// # Errors
    ///
    /// Returns the open error if the endpoint is unreachable. Refusing to
    /// build over a dead endpoint surfaces misconfiguration at bootstrap
    /// instead of silently dropping every record; use
    /// [`new_lazy`](ResilientSink::new_lazy) when a dead endpoint at startup
    /// is acceptable.
    pub fn new(
        connector: Box<dyn Connector>,
        recovery_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> std::io::Result<Self> {
        let stream = connector.open()?;
        debug!(sink = %connector.description(), "sink transport opened");
        Ok(Self {
            connector,
            recovery_interval,
            clock,
            state: Mutex::new(SinkState {
                stream: Some(stream),
                presumed_clean: true,
                last_attempt: None,
                closed: false,
            }),
            failures: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        })
    }

    /// Create a sink without opening the transport.
    ///
    /// The first write performs the first open attempt; until one succeeds
    /// the sink behaves as dirty, so failed attempts are paced by the
    /// recovery interval like any other reopen.
    pub fn new_lazy(
        connector: Box<dyn Connector>,
        recovery_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connector,
            recovery_interval,
            clock,
            state: Mutex::new(SinkState {
                stream: None,
                presumed_clean: false,
                last_attempt: None,
                closed: false,
            }),
            failures: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Deliver one record, best effort.
    ///
    /// Clean path: write and flush the live stream; on failure the sink goes
    /// dirty and the record counts as dropped. Dirty path: if the recovery
    /// interval has elapsed since the last attempt, try one reopen and — on
    /// success — deliver this record through the fresh stream; otherwise
    /// drop it.
    ///
    /// Never returns an error and never blocks behind another thread's
    /// write or reopen (contended records are dropped and counted).
    pub fn write(&self, record: &[u8]) {
        let Ok(mut state) = self.state.try_lock() else {
            // Another thread holds the sink (possibly in a slow reopen):
            // check-and-skip, never queue.
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };
        if state.closed {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        if state.presumed_clean {
            if let Some(stream) = state.stream.as_mut() {
                match stream.write_all(record).and_then(|()| stream.flush()) {
                    Ok(()) => return,
                    Err(e) => {
                        self.note_failure(&mut state);
                        warn!(
                            sink = %self.connector.description(),
                            error = %e,
                            "write failed, suppressing output until recovery"
                        );
                        return;
                    }
                }
            }
        }

        // Dirty: reopen at most once per interval.
        if !self.recovery_due(&state) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        state.last_attempt = Some(self.clock.now());
        match self.connector.open() {
            Ok(mut stream) => match stream.write_all(record).and_then(|()| stream.flush()) {
                Ok(()) => {
                    state.stream = Some(stream);
                    state.presumed_clean = true;
                    // Recovery clears the dirty streak.
                    self.failures.store(0, Ordering::Relaxed);
                    info!(sink = %self.connector.description(), "sink transport recovered");
                }
                Err(e) => {
                    self.note_failure(&mut state);
                    warn!(
                        sink = %self.connector.description(),
                        error = %e,
                        "write on recovered transport failed"
                    );
                }
            },
            Err(e) => {
                self.note_failure(&mut state);
                warn!(
                    sink = %self.connector.description(),
                    error = %e,
                    "reopen attempt failed"
                );
            }
        }
    }

    /// Best-effort flush of the live stream; same no-throw contract as
    /// [`write`](ResilientSink::write).
    pub fn flush(&self) {
        let Ok(mut state) = self.state.try_lock() else {
            return;
        };
        if let Some(stream) = state.stream.as_mut() {
            if let Err(e) = stream.flush() {
                state.presumed_clean = false;
                state.stream = None;
                state.last_attempt = Some(self.clock.now());
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(sink = %self.connector.description(), error = %e, "flush failed");
            }
        }
    }

    /// Release the stream handle unconditionally.
    ///
    /// Tolerates the handle already being closed or absent. Records written
    /// after close are dropped and counted.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.stream = None;
        state.presumed_clean = false;
        state.closed = true;
    }

    /// Count of consecutive transport errors (failed writes, flushes, and
    /// reopens) since the transport was last known good. Zero while the
    /// sink is clean; reset when a reopen succeeds.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Count of records that were not delivered, over the sink's lifetime.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Whether the last write or open succeeded.
    pub fn is_presumed_clean(&self) -> bool {
        self.state
            .lock()
            .map(|s| s.presumed_clean)
            .unwrap_or(false)
    }

    /// Endpoint description, e.g. `udp [10.0.0.1:514]`.
    pub fn description(&self) -> String {
        self.connector.description()
    }

    fn note_failure(&self, state: &mut SinkState) {
        state.presumed_clean = false;
        state.stream = None;
        state.last_attempt = Some(self.clock.now());
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn recovery_due(&self, state: &SinkState) -> bool {
        match state.last_attempt {
            None => true,
            Some(at) => self.clock.now().duration_since(at) >= self.recovery_interval,
        }
    }
}

impl Drop for ResilientSink {
    fn drop(&mut self) {
        self.flush();
    }
}
