//! # Logging Module
//!
//! Bridges a [`ResilientSink`] into the `tracing-subscriber` stack.
//!
//! ## Overview
//!
//! svckit does not implement a logging backend; `tracing` is the backend.
//! What this module provides is the writer seam: [`SinkWriter`] implements
//! `MakeWriter`, so a formatting layer can ship every event over a resilient
//! TCP/UDP/file sink with the sink's no-throw, drop-on-failure semantics —
//! a logging pipeline must never take down the thread that logs.
//!
//! Each event is buffered and handed to the sink as **one** `write` call,
//! so the UDP transport emits exactly one datagram per event and the TCP
//! transport never interleaves half-formatted lines from racing threads.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tracing_subscriber::layer::SubscriberExt;
//!
//! let sink = Arc::new(config.build(Arc::new(SystemClock))?);
//! let subscriber = tracing_subscriber::registry()
//!     .with(svckit::logging::fmt_layer(Arc::clone(&sink)));
//! tracing::subscriber::set_global_default(subscriber)?;
//! ```

use std::io;
use std::sync::Arc;

use tracing_subscriber::fmt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;

use crate::sink::ResilientSink;

/// `MakeWriter` handle over a shared [`ResilientSink`].
///
/// Cloning is cheap (one `Arc` bump); every formatted event gets its own
/// [`EventWriter`].
#[derive(Clone)]
pub struct SinkWriter {
    sink: Arc<ResilientSink>,
}

impl SinkWriter {
    pub fn new(sink: Arc<ResilientSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &Arc<ResilientSink> {
        &self.sink
    }
}

impl<'a> MakeWriter<'a> for SinkWriter {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            sink: Arc::clone(&self.sink),
            buf: Vec::new(),
        }
    }
}

/// Per-event writer: accumulates the formatted bytes and delivers them as a
/// single sink record when dropped.
pub struct EventWriter {
    sink: Arc<ResilientSink>,
    buf: Vec<u8>,
}

impl io::Write for EventWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            self.sink.write(&self.buf);
        }
    }
}

/// A plain-text formatting layer writing through `sink`.
///
/// ANSI escapes are disabled; the far end of a socket sink is a log
/// aggregator, not a terminal.
pub fn fmt_layer<S>(
    sink: Arc<ResilientSink>,
) -> fmt::Layer<S, fmt::format::DefaultFields, fmt::format::Format, SinkWriter>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(false)
        .with_writer(SinkWriter::new(sink))
}
