//! # Sink Module
//!
//! Best-effort delivery of log/metric records over unreliable transports.
//!
//! ## Overview
//!
//! A [`ResilientSink`] wraps a lazily-reopenable output stream (a TCP
//! connection, a connected UDP socket, an append-mode file) and trades
//! delivery guarantees for availability: a producing thread never blocks
//! indefinitely and never sees an error because the far end is down. Failed
//! records are dropped and counted; the sink reopens its transport at a fixed
//! recovery interval, not on every write.
//!
//! ## Transports
//!
//! Transports are pluggable through the [`Connector`] trait rather than a
//! subclass per transport: one sink type, many ways to open a stream.
//!
//! - [`TcpConnector`] — newline-delimited text over a TCP byte stream
//! - [`UdpConnector`] — one datagram per `write` call
//! - [`FileConnector`] — append-mode local file
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use svckit::clock::SystemClock;
//! use svckit::sink::{ResilientSink, TcpConnector};
//!
//! let sink = ResilientSink::new(
//!     Box::new(TcpConnector::new("logs.internal", 5170)),
//!     Duration::from_secs(5),
//!     Arc::new(SystemClock),
//! )?;
//! sink.write(b"service started\n");
//! ```

mod connector;
mod resilient;

pub use connector::{Connector, FileConnector, TcpConnector, UdpConnector};
pub use resilient::ResilientSink;
