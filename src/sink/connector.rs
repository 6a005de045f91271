use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::net::{TcpStream, UdpSocket};
use std::path::{Path, PathBuf};

/// Opens the underlying transport for a [`ResilientSink`](super::ResilientSink).
///
/// A connector is the "open transport" operation the sink calls at
/// construction and on every recovery attempt. Each successful call must
/// produce a fresh, independent stream; the sink guarantees it holds at most
/// one live stream at a time.
pub trait Connector: Send + Sync {
    /// Open a new output stream.
    fn open(&self) -> io::Result<Box<dyn Write + Send>>;

    /// Human-readable endpoint description used in recovery log lines,
    /// e.g. `tcp [logs.internal:5170]`.
    fn description(&self) -> String;
}

/// TCP connector producing a byte stream to `host:port`.
///
/// Records are whatever bytes the caller writes; line-oriented consumers
/// expect the caller to include the trailing newline.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
}

impl TcpConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Connector for TcpConnector {
    fn open(&self) -> io::Result<Box<dyn Write + Send>> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))?;
        // Records are small and latency-sensitive; do not batch them in the
        // kernel behind Nagle.
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }

    fn description(&self) -> String {
        format!("tcp [{}:{}]", self.host, self.port)
    }
}

/// UDP connector producing a datagram-per-write stream to `host:port`.
///
/// The socket is bound to an ephemeral local port and connected, so `open`
/// fails fast on unresolvable addresses while individual sends remain
/// fire-and-forget.
#[derive(Debug, Clone)]
pub struct UdpConnector {
    host: String,
    port: u16,
}

impl UdpConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Connector for UdpConnector {
    fn open(&self) -> io::Result<Box<dyn Write + Send>> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect((self.host.as_str(), self.port))?;
        Ok(Box::new(DatagramStream { socket }))
    }

    fn description(&self) -> String {
        format!("udp [{}:{}]", self.host, self.port)
    }
}

/// Adapter giving a connected [`UdpSocket`] the `Write` shape the sink
/// expects: each `write` call is exactly one datagram.
struct DatagramStream {
    socket: UdpSocket,
}

impl Write for DatagramStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// File connector producing an append-mode stream.
///
/// Reopening after a failure (disk full, file removed, volume remounted)
/// recreates the file if necessary and continues appending.
#[derive(Debug, Clone)]
pub struct FileConnector {
    path: PathBuf,
}

impl FileConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Connector for FileConnector {
    fn open(&self) -> io::Result<Box<dyn Write + Send>> {
        let file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(Box::new(file))
    }

    fn description(&self) -> String {
        format!("file [{}]", self.path.display())
    }
}
