//! TCP collector appending received records to a CSV file
//!
//! Serves one connection at a time. Each connection is expected to carry a
//! single record; the collector reads once, up to [`READ_CHUNK`] bytes,
//! checks that the text parses as a record and appends it. Anything else is
//! logged and dropped.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use fixrelay_core::record::CSV_HEADER;
use fixrelay_core::TelemetryRecord;

use crate::Result;

/// Largest read per connection
pub const READ_CHUNK: usize = 256;

/// How long a connection may stay silent before it is dropped
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectorStats {
    /// Connections accepted
    pub connections: u64,
    /// Records appended
    pub records: u64,
    /// Connections whose data was not a record
    pub malformed: u64,
}

/// Record sink listening on a TCP port
#[derive(Debug)]
pub struct Collector {
    listener: TcpListener,
    output: PathBuf,
    stats: CollectorStats,
}

impl Collector {
    /// Listen on `addr`, appending to `output`
    pub fn bind(addr: impl ToSocketAddrs, output: impl Into<PathBuf>) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        let output = output.into();
        log::info!(
            "Collector listening on {}, writing {}",
            listener.local_addr()?,
            output.display()
        );
        Ok(Self {
            listener,
            output,
            stats: CollectorStats::default(),
        })
    }

    /// Bound address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// CSV file records are appended to
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Counters since bind
    pub fn stats(&self) -> CollectorStats {
        self.stats
    }

    /// Wait for one connection and store what it carries
    ///
    /// `None` when the connection closed without data or the data was not
    /// a record.
    pub fn accept_one(&mut self) -> Result<Option<TelemetryRecord>> {
        let (stream, peer) = self.listener.accept()?;
        self.handle(stream, peer)
    }

    /// Accept connections until the listener fails
    ///
    /// Errors on a single connection are logged and do not stop the loop.
    pub fn serve(&mut self) -> Result<()> {
        loop {
            let (stream, peer) = self.listener.accept()?;
            match self.handle(stream, peer) {
                Ok(Some(record)) => log::info!(
                    "Stored fix {:.6},{:.6} from {}",
                    record.fix.latitude,
                    record.fix.longitude,
                    peer
                ),
                Ok(None) => {}
                Err(e) => log::warn!("Connection from {} failed: {}", peer, e),
            }
        }
    }

    fn handle(&mut self, stream: TcpStream, peer: SocketAddr) -> Result<Option<TelemetryRecord>> {
        self.stats.connections += 1;
        log::debug!("Connection from {}", peer);

        let Some(record) = self.receive(stream)? else {
            return Ok(None);
        };
        append_record(&self.output, &record)?;
        self.stats.records += 1;
        Ok(Some(record))
    }

    fn receive(&mut self, mut stream: TcpStream) -> Result<Option<TelemetryRecord>> {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        let mut buf = [0u8; READ_CHUNK];
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }

        let text = String::from_utf8_lossy(&buf[..n]);
        match TelemetryRecord::parse(&text) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                self.stats.malformed += 1;
                log::warn!("Dropped {} bytes: {}", n, e);
                Ok(None)
            }
        }
    }
}

/// Append `record` to the CSV at `path`, writing the header first if the
/// file is new or empty
pub fn append_record(path: &Path, record: &TelemetryRecord) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if file.metadata()?.len() == 0 {
        writeln!(file, "{}", CSV_HEADER)?;
    }
    writeln!(file, "{}", record)?;
    Ok(())
}
