//! Byte streams over host I/O handles
//!
//! [`IoStream`] adapts anything `Read + Write` to the core's non-blocking
//! [`ByteStream`]. Handles configured with a short read timeout (serial
//! ports, sockets with `set_read_timeout`) report "nothing yet" as
//! `WouldBlock`; end of stream is a link failure.

use std::io::{self, ErrorKind, Read, Write};
use std::time::Duration;

use fixrelay_core::serial::SerialTiming;
use fixrelay_core::ByteStream;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::Result;

/// Read timeout applied to opened serial ports
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// [`ByteStream`] over a blocking I/O handle
#[derive(Debug)]
pub struct IoStream<T> {
    inner: T,
}

impl<T: Read + Write> IoStream<T> {
    /// Wrap `inner`
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Underlying handle
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Release the handle
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write> ByteStream for IoStream<T> {
    type Error = io::Error;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        let mut byte = [0u8; 1];
        match self.inner.read(&mut byte) {
            Ok(1) => Ok(byte[0]),
            Ok(_) => Err(nb::Error::Other(ErrorKind::UnexpectedEof.into())),
            Err(e) if is_idle(&e) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> std::result::Result<(), Self::Error> {
        self.inner.write_all(bytes)
    }

    fn flush(&mut self) -> std::result::Result<(), Self::Error> {
        self.inner.flush()
    }
}

fn is_idle(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

/// Serial port as a byte stream
pub type SerialLink = IoStream<Box<dyn SerialPort>>;

impl SerialLink {
    /// Open `path` at 8N1 without flow control
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyUSB0")
    /// * `timing` - Baud rate of the peer
    pub fn open(path: &str, timing: SerialTiming) -> Result<Self> {
        let port = serialport::new(path, timing.baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(DEFAULT_READ_TIMEOUT)
            .open()?;

        log::info!("Opened serial port: {} at {} baud", path, timing.baud);
        Ok(IoStream::new(port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// In-memory duplex handle: reads from `rx`, then times out
    struct Loopback {
        rx: Cursor<Vec<u8>>,
        tx: Vec<u8>,
        eof: bool,
    }

    impl Read for Loopback {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.rx.read(buf)? {
                0 if !self.eof => Err(ErrorKind::TimedOut.into()),
                n => Ok(n),
            }
        }
    }

    impl Write for Loopback {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn loopback(rx: &[u8], eof: bool) -> IoStream<Loopback> {
        IoStream::new(Loopback {
            rx: Cursor::new(rx.to_vec()),
            tx: Vec::new(),
            eof,
        })
    }

    #[test]
    fn timeout_is_would_block() {
        let mut stream = loopback(b"OK", false);
        assert_eq!(stream.read_byte().ok(), Some(b'O'));
        assert_eq!(stream.read_byte().ok(), Some(b'K'));
        assert!(matches!(stream.read_byte(), Err(nb::Error::WouldBlock)));
    }

    #[test]
    fn end_of_stream_is_a_failure() {
        let mut stream = loopback(b"", true);
        match stream.read_byte() {
            Err(nb::Error::Other(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn writes_pass_through() {
        let mut stream = loopback(b"", false);
        stream.write_all(b"AT\r\n").unwrap();
        stream.flush().unwrap();
        assert_eq!(stream.into_inner().tx, b"AT\r\n");
    }
}
