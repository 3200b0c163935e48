//! Serial Byte Stream Trait
//!
//! Both serial peers of the loop, the GPS receiver and the modem, are plain
//! byte streams. Reads follow a pull-based model using the `nb` crate:
//!
//! - `Ok(byte)` - A byte was available
//! - `Err(nb::Error::WouldBlock)` - Nothing received yet, try again later
//! - `Err(nb::Error::Other(e))` - The link failed
//!
//! Writes block until the bytes are handed to the transmitter.
//!
//! ```rust
//! use fixrelay_core::traits::ByteStream;
//!
//! fn drain<S: ByteStream>(stream: &mut S) -> usize {
//!     let mut count = 0;
//!     while let Ok(_) = stream.read_byte() {
//!         count += 1;
//!     }
//!     count
//! }
//! ```

/// Bidirectional serial byte stream
pub trait ByteStream {
    /// Link error type
    type Error: core::fmt::Debug;

    /// Attempt to read one received byte
    ///
    /// Must not block. Returns `WouldBlock` when the receive FIFO is empty.
    fn read_byte(&mut self) -> nb::Result<u8, Self::Error>;

    /// Write all bytes, blocking until they are queued for transmission
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Wait until queued bytes have left the transmitter
    ///
    /// Default implementation assumes writes are already synchronous.
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<S: ByteStream + ?Sized> ByteStream for &mut S {
    type Error = S::Error;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        (**self).read_byte()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write_all(bytes)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }
}
