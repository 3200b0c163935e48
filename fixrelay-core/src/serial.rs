//! Paced line reception from the GPS serial link
//!
//! The receiver streams sentences continuously at a low baud rate. Lines are
//! read byte by byte into a [`FrameBuffer`], sleeping one character time
//! between bytes so the loop never spins faster than the link can deliver.

use crate::buffer::FrameBuffer;
use crate::constants::time::DEFAULT_GPS_BAUD;
use crate::errors::{TelemetryError, TelemetryResult};
use crate::time::byte_period_us;
use crate::traits::{ByteStream, Delay};

/// Per-byte pacing of a serial link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SerialTiming {
    /// Line rate in bits per second
    pub baud: u32,
    /// Time of one character on the wire (µs)
    pub byte_period_us: u32,
}

impl SerialTiming {
    /// 8N1 timing at `baud`
    pub const fn from_baud(baud: u32) -> Self {
        Self {
            baud,
            byte_period_us: byte_period_us(baud),
        }
    }

    /// Override the per-byte period
    pub const fn with_byte_period_us(mut self, us: u32) -> Self {
        self.byte_period_us = us;
        self
    }
}

impl Default for SerialTiming {
    fn default() -> Self {
        Self::from_baud(DEFAULT_GPS_BAUD)
    }
}

/// Reads `\n`-terminated lines from a byte stream
pub struct LineReader<S, D> {
    stream: S,
    delay: D,
    timing: SerialTiming,
}

impl<S: ByteStream, D: Delay> LineReader<S, D> {
    /// Wrap a stream with the given pacing
    pub fn new(stream: S, delay: D, timing: SerialTiming) -> Self {
        Self {
            stream,
            delay,
            timing,
        }
    }

    /// Block until a full line has been received into `line`
    ///
    /// `line` is cleared first. The terminator is kept. When the line is
    /// longer than the buffer, the stored prefix is left in `line` and
    /// `FrameTruncated` is returned; the remainder of the oversized line is
    /// read as the start of the next call.
    pub fn read_line<const N: usize>(&mut self, line: &mut FrameBuffer<N>) -> TelemetryResult<()> {
        line.clear();

        loop {
            match self.stream.read_byte() {
                Ok(byte) => {
                    if !line.push(byte) {
                        log_debug!("line exceeded {} bytes, truncated", FrameBuffer::<N>::USABLE);
                        return Err(TelemetryError::FrameTruncated {
                            capacity: FrameBuffer::<N>::USABLE,
                        });
                    }
                    self.delay.delay_us(self.timing.byte_period_us);
                    if byte == b'\n' {
                        return Ok(());
                    }
                }
                Err(nb::Error::WouldBlock) => {
                    self.delay.delay_us(self.timing.byte_period_us);
                }
                Err(nb::Error::Other(_e)) => {
                    log_warn!("GPS link read failed: {:?}", _e);
                    return Err(TelemetryError::Serial {
                        reason: "GPS read failed",
                    });
                }
            }
        }
    }

    /// Write bytes to the receiver (configuration sentences)
    pub fn write_all(&mut self, bytes: &[u8]) -> TelemetryResult<()> {
        self.stream
            .write_all(bytes)
            .and_then(|_| self.stream.flush())
            .map_err(|_| TelemetryError::Serial {
                reason: "GPS write failed",
            })
    }

    /// Pacing in use
    pub fn timing(&self) -> SerialTiming {
        self.timing
    }

    /// Underlying stream
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Release the stream and delay
    pub fn into_inner(self) -> (S, D) {
        (self.stream, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSerial;
    use crate::time::MockTimeSource;
    use crate::traits::TimeSource;

    #[test]
    fn reads_one_line_at_a_time() {
        let mut serial = MockSerial::new();
        serial.inject_rx(b"$A*41\r\n$B*42\r\n");
        serial.close_when_drained();
        let clock = MockTimeSource::new(0);
        let mut reader = LineReader::new(serial, &clock, SerialTiming::from_baud(9600));

        let mut line: FrameBuffer<32> = FrameBuffer::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line.as_bytes(), b"$A*41\r\n");

        reader.read_line(&mut line).unwrap();
        assert_eq!(line.as_bytes(), b"$B*42\r\n");

        assert!(matches!(
            reader.read_line(&mut line),
            Err(TelemetryError::Serial { .. })
        ));
    }

    #[test]
    fn paces_each_byte() {
        let mut serial = MockSerial::new();
        serial.inject_rx(b"ab\n");
        let clock = MockTimeSource::new(0);
        let mut reader = LineReader::new(serial, &clock, SerialTiming::from_baud(9600));

        let mut line: FrameBuffer<8> = FrameBuffer::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(clock.now().ticks(), 3 * 1041);
    }

    #[test]
    fn oversized_line_is_truncated() {
        let mut serial = MockSerial::new();
        serial.inject_rx(b"0123456789\r\n");
        let clock = MockTimeSource::new(0);
        let mut reader = LineReader::new(serial, &clock, SerialTiming::default());

        let mut line: FrameBuffer<5> = FrameBuffer::new();
        let err = reader.read_line(&mut line).unwrap_err();
        assert_eq!(err, TelemetryError::FrameTruncated { capacity: 4 });
        assert_eq!(line.as_bytes(), b"0123");
        assert!(line.is_truncated());
    }
}
