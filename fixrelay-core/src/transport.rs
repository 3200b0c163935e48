//! Command/response transport over a byte stream
//!
//! ## Overview
//!
//! The modem speaks a line-oriented text protocol: the host writes a
//! command terminated by `\r\n`, the modem answers with some lines of text,
//! and success is recognised by a substring (`OK`, `>`, ...) appearing
//! anywhere in the answer. A [`TransportSession`] performs one such exchange
//! at a time:
//!
//! ```text
//!  write "AT\r\n"
//!       │
//!       ▼
//!  ┌─────────────┐  bytes   ┌──────────────┐ match ┌─────────┐
//!  │ poll stream │ ───────▶ │ response buf │ ────▶ │ success │
//!  └─────────────┘          └──────────────┘       └─────────┘
//!       ▲   │ nothing              │ full, no match
//!       │   ▼                      ▼
//!    delay poll interval        clear, keep going
//!       │
//!       └── deadline passed ──▶ TransportTimeout
//! ```
//!
//! There are no retries inside an exchange. Callers decide what a failed
//! command means.
//!
//! ## Buffer Ownership
//!
//! The response buffer belongs to the session and is sized by the const
//! generic `N`, so two sessions on two links never share state.

use crate::buffer::FrameBuffer;
use crate::constants::nmea::LINE_TERMINATOR;
use crate::constants::time::{DEFAULT_POLL_INTERVAL_US, DEFAULT_RESPONSE_TIMEOUT_MS};
use crate::constants::RESPONSE_CAPACITY;
use crate::errors::{TelemetryError, TelemetryResult};
use crate::time::{Deadline, Duration};
use crate::traits::{ByteStream, Delay, TimeSource};

/// One command line and the response that acknowledges it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    /// Command text without terminator
    pub text: &'a str,
    /// Substring that marks success
    pub expect: &'a str,
    /// How long to wait for `expect`
    pub timeout_ms: u64,
}

impl<'a> Command<'a> {
    /// Command with the default response timeout
    pub const fn new(text: &'a str, expect: &'a str) -> Self {
        Self {
            text,
            expect,
            timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
        }
    }

    /// Override the response timeout
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Transport tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransportConfig {
    /// Default wait for a response (ms)
    pub response_timeout_ms: u64,
    /// Sleep between polls when no byte is pending (µs)
    pub poll_interval_us: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
        }
    }
}

impl TransportConfig {
    /// Set the default response timeout
    pub fn with_response_timeout_ms(mut self, ms: u64) -> Self {
        self.response_timeout_ms = ms;
        self
    }

    /// Set the idle poll interval
    pub fn with_poll_interval_us(mut self, us: u32) -> Self {
        self.poll_interval_us = us;
        self
    }
}

/// Result of one read batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Poll {
    /// Expected text is in the buffer
    Matched,
    /// Stream ran dry
    Idle,
    /// Stream still had bytes when the batch ended
    Busy,
}

/// Command/response session over one serial link
pub struct TransportSession<S, C, const N: usize = RESPONSE_CAPACITY> {
    stream: S,
    clock: C,
    config: TransportConfig,
    response: FrameBuffer<N>,
}

impl<S, C, const N: usize> TransportSession<S, C, N>
where
    S: ByteStream,
    C: TimeSource + Delay,
{
    /// Session over `stream`, timed by `clock`
    pub fn new(stream: S, clock: C, config: TransportConfig) -> Self {
        Self {
            stream,
            clock,
            config,
            response: FrameBuffer::new(),
        }
    }

    /// Command using this session's default timeout
    pub fn command<'a>(&self, text: &'a str, expect: &'a str) -> Command<'a> {
        Command::new(text, expect).with_timeout_ms(self.config.response_timeout_ms)
    }

    /// Send a command and wait for its acknowledgement
    ///
    /// `true` as soon as `command.expect` appears in the response, `false`
    /// on timeout or link failure.
    pub fn exchange(&mut self, command: &Command<'_>) -> bool {
        self.try_exchange(command).is_ok()
    }

    /// Like [`exchange`](Self::exchange), reporting why it failed
    pub fn try_exchange(&mut self, command: &Command<'_>) -> TelemetryResult<()> {
        self.response.clear();
        self.write(command.text.as_bytes())?;
        self.write(LINE_TERMINATOR)?;

        let expect = command.expect.as_bytes();
        let deadline = Deadline::after(&self.clock, Duration::millis(command.timeout_ms));

        loop {
            let poll = self.read_batch(expect)?;
            if poll == Poll::Matched {
                log_debug!("'{}' acknowledged", command.text);
                return Ok(());
            }
            if deadline.has_expired(&self.clock) {
                let waited_ms = deadline.elapsed(&self.clock).to_millis();
                log_warn!(
                    "'{}' got no '{}' within {} ms",
                    command.text,
                    command.expect,
                    waited_ms
                );
                return Err(TelemetryError::TransportTimeout { waited_ms });
            }
            if poll == Poll::Idle {
                self.clock.delay_us(self.config.poll_interval_us);
            }
        }
    }

    /// Read pending bytes, at most one buffer's worth
    ///
    /// A peer that never stops sending still returns control to the
    /// deadline check after `N` bytes.
    fn read_batch(&mut self, expect: &[u8]) -> TelemetryResult<Poll> {
        for _ in 0..N.max(1) {
            match self.stream.read_byte() {
                Ok(byte) => {
                    if !self.response.push(byte) {
                        if self.response.contains(expect) {
                            return Ok(Poll::Matched);
                        }
                        self.response.clear();
                        self.response.push(byte);
                    }
                }
                Err(nb::Error::WouldBlock) => return Ok(self.settle(expect, Poll::Idle)),
                Err(nb::Error::Other(_e)) => {
                    log_warn!("modem link read failed: {:?}", _e);
                    return Err(TelemetryError::Serial {
                        reason: "modem read failed",
                    });
                }
            }
        }
        Ok(self.settle(expect, Poll::Busy))
    }

    fn settle(&self, expect: &[u8], otherwise: Poll) -> Poll {
        if self.response.contains(expect) {
            Poll::Matched
        } else {
            otherwise
        }
    }

    fn write(&mut self, bytes: &[u8]) -> TelemetryResult<()> {
        self.stream.write_all(bytes).map_err(|_e| {
            log_warn!("modem link write failed: {:?}", _e);
            TelemetryError::Serial {
                reason: "modem write failed",
            }
        })
    }

    /// Write bytes verbatim, no terminator, no response expected
    pub fn send_raw(&mut self, bytes: &[u8]) -> TelemetryResult<()> {
        self.write(bytes)?;
        self.stream.flush().map_err(|_| TelemetryError::Serial {
            reason: "modem flush failed",
        })
    }

    /// Discard pending inbound bytes; returns how many were dropped
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while self.stream.read_byte().is_ok() {
            dropped += 1;
        }
        self.response.clear();
        dropped
    }

    /// Bytes accumulated by the last exchange
    pub fn response(&self) -> &[u8] {
        self.response.as_bytes()
    }

    /// Clock driving deadlines and delays
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Transport tuning in use
    pub fn config(&self) -> TransportConfig {
        self.config
    }

    /// Underlying stream
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Release stream and clock
    pub fn into_inner(self) -> (S, C) {
        (self.stream, self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSerial;
    use crate::time::MockTimeSource;

    #[test]
    fn succeeds_on_first_match() {
        let mut modem = MockSerial::new();
        modem.respond_to("AT", b"AT\r\r\nOK\r\n");
        let clock = MockTimeSource::new(0);
        let mut session: TransportSession<_, _> =
            TransportSession::new(modem, &clock, TransportConfig::default());

        assert!(session.exchange(&Command::new("AT", "OK")));
        assert_eq!(clock.now().ticks(), 0);

        let (modem, _) = session.into_inner();
        assert_eq!(modem.written(), b"AT\r\n");
    }

    #[test]
    fn times_out_without_match() {
        let mut modem = MockSerial::new();
        modem.respond_to("AT+CWJAP", b"FAIL\r\n");
        let clock = MockTimeSource::new(0);
        let mut session: TransportSession<_, _> =
            TransportSession::new(modem, &clock, TransportConfig::default());

        let command = Command::new("AT+CWJAP=\"x\",\"y\"", "OK").with_timeout_ms(100);
        assert_eq!(
            session.try_exchange(&command),
            Err(TelemetryError::TransportTimeout { waited_ms: 100 })
        );
        assert!(clock.now().ticks() >= 100_000);
        assert_eq!(session.response(), b"FAIL\r\n");
    }

    #[test]
    fn full_buffer_is_cleared_and_matching_continues() {
        let mut modem = MockSerial::new();
        modem.inject_rx(b"0123456789abcdefOK");
        let clock = MockTimeSource::new(0);
        let mut session: TransportSession<_, _, 8> =
            TransportSession::new(modem, &clock, TransportConfig::default());

        assert!(session.exchange(&Command::new("AT", "OK")));
        assert!(session.response().ends_with(b"OK"));
    }

    #[test]
    fn late_response_arrives_before_deadline() {
        let mut modem = MockSerial::new();
        modem.respond_after("AT+CIPSEND", b"\r\n> ", 3);
        let clock = MockTimeSource::new(0);
        let mut session: TransportSession<_, _> =
            TransportSession::new(modem, &clock, TransportConfig::default());

        assert!(session.exchange(&Command::new("AT+CIPSEND", ">")));
        let elapsed = clock.now().ticks();
        assert!(elapsed > 0 && elapsed < 2_500_000);
    }

    #[test]
    fn raw_bytes_and_drain() {
        let mut modem = MockSerial::new();
        modem.inject_rx(b"stale\r\n");
        let clock = MockTimeSource::new(0);
        let mut session: TransportSession<_, _> =
            TransportSession::new(modem, &clock, TransportConfig::default());

        assert_eq!(session.drain(), 7);
        session.send_raw(b"+++").unwrap();

        let (modem, _) = session.into_inner();
        assert_eq!(modem.written(), b"+++");
    }

    #[test]
    fn link_failure_is_reported() {
        let mut modem = MockSerial::new();
        modem.close_when_drained();
        let clock = MockTimeSource::new(0);
        let mut session: TransportSession<_, _> =
            TransportSession::new(modem, &clock, TransportConfig::default());

        assert!(matches!(
            session.try_exchange(&Command::new("AT", "OK")),
            Err(TelemetryError::Serial { .. })
        ));
    }
}
