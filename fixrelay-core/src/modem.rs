//! Scripted modem sequences
//!
//! Built on [`TransportSession`]: every step is one command/response
//! exchange. A failed step is logged and counted, and the script moves on to
//! the next step. Nothing is retried.
//!
//! ## Association
//!
//! | Command                      | Expect |
//! |------------------------------|--------|
//! | `AT`                         | `OK`   |
//! | `AT+CWMODE=3`                | `OK`   |
//! | `AT+CWJAP="<ssid>","<pass>"` | `OK`   |
//!
//! ## Delivery of one record
//!
//! | Step                                | Expect | Then               |
//! |-------------------------------------|--------|--------------------|
//! | `AT+CIPSTART="TCP","<host>",<port>` | `OK`   |                    |
//! | `AT+CIPMODE=1`                      | `OK`   | settle 10 ms       |
//! | `AT+CIPSEND`                        | `>`    | settle 20 ms       |
//! | payload bytes, raw                  |        | guard 50 ms        |
//! | `+++`, raw                          |        |                    |
//! | `AT+CIPCLOSE` (optional)            | `OK`   |                    |
//! | `AT+CIPMODE=0` (optional)           | `OK`   |                    |

use core::fmt::Write;

use heapless::String;

use crate::constants::buffers::{HOST_CAPACITY, PASSPHRASE_CAPACITY, SSID_CAPACITY};
use crate::constants::time::{
    ASSOCIATION_SETTLE_MS, DEFAULT_JOIN_TIMEOUT_MS, ESCAPE_GUARD_MS, ESCAPE_SETTLE_MS,
    PROMPT_SETTLE_MS, RAW_MODE_SETTLE_MS, RESET_SETTLE_MS,
};
use crate::constants::COMMAND_CAPACITY;
use crate::errors::{TelemetryError, TelemetryResult};
use crate::traits::{ByteStream, Delay, TimeSource};
use crate::transport::{Command, TransportSession};

/// Escape sentinel that leaves raw-forwarding mode
pub const ESCAPE_SENTINEL: &[u8] = b"+++";

type CommandLine = String<COMMAND_CAPACITY>;

/// Network and collector endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkConfig {
    /// Network name
    pub ssid: String<SSID_CAPACITY>,
    /// Network passphrase
    pub passphrase: String<PASSPHRASE_CAPACITY>,
    /// Collector address
    pub host: String<HOST_CAPACITY>,
    /// Collector TCP port
    pub port: u16,
    /// Time allowed for `AT+CWJAP` (ms)
    pub join_timeout_ms: u64,
}

impl LinkConfig {
    /// Endpoint with credentials; fails if a field exceeds its capacity
    pub fn new(ssid: &str, passphrase: &str, host: &str, port: u16) -> TelemetryResult<Self> {
        Ok(Self {
            ssid: bounded(ssid)?,
            passphrase: bounded(passphrase)?,
            host: bounded(host)?,
            port,
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT_MS,
        })
    }

    /// Override the association timeout
    pub fn with_join_timeout_ms(mut self, ms: u64) -> Self {
        self.join_timeout_ms = ms;
        self
    }
}

fn bounded<const N: usize>(text: &str) -> TelemetryResult<String<N>> {
    String::try_from(text).map_err(|_| TelemetryError::CommandTooLong { capacity: N })
}

/// Pauses around raw-mode delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeliveryTiming {
    /// After `AT+CIPMODE=1` (ms)
    pub raw_mode_settle_ms: u32,
    /// After the `>` prompt (ms)
    pub prompt_settle_ms: u32,
    /// Quiet gap before `+++` (ms)
    pub escape_guard_ms: u32,
    /// Close the TCP session and leave raw mode after each record
    pub close_after_send: bool,
}

impl Default for DeliveryTiming {
    fn default() -> Self {
        Self {
            raw_mode_settle_ms: RAW_MODE_SETTLE_MS,
            prompt_settle_ms: PROMPT_SETTLE_MS,
            escape_guard_ms: ESCAPE_GUARD_MS,
            close_after_send: false,
        }
    }
}

impl DeliveryTiming {
    /// Enable or disable the close sequence
    pub fn with_close_after_send(mut self, close: bool) -> Self {
        self.close_after_send = close;
        self
    }
}

/// Outcome of a scripted sequence
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScriptReport {
    /// Steps that succeeded
    pub completed: u8,
    /// Steps that failed
    pub failed: u8,
    /// Reason for the first failed step
    pub first_failure: Option<TelemetryError>,
}

impl ScriptReport {
    /// True if every step succeeded
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, step: TelemetryResult<()>) {
        match step {
            Ok(()) => self.completed += 1,
            Err(e) => {
                self.failed += 1;
                self.first_failure.get_or_insert(e);
            }
        }
    }
}

/// AT-command modem driving association and delivery
pub struct ModemLink<S, C> {
    session: TransportSession<S, C>,
    link: LinkConfig,
    timing: DeliveryTiming,
}

impl<S, C> ModemLink<S, C>
where
    S: ByteStream,
    C: TimeSource + Delay,
{
    /// Modem over an existing session
    pub fn new(session: TransportSession<S, C>, link: LinkConfig, timing: DeliveryTiming) -> Self {
        Self {
            session,
            link,
            timing,
        }
    }

    /// Leave any raw-forwarding mode left over from a previous run
    ///
    /// Sends `+++`, waits, discards whatever the modem printed, waits again.
    pub fn reset(&mut self) -> TelemetryResult<()> {
        self.session.send_raw(ESCAPE_SENTINEL)?;
        self.session.clock().delay_ms(ESCAPE_SETTLE_MS);
        let _dropped = self.session.drain();
        log_debug!("modem reset, {} stale bytes dropped", _dropped);
        self.session.clock().delay_ms(RESET_SETTLE_MS);
        Ok(())
    }

    /// Probe, set station mode and join the network
    pub fn associate(&mut self) -> ScriptReport {
        let mut report = ScriptReport::default();

        let probe = self.session.command("AT", "OK");
        report.record(self.session.try_exchange(&probe));

        let mode = self.session.command("AT+CWMODE=3", "OK");
        report.record(self.session.try_exchange(&mode));

        let join = self.join_command();
        report.record(join.and_then(|line| {
            let command = Command::new(&line, "OK").with_timeout_ms(self.link.join_timeout_ms);
            self.session.try_exchange(&command)
        }));

        if report.is_clean() {
            log_info!("associated with '{}'", self.link.ssid.as_str());
        } else {
            log_warn!(
                "association incomplete: {} of 3 steps failed, first {:?}",
                report.failed,
                report.first_failure
            );
        }
        self.session.clock().delay_ms(ASSOCIATION_SETTLE_MS);
        report
    }

    /// Open a TCP session, forward `payload`, and leave raw mode
    pub fn deliver(&mut self, payload: &[u8]) -> ScriptReport {
        let mut report = ScriptReport::default();
        let open = self.open_command();
        report.record(open.and_then(|line| {
            let command = self.session.command(&line, "OK");
            self.session.try_exchange(&command)
        }));

        let raw = self.session.command("AT+CIPMODE=1", "OK");
        report.record(self.session.try_exchange(&raw));
        self.session.clock().delay_ms(self.timing.raw_mode_settle_ms);

        let send = self.session.command("AT+CIPSEND", ">");
        report.record(self.session.try_exchange(&send));
        self.session.clock().delay_ms(self.timing.prompt_settle_ms);

        report.record(self.session.send_raw(payload));
        self.session.clock().delay_ms(self.timing.escape_guard_ms);
        report.record(self.session.send_raw(ESCAPE_SENTINEL));

        if self.timing.close_after_send {
            let close = self.session.command("AT+CIPCLOSE", "OK");
            report.record(self.session.try_exchange(&close));
            let command_mode = self.session.command("AT+CIPMODE=0", "OK");
            report.record(self.session.try_exchange(&command_mode));
        }

        if !report.is_clean() {
            log_warn!(
                "delivery: {} steps failed, first {:?}",
                report.failed,
                report.first_failure
            );
        }
        report
    }

    fn join_command(&self) -> TelemetryResult<CommandLine> {
        let mut line = CommandLine::new();
        let too_long = TelemetryError::CommandTooLong {
            capacity: COMMAND_CAPACITY,
        };
        line.push_str("AT+CWJAP=\"").map_err(|_| too_long)?;
        push_escaped(&mut line, &self.link.ssid)?;
        line.push_str("\",\"").map_err(|_| too_long)?;
        push_escaped(&mut line, &self.link.passphrase)?;
        line.push('"').map_err(|_| too_long)?;
        Ok(line)
    }

    fn open_command(&self) -> TelemetryResult<CommandLine> {
        let mut line = CommandLine::new();
        write!(
            line,
            "AT+CIPSTART=\"TCP\",\"{}\",{}",
            self.link.host.as_str(),
            self.link.port
        )
        .map_err(|_| TelemetryError::CommandTooLong {
            capacity: COMMAND_CAPACITY,
        })?;
        Ok(line)
    }

    /// Endpoint in use
    pub fn link(&self) -> &LinkConfig {
        &self.link
    }

    /// Underlying transport
    pub fn session_mut(&mut self) -> &mut TransportSession<S, C> {
        &mut self.session
    }

    /// Release the transport
    pub fn into_inner(self) -> TransportSession<S, C> {
        self.session
    }
}

/// Append with `\`-escaping of the characters the AT parser treats specially
fn push_escaped(line: &mut CommandLine, text: &str) -> TelemetryResult<()> {
    for c in text.chars() {
        if matches!(c, '"' | ',' | '\\') {
            line.push('\\').map_err(|_| TelemetryError::CommandTooLong {
                capacity: COMMAND_CAPACITY,
            })?;
        }
        line.push(c).map_err(|_| TelemetryError::CommandTooLong {
            capacity: COMMAND_CAPACITY,
        })?;
    }
    Ok(())
}
