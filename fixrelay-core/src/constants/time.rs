//! Time-Related Constants
//!
//! Serial link rates, response timeouts and the settle delays the modem needs
//! between delivery steps.

// ===== TIME UNIT CONVERSIONS =====

/// Microseconds per millisecond.
pub const US_PER_MS: u64 = 1000;

/// Microseconds per second.
pub const US_PER_SECOND: u64 = 1_000_000;

// ===== SERIAL LINKS =====

/// GPS receiver default baud rate.
///
/// Source: MTK3339 / NEO-6M factory default
pub const DEFAULT_GPS_BAUD: u32 = 9600;

/// Modem default baud rate.
pub const DEFAULT_MODEM_BAUD: u32 = 115_200;

/// Start bits per UART character.
pub const START_BITS: u32 = 1;

/// Data bits per UART character.
pub const DATA_BITS: u32 = 8;

/// Stop bits per UART character.
pub const STOP_BITS: u32 = 1;

// ===== TRANSPORT =====

/// Time allowed for a modem response to contain the expected text (ms).
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 2500;

/// Idle wait between polls when no response byte is available (µs).
pub const DEFAULT_POLL_INTERVAL_US: u32 = 2000;

/// Time allowed for `AT+CWJAP` association (ms).
///
/// Joining a WPA2 network routinely takes several seconds.
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 10_000;

// ===== DELIVERY SETTLE DELAYS =====

/// Pause after switching to raw-forwarding mode (ms).
pub const RAW_MODE_SETTLE_MS: u32 = 10;

/// Pause after the send prompt before writing the payload (ms).
pub const PROMPT_SETTLE_MS: u32 = 20;

/// Pause after the payload before the escape sentinel (ms).
///
/// The modem only recognises `+++` when it is preceded by a quiet gap.
pub const ESCAPE_GUARD_MS: u32 = 50;

/// Pause after `+++` at startup before draining the modem (ms).
pub const ESCAPE_SETTLE_MS: u32 = 10;

/// Pause after draining the modem at startup (ms).
pub const RESET_SETTLE_MS: u32 = 20;

/// Pause after association before the first record (ms).
///
/// The modem acquires an address via DHCP after `WIFI CONNECTED`.
pub const ASSOCIATION_SETTLE_MS: u32 = 2000;

/// Pause between records (ms).
pub const DEFAULT_RECORD_INTERVAL_MS: u32 = 1000;
