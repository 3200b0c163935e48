//! Buffer Sizes and Memory Constraints
//!
//! Every buffer in the loop is fixed-capacity and allocated inline, so these
//! numbers bound the RAM the loop uses.

// ===== SERIAL FRAMES =====

/// Capacity of a raw GPS line buffer (bytes).
///
/// NMEA 0183 limits a sentence to 82 characters; 256 leaves room for
/// proprietary sentences and line noise. One slot is always kept free, so a
/// stored frame is at most 255 bytes.
///
/// Source: NMEA 0183 sentence length limit
pub const FRAME_CAPACITY: usize = 256;

// ===== MODEM TRANSPORT =====

/// Capacity of the inbound response accumulator (bytes).
///
/// ESP8266 AT firmware answers short commands with well under 100 bytes,
/// but `AT+CWJAP` echoes status lines while associating.
pub const RESPONSE_CAPACITY: usize = 256;

/// Capacity of a formatted outgoing command line (bytes).
///
/// Fits `AT+CWJAP="<32-byte ssid>","<64-byte passphrase>"`.
pub const COMMAND_CAPACITY: usize = 112;

// ===== TELEMETRY RECORD =====

/// Capacity of one formatted telemetry record (bytes).
///
/// Two 6-decimal coordinates and nine 4-decimal axes, at most
/// 2 × 11 + 9 × 11 + 10 separators = 131 bytes.
pub const RECORD_CAPACITY: usize = 160;

// ===== CREDENTIALS =====

/// Maximum SSID length (bytes), per IEEE 802.11.
pub const SSID_CAPACITY: usize = 32;

/// Maximum WPA passphrase length (bytes).
pub const PASSPHRASE_CAPACITY: usize = 64;

/// Maximum collector host length (bytes).
pub const HOST_CAPACITY: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_command_fits() {
        // AT+CWJAP="" , "" plus quotes and comma
        let overhead = "AT+CWJAP=\"\",\"\"".len();
        assert!(overhead + SSID_CAPACITY + PASSPHRASE_CAPACITY <= COMMAND_CAPACITY);
    }
}
