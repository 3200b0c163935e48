//! NMEA 0183 Framing and Sentence Selection
//!
//! Byte values of the `$PAYLOAD*HH\r\n` frame and the sentences the loop
//! cares about.

/// Start-of-sentence marker.
pub const SENTENCE_START: u8 = b'$';

/// Delimits the payload from the checksum digits.
pub const CHECKSUM_DELIMITER: u8 = b'*';

/// Field separator inside the payload.
pub const FIELD_SEPARATOR: u8 = b',';

/// Line terminator.
pub const LINE_TERMINATOR: &[u8; 2] = b"\r\n";

/// Bytes a frame adds around its payload: `$`, `*`, two hex digits, `\r\n`.
pub const FRAME_OVERHEAD: usize = 6;

/// Talker/type tokens that carry a position fix.
///
/// RMC (recommended minimum) and GGA (fix data) from GPS-only (`GP`) and
/// multi-constellation (`GN`) receivers.
pub const DEFAULT_POSITION_SENTENCES: &[&str] = &["GPRMC", "GPGGA", "GNRMC", "GNGGA"];

/// Receiver configuration payload sent once at startup.
///
/// MediaTek `PMTK314` output-rate sentence: the fields are GLL, RMC, VTG,
/// GGA, GSA, GSV, ... Only RMC and GGA are enabled at one per fix.
///
/// Source: MTK NMEA packet user manual, packet 314
pub const RECEIVER_CONFIG_PAYLOAD: &str = "PMTK314,0,1,0,1,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0";
