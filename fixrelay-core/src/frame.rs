//! Checksummed sentence framing
//!
//! Wire format shared by incoming GPS sentences and outgoing receiver
//! configuration sentences:
//!
//! ```text
//! $ P A Y L O A D * H H \r \n
//! ^               ^ ^^^ ^^^^^
//! start           | |   terminator
//!                 | two uppercase hex digits: XOR of PAYLOAD bytes
//!                 checksum delimiter
//! ```
//!
//! Validation never aborts. A frame that fails any check comes back as a
//! [`ValidatedSentence`] marked invalid, carrying the reason for logging.

use core::ops::Range;

use heapless::Vec;

use crate::constants::nmea::{
    CHECKSUM_DELIMITER, FIELD_SEPARATOR, FRAME_OVERHEAD, LINE_TERMINATOR, SENTENCE_START,
};
use crate::constants::FRAME_CAPACITY;
use crate::errors::{TelemetryError, TelemetryResult};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encoded sentence, ready to write to the link
pub type EncodedFrame = Vec<u8, FRAME_CAPACITY>;

/// XOR of all payload bytes
pub fn xor_checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Checksum rendered as two uppercase hex digits, high nibble first
pub fn checksum(payload: &[u8]) -> [u8; 2] {
    let sum = xor_checksum(payload);
    [
        HEX_DIGITS[(sum >> 4) as usize],
        HEX_DIGITS[(sum & 0x0F) as usize],
    ]
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

/// A received frame with its validation verdict
///
/// Borrows the frame; validating the same bytes twice yields equal values.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSentence<'a> {
    frame: &'a [u8],
    payload: Range<usize>,
    rejection: Option<TelemetryError>,
}

impl<'a> ValidatedSentence<'a> {
    fn rejected(frame: &'a [u8], payload: Range<usize>, reason: TelemetryError) -> Self {
        Self {
            frame,
            payload,
            rejection: Some(reason),
        }
    }

    /// True if every framing and checksum check passed
    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }

    /// Why the frame was rejected, if it was
    pub fn rejection(&self) -> Option<TelemetryError> {
        self.rejection
    }

    /// The frame as received
    pub fn frame(&self) -> &'a [u8] {
        self.frame
    }

    /// Bytes between `$` and `*`
    ///
    /// Empty when the frame was too malformed to locate them.
    pub fn payload(&self) -> &'a [u8] {
        &self.frame[self.payload.clone()]
    }

    /// Comma-separated payload fields, borrowed from the frame
    pub fn fields(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        let payload = self.payload();
        payload
            .split(|&b| b == FIELD_SEPARATOR)
            .take(if payload.is_empty() { 0 } else { usize::MAX })
    }

    /// Talker and sentence type, e.g. `GPRMC`
    pub fn sentence_type(&self) -> Option<&'a str> {
        let first = self.fields().next()?;
        core::str::from_utf8(first).ok().filter(|s| !s.is_empty())
    }
}

/// Check a received frame
///
/// Invalid when the frame does not start with `$`, does not end with
/// `\r\n`, has zero or several `*`, the checksum field is not exactly two
/// characters, or the checksum disagrees with the payload.
pub fn validate(frame: &[u8]) -> ValidatedSentence<'_> {
    if frame.first() != Some(&SENTENCE_START) {
        return ValidatedSentence::rejected(
            frame,
            0..0,
            TelemetryError::MalformedFrame {
                reason: "missing start delimiter",
            },
        );
    }
    if frame.len() < FRAME_OVERHEAD || !frame.ends_with(LINE_TERMINATOR) {
        return ValidatedSentence::rejected(
            frame,
            0..0,
            TelemetryError::MalformedFrame {
                reason: "missing line terminator",
            },
        );
    }

    let body = &frame[1..frame.len() - LINE_TERMINATOR.len()];
    let mut stars = body
        .iter()
        .enumerate()
        .filter(|(_, &b)| b == CHECKSUM_DELIMITER)
        .map(|(i, _)| i + 1);

    let star = match (stars.next(), stars.next()) {
        (Some(pos), None) => pos,
        (None, _) => {
            return ValidatedSentence::rejected(
                frame,
                0..0,
                TelemetryError::MalformedFrame {
                    reason: "missing checksum delimiter",
                },
            )
        }
        (Some(_), Some(_)) => {
            return ValidatedSentence::rejected(
                frame,
                0..0,
                TelemetryError::MalformedFrame {
                    reason: "repeated checksum delimiter",
                },
            )
        }
    };

    let payload = 1..star;
    let digits = &frame[star + 1..frame.len() - LINE_TERMINATOR.len()];
    if digits.len() != 2 {
        return ValidatedSentence::rejected(
            frame,
            payload,
            TelemetryError::MalformedFrame {
                reason: "checksum field is not two digits",
            },
        );
    }

    let computed = xor_checksum(&frame[payload.clone()]);
    let received = match (hex_value(digits[0]), hex_value(digits[1])) {
        (Some(hi), Some(lo)) => Some((hi << 4) | lo),
        _ => None,
    };

    match received {
        Some(value) if value == computed => ValidatedSentence {
            frame,
            payload,
            rejection: None,
        },
        other => ValidatedSentence::rejected(
            frame,
            payload,
            TelemetryError::ChecksumMismatch {
                computed,
                received: other.unwrap_or(0),
            },
        ),
    }
}

/// Build `$` + payload + `*` + checksum + `\r\n`
///
/// Fails with `InvalidPayload` if the payload contains `$`, `*`, `\r` or
/// `\n`, and with `FrameTruncated` if the sentence would not fit a received
/// frame buffer.
pub fn encode(payload: &[u8]) -> TelemetryResult<EncodedFrame> {
    if let Some(&byte) = payload
        .iter()
        .find(|&&b| matches!(b, b'$' | b'*' | b'\r' | b'\n'))
    {
        return Err(TelemetryError::InvalidPayload { byte });
    }

    let capacity = FRAME_CAPACITY - 1;
    if payload.len() + FRAME_OVERHEAD > capacity {
        return Err(TelemetryError::FrameTruncated { capacity });
    }

    let mut out = EncodedFrame::new();
    let truncated = TelemetryError::FrameTruncated { capacity };
    out.push(SENTENCE_START).map_err(|_| truncated)?;
    out.extend_from_slice(payload).map_err(|_| truncated)?;
    out.push(CHECKSUM_DELIMITER).map_err(|_| truncated)?;
    out.extend_from_slice(&checksum(payload)).map_err(|_| truncated)?;
    out.extend_from_slice(LINE_TERMINATOR).map_err(|_| truncated)?;
    Ok(out)
}
