//! Error Types for the Telemetry Loop
//!
//! ## Design Philosophy
//!
//! Nothing in the telemetry loop is fatal. Every anomaly either drops the
//! current cycle's output or keeps the previous state, so errors here are
//! descriptions of *what was skipped*, not reasons to stop:
//!
//! 1. **Small Size**: Variants carry at most a couple of integers or a
//!    `&'static str`, so an error can be returned from the hot path and logged
//!    without allocation.
//!
//! 2. **Copy Semantics**: Errors implement `Copy` so they can be stored on a
//!    rejected sentence and still be returned by value.
//!
//! ## Error Categories
//!
//! ### Framing
//! - `FrameTruncated`: Line exceeded the frame capacity and was cut short
//! - `MalformedFrame`: Missing `$`, missing `\r\n`, missing or repeated `*`
//! - `ChecksumMismatch`: XOR checksum disagrees with the transmitted digits
//! - `InvalidPayload`: Payload to encode contains a framing byte
//!
//! ### Decoding and Fusion
//! - `NoFixThisCycle`: Hemisphere markers absent; not a fault
//! - `AmbiguousQuadrant`: Angle unwrap matched no quadrant; prior angle kept
//! - `InsufficientSamples`: Calibration asked for zero samples
//!
//! ### I/O
//! - `SensorRead`: Register bus read failed
//! - `Serial`: Byte stream reported an error
//! - `TransportTimeout`: Expected response never arrived before the deadline
//! - `CommandTooLong`: Formatted command does not fit its buffer
//!
//! ## Handling Strategy
//!
//! ```rust
//! use fixrelay_core::TelemetryError;
//!
//! fn on_cycle_error(err: TelemetryError) {
//!     match err {
//!         TelemetryError::ChecksumMismatch { .. } | TelemetryError::MalformedFrame { .. } => {
//!             // Noisy line - resume listening
//!         }
//!         TelemetryError::TransportTimeout { .. } => {
//!             // Modem did not answer - move on to the next command
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for telemetry operations
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Telemetry errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TelemetryError {
    /// Input exceeded a fixed-capacity buffer and was truncated
    #[error("Frame truncated at {capacity} bytes")]
    FrameTruncated {
        /// Capacity of the buffer that overflowed
        capacity: usize,
    },

    /// Frame does not follow the `$...*HH\r\n` layout
    #[error("Malformed frame: {reason}")]
    MalformedFrame {
        /// Which structural check failed
        reason: &'static str,
    },

    /// Computed checksum differs from the transmitted one
    #[error("Checksum mismatch: computed {computed:02X}, frame carries {received:02X}")]
    ChecksumMismatch {
        /// XOR of the payload bytes
        computed: u8,
        /// Value of the two hex digits after `*` (0 if they are not hex)
        received: u8,
    },

    /// Payload contains a byte reserved by the framing
    #[error("Invalid payload byte 0x{byte:02X}")]
    InvalidPayload {
        /// Offending byte
        byte: u8,
    },

    /// Sentence carried no complete position this cycle
    #[error("No position fix this cycle")]
    NoFixThisCycle,

    /// No response matched before the deadline
    #[error("Timed out after {waited_ms} ms waiting for response")]
    TransportTimeout {
        /// Milliseconds spent waiting
        waited_ms: u64,
    },

    /// Quadrant unwrap matched no branch; prior angle retained
    #[error("Ambiguous quadrant on {axis} axis, prior angle retained")]
    AmbiguousQuadrant {
        /// Axis name ("pitch" or "roll")
        axis: &'static str,
    },

    /// Calibration needs at least one sample
    #[error("Insufficient samples: need {required}, have {available}")]
    InsufficientSamples {
        /// Minimum number of samples
        required: usize,
        /// Samples requested
        available: usize,
    },

    /// Register bus read failed
    #[error("Sensor read failed at register 0x{register:02X}")]
    SensorRead {
        /// Base register of the failed block read
        register: u8,
    },

    /// Serial byte stream failed
    #[error("Serial link error: {reason}")]
    Serial {
        /// Short description of the failing operation
        reason: &'static str,
    },

    /// Formatted command exceeds its buffer
    #[error("Command exceeds {capacity} bytes")]
    CommandTooLong {
        /// Capacity of the command buffer
        capacity: usize,
    },
}

impl TelemetryError {
    /// True for conditions that only mean "nothing to report this cycle"
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::NoFixThisCycle | Self::AmbiguousQuadrant { .. }
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TelemetryError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::FrameTruncated { capacity } =>
                defmt::write!(fmt, "Frame truncated at {}", capacity),
            Self::MalformedFrame { reason } =>
                defmt::write!(fmt, "Malformed frame: {}", reason),
            Self::ChecksumMismatch { computed, received } =>
                defmt::write!(fmt, "Checksum {:02X} != {:02X}", computed, received),
            Self::InvalidPayload { byte } =>
                defmt::write!(fmt, "Invalid payload byte {:02X}", byte),
            Self::NoFixThisCycle =>
                defmt::write!(fmt, "No fix"),
            Self::TransportTimeout { waited_ms } =>
                defmt::write!(fmt, "Timeout after {} ms", waited_ms),
            Self::AmbiguousQuadrant { axis } =>
                defmt::write!(fmt, "Ambiguous quadrant: {}", axis),
            Self::InsufficientSamples { required, available } =>
                defmt::write!(fmt, "Need {} samples, have {}", required, available),
            Self::SensorRead { register } =>
                defmt::write!(fmt, "Sensor read failed at {:02X}", register),
            Self::Serial { reason } =>
                defmt::write!(fmt, "Serial: {}", reason),
            Self::CommandTooLong { capacity } =>
                defmt::write!(fmt, "Command exceeds {}", capacity),
        }
    }
}
