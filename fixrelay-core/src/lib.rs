//! Core telemetry loop for fixrelay
//!
//! Reads position fixes from a GPS receiver, reads inertial sensor registers,
//! fuses them into attitude estimates and relays a CSV record to a remote
//! collector through an AT-command modem.
//!
//! Key constraints:
//! - Runs single-threaded on a microcontroller
//! - No heap allocation: every buffer is a fixed-capacity `heapless` type
//! - Every anomaly degrades to "skip this cycle" or "keep prior state"
//!
//! ```no_run
//! use fixrelay_core::frame;
//! use fixrelay_core::nmea::{decode, HemispherePolicy};
//!
//! let line = b"$GPRMC,,,4807.038,N,01131.000,W,,,,,,*60\r\n";
//! let sentence = frame::validate(line);
//! if let Some(fix) = decode(&sentence, HemispherePolicy::NorthWest) {
//!     // lat ~48.1173, lon ~-11.5167
//!     let _ = (fix.latitude, fix.longitude);
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod attitude;
pub mod buffer;
pub mod calibration;
pub mod constants;
pub mod errors;
pub mod frame;
pub mod modem;
pub mod nmea;
pub mod pipeline;
pub mod record;
pub mod sensors;
pub mod serial;
pub mod time;
pub mod traits;
pub mod transport;

#[cfg(any(test, feature = "std"))]
pub mod mock;

// Public API
pub use errors::{TelemetryError, TelemetryResult};
pub use frame::ValidatedSentence;
pub use nmea::{GeoFix, HemispherePolicy, SentenceFilter};
pub use pipeline::{CycleOutcome, PipelineConfig, PipelineMetrics, PipelineState, TelemetryPipeline};
pub use record::TelemetryRecord;
pub use traits::{ByteStream, Delay, RegisterBus, SampleSource, TimeSource};
pub use transport::{Command, TransportConfig, TransportSession};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
