//! Constants for fixrelay Core
//!
//! Every numeric value the telemetry loop depends on lives here, grouped by
//! domain, with the unit in the name.
//!
//! ## Organization
//!
//! - **Buffers**: Fixed capacities for frames, responses, commands and records
//! - **NMEA**: Framing bytes, sentence allow-list, receiver configuration
//! - **Sensors**: Register map bases and full-scale ranges
//! - **Fusion**: Attitude filter parameters
//! - **Time**: Link rates, timeouts and settle delays

/// Buffer sizes for frames, transport responses and records.
pub mod buffers;

/// NMEA framing bytes and sentence selection.
pub mod nmea;

/// Sensor register layout and full-scale ranges.
pub mod sensors;

/// Complementary filter parameters.
pub mod fusion;

/// Link timing, timeouts and delays.
pub mod time;

// Re-export commonly used constants for convenience
pub use buffers::{
    COMMAND_CAPACITY, FRAME_CAPACITY, RECORD_CAPACITY, RESPONSE_CAPACITY,
};

pub use nmea::{DEFAULT_POSITION_SENTENCES, RECEIVER_CONFIG_PAYLOAD};

pub use sensors::{
    ACCEL_FULL_SCALE_G, GYRO_FULL_SCALE_DPS, MAG_FULL_SCALE_UT, RAW_FULL_SCALE_COUNTS,
};

pub use fusion::{COMPLEMENTARY_MIN_RATE_HZ, RAD_TO_DEG};

pub use time::{DEFAULT_GPS_BAUD, DEFAULT_RESPONSE_TIMEOUT_MS, US_PER_SECOND};
