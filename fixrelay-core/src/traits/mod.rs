//! Core Traits and Hardware Seams
//!
//! The telemetry loop never touches a peripheral directly. Everything it
//! needs from the outside world goes through one of these traits, so the
//! same loop runs on a microcontroller, on a host with a USB serial adapter,
//! or against the in-memory mocks in tests.
//!
//! ## Module Organization
//!
//! - [`serial`] - Byte streams (GPS receiver, modem)
//! - [`sensor`] - Register bus and raw sample sources
//! - [`time`] - Monotonic clock and blocking delay
//!
//! ## Usage Example
//!
//! ```rust
//! use fixrelay_core::traits::{SampleSource, TimeSource};
//! use fixrelay_core::mock::ConstantSource;
//! use fixrelay_core::time::MockTimeSource;
//!
//! let mut source = ConstantSource::new([100, 200, 300]);
//! assert_eq!(source.read_sample().unwrap(), [100, 200, 300]);
//!
//! let clock = MockTimeSource::new(0);
//! assert_eq!(clock.now().ticks(), 0);
//! ```

pub mod sensor;
pub mod serial;
pub mod time;

pub use sensor::{RegisterBus, SampleSource};
pub use serial::ByteStream;
pub use time::{Delay, TimeSource};
