//! Time Source Abstraction for Embedded Systems
//!
//! This module provides the `TimeSource` and `Delay` traits which abstract
//! time handling across hardware timers, host clocks and tests.
//!
//! ## Design Goals
//!
//! - **Testability**: Transport deadlines and byte pacing run against a mock
//!   clock, so tests never sleep
//! - **Monotonic only**: Deadlines are interval arithmetic; wall-clock time
//!   is never needed
//! - **Shared by reference**: Both traits take `&self`, so one clock can be
//!   handed to the line reader, the transport session and the pipeline
//!
//! ## Common Implementations
//!
//! - `MockTimeSource`: Controllable time for testing; delays advance it
//! - `StdClock`: `std::time::Instant` and `thread::sleep` (requires `std`)

use crate::constants::time::US_PER_MS;
use crate::time::Instant;

/// Monotonic source of time
///
/// ## Example Implementation
///
/// ```rust
/// use fixrelay_core::traits::TimeSource;
/// use fixrelay_core::time::Instant;
///
/// struct TimerPeripheral {
///     // ... 1 MHz free-running counter
/// }
///
/// impl TimeSource for TimerPeripheral {
///     fn now(&self) -> Instant {
///         Instant::from_ticks(0) // read the counter here
///     }
///
///     fn precision_us(&self) -> u32 {
///         1
///     }
/// }
/// ```
///
/// ## Platform-Specific Considerations
///
/// ### Bare Metal (no_std)
/// - Use a 64-bit timer or extend a 32-bit one on overflow
/// - Ensure interrupt-safe access if the counter is extended in an ISR
///
/// ### Linux/Unix
/// - Use `CLOCK_MONOTONIC` (what `std::time::Instant` uses)
pub trait TimeSource {
    /// Current monotonic instant (µs ticks since an arbitrary epoch)
    fn now(&self) -> Instant;

    /// Minimum measurable interval in microseconds
    fn precision_us(&self) -> u32;
}

/// Blocking delay
pub trait Delay {
    /// Block for at least `us` microseconds
    fn delay_us(&self, us: u32);

    /// Block for at least `ms` milliseconds
    fn delay_ms(&self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(US_PER_MS as u32);
        }
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn precision_us(&self) -> u32 {
        (**self).precision_us()
    }
}

impl<T: Delay + ?Sized> Delay for &T {
    fn delay_us(&self, us: u32) {
        (**self).delay_us(us)
    }

    fn delay_ms(&self, ms: u32) {
        (**self).delay_ms(ms)
    }
}
