//! Time management for the telemetry loop
//!
//! All timing is monotonic and microsecond-resolution:
//! - Byte pacing on the GPS link (one character time per byte)
//! - Response deadlines on the modem link
//! - Elapsed time between attitude updates
//!
//! Instants and durations are `fugit` types over a 1 MHz `u64` tick, so
//! arithmetic between them is checked at compile time for matching units.

use core::cell::Cell;

use crate::constants::time::{DATA_BITS, START_BITS, STOP_BITS, US_PER_MS, US_PER_SECOND};

pub use crate::traits::time::{Delay, TimeSource};

/// Monotonic instant, 1 µs ticks
pub type Instant = fugit::TimerInstantU64<1_000_000>;

/// Duration, 1 µs ticks
pub type Duration = fugit::MicrosDurationU64;

/// Time of one UART character at `baud` (µs)
///
/// A character is start + data + stop bits. At 9600 baud 8N1 this is
/// 10 × 1 000 000 / 9600 = 1041 µs.
pub const fn byte_period_us(baud: u32) -> u32 {
    if baud == 0 {
        return 0;
    }
    let bits = (START_BITS + DATA_BITS + STOP_BITS) as u64;
    (bits * US_PER_SECOND / baud as u64) as u32
}

/// Point in time after which a wait has failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: Instant,
    expires: Instant,
}

impl Deadline {
    /// Deadline `timeout` after the clock's current instant
    pub fn after<T: TimeSource + ?Sized>(clock: &T, timeout: Duration) -> Self {
        let start = clock.now();
        Self {
            start,
            expires: start + timeout,
        }
    }

    /// True once the clock has reached the expiry instant
    pub fn has_expired<T: TimeSource + ?Sized>(&self, clock: &T) -> bool {
        clock.now() >= self.expires
    }

    /// Time spent since the deadline was set
    pub fn elapsed<T: TimeSource + ?Sized>(&self, clock: &T) -> Duration {
        clock
            .now()
            .checked_duration_since(self.start)
            .unwrap_or(Duration::from_ticks(0))
    }
}

/// Controllable clock for tests and simulation
///
/// Time only moves when told to: through [`advance`](Self::advance), or when
/// anything calls [`Delay::delay_us`] on it. This makes every blocking wait
/// in the loop deterministic and instant.
///
/// ```rust
/// use fixrelay_core::time::MockTimeSource;
/// use fixrelay_core::traits::{Delay, TimeSource};
///
/// let clock = MockTimeSource::new(1_000);
/// clock.delay_ms(2);
/// assert_eq!(clock.now().ticks(), 3_000);
/// ```
#[derive(Debug, Default)]
pub struct MockTimeSource {
    ticks: Cell<u64>,
}

impl MockTimeSource {
    /// Clock starting at `start_us`
    pub const fn new(start_us: u64) -> Self {
        Self {
            ticks: Cell::new(start_us),
        }
    }

    /// Move time forward
    pub fn advance(&self, us: u64) {
        self.ticks.set(self.ticks.get().saturating_add(us));
    }

    /// Jump to an absolute tick
    pub fn set(&self, us: u64) {
        self.ticks.set(us);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Instant {
        Instant::from_ticks(self.ticks.get())
    }

    fn precision_us(&self) -> u32 {
        1
    }
}

impl Delay for MockTimeSource {
    fn delay_us(&self, us: u32) {
        self.advance(us as u64);
    }

    fn delay_ms(&self, ms: u32) {
        self.advance(ms as u64 * US_PER_MS);
    }
}

/// Host clock (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    epoch: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Clock whose epoch is the moment of construction
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for StdClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(self.epoch.elapsed().as_micros() as u64)
    }

    fn precision_us(&self) -> u32 {
        1
    }
}

#[cfg(feature = "std")]
impl Delay for StdClock {
    fn delay_us(&self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }

    fn delay_ms(&self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }
}
