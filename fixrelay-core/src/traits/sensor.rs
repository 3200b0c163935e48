//! Sensor Bus and Sample Source Traits
//!
//! [`RegisterBus`] is the synchronous bus (SPI or I2C) the IMU sits on. The
//! loop only ever performs burst reads starting at a base register; chip
//! select, read flags and clocking belong to the implementation.
//!
//! [`SampleSource`] is anything that yields raw signed 16-bit triplets. The
//! calibrator consumes it, so calibration can be driven from the real bus,
//! from a recorded sequence, or from a constant in tests.

/// Synchronous register bus
///
/// ## Implementation Requirements
///
/// - `read_registers` reads `buf.len()` consecutive registers starting at
///   `register`, relying on the device's address auto-increment
/// - The implementation sets any read flag (e.g. bit 7 on SPI) itself
/// - Only one owner per bus; the loop never shares it
pub trait RegisterBus {
    /// Bus error type
    type Error: core::fmt::Debug;

    /// Burst-read consecutive registers
    fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    type Error = B::Error;

    fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read_registers(register, buf)
    }
}

/// Source of raw `[x, y, z]` sensor counts
pub trait SampleSource {
    /// Read failure type
    type Error: core::fmt::Debug;

    /// Read one raw triplet
    fn read_sample(&mut self) -> Result<[i16; 3], Self::Error>;
}

impl<S: SampleSource + ?Sized> SampleSource for &mut S {
    type Error = S::Error;

    fn read_sample(&mut self) -> Result<[i16; 3], Self::Error> {
        (**self).read_sample()
    }
}
