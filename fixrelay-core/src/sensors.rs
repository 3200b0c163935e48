//! Inertial sensor acquisition
//!
//! The IMU exposes each sensor as a block of six registers holding three
//! big-endian signed 16-bit axes. A read is one burst from the block's base
//! address:
//!
//! | Sensor        | Base   | Full scale  |
//! |---------------|--------|-------------|
//! | Accelerometer | `0x3B` | ±2 g        |
//! | Gyroscope     | `0x43` | ±250 °/s    |
//! | Magnetometer  | `0x4A` | ±4800 µT    |
//!
//! Raw counts convert to physical units as `raw / 32768 · full_scale`.

use crate::constants::sensors::{
    ACCEL_REGISTER_BASE, GYRO_REGISTER_BASE, MAG_REGISTER_BASE, SAMPLE_BLOCK_LEN,
};
use crate::constants::{
    ACCEL_FULL_SCALE_G, GYRO_FULL_SCALE_DPS, MAG_FULL_SCALE_UT, RAW_FULL_SCALE_COUNTS,
};
use crate::errors::{TelemetryError, TelemetryResult};
use crate::traits::{RegisterBus, SampleSource};

/// Raw `[x, y, z]` counts
pub type RawTriplet = [i16; 3];

/// Sensor on the IMU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorKind {
    /// Linear acceleration (g)
    Accelerometer,
    /// Angular rate (°/s)
    Gyroscope,
    /// Magnetic field (µT)
    Magnetometer,
}

impl SensorKind {
    /// All sensors in record order
    pub const ALL: [SensorKind; 3] = [Self::Accelerometer, Self::Gyroscope, Self::Magnetometer];

    /// First register of the sample block
    pub const fn register_base(self) -> u8 {
        match self {
            Self::Accelerometer => ACCEL_REGISTER_BASE,
            Self::Gyroscope => GYRO_REGISTER_BASE,
            Self::Magnetometer => MAG_REGISTER_BASE,
        }
    }

    /// Physical value of a full-scale reading
    pub const fn full_scale(self) -> f32 {
        match self {
            Self::Accelerometer => ACCEL_FULL_SCALE_G,
            Self::Gyroscope => GYRO_FULL_SCALE_DPS,
            Self::Magnetometer => MAG_FULL_SCALE_UT,
        }
    }

    /// Raw counts to physical units
    pub fn scale(self, raw: RawTriplet) -> Vector3 {
        let k = self.full_scale() / RAW_FULL_SCALE_COUNTS;
        Vector3 {
            x: raw[0] as f32 * k,
            y: raw[1] as f32 * k,
            z: raw[2] as f32 * k,
        }
    }
}

/// Physical three-axis value
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3 {
    /// X axis
    pub x: f32,
    /// Y axis
    pub y: f32,
    /// Z axis
    pub z: f32,
}

impl Vector3 {
    /// Euclidean length
    pub fn magnitude(&self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y + self.z * self.z)
    }
}

/// One raw reading of every sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImuSample {
    /// Accelerometer counts
    pub accel: RawTriplet,
    /// Gyroscope counts
    pub gyro: RawTriplet,
    /// Magnetometer counts
    pub mag: RawTriplet,
}

impl ImuSample {
    /// Counts of one sensor
    pub fn get(&self, kind: SensorKind) -> RawTriplet {
        match kind {
            SensorKind::Accelerometer => self.accel,
            SensorKind::Gyroscope => self.gyro,
            SensorKind::Magnetometer => self.mag,
        }
    }

    /// All sensors in physical units
    pub fn scaled(&self) -> ScaledSample {
        ScaledSample {
            accel: SensorKind::Accelerometer.scale(self.accel),
            gyro: SensorKind::Gyroscope.scale(self.gyro),
            mag: SensorKind::Magnetometer.scale(self.mag),
        }
    }
}

/// One reading of every sensor in physical units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScaledSample {
    /// Acceleration (g)
    pub accel: Vector3,
    /// Angular rate (°/s)
    pub gyro: Vector3,
    /// Magnetic field (µT)
    pub mag: Vector3,
}

/// Three big-endian i16 from a register block
pub fn decode_block(block: &[u8; SAMPLE_BLOCK_LEN]) -> RawTriplet {
    [
        i16::from_be_bytes([block[0], block[1]]),
        i16::from_be_bytes([block[2], block[3]]),
        i16::from_be_bytes([block[4], block[5]]),
    ]
}

/// Register-level IMU reader
pub struct Imu<B> {
    bus: B,
}

impl<B: RegisterBus> Imu<B> {
    /// Wrap a bus
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Burst-read one sensor block
    pub fn read_raw(&mut self, kind: SensorKind) -> TelemetryResult<RawTriplet> {
        let register = kind.register_base();
        let mut block = [0u8; SAMPLE_BLOCK_LEN];
        self.bus
            .read_registers(register, &mut block)
            .map_err(|_e| {
                log_warn!("register read at 0x{:02X} failed: {:?}", register, _e);
                TelemetryError::SensorRead { register }
            })?;
        Ok(decode_block(&block))
    }

    /// Read accelerometer, gyroscope and magnetometer in that order
    pub fn read_all(&mut self) -> TelemetryResult<ImuSample> {
        Ok(ImuSample {
            accel: self.read_raw(SensorKind::Accelerometer)?,
            gyro: self.read_raw(SensorKind::Gyroscope)?,
            mag: self.read_raw(SensorKind::Magnetometer)?,
        })
    }

    /// Sample source over a single sensor, for calibration
    pub fn channel(&mut self, kind: SensorKind) -> ImuChannel<'_, B> {
        ImuChannel { imu: self, kind }
    }

    /// Underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the bus
    pub fn into_inner(self) -> B {
        self.bus
    }
}

/// One sensor of an [`Imu`] viewed as a [`SampleSource`]
pub struct ImuChannel<'a, B> {
    imu: &'a mut Imu<B>,
    kind: SensorKind,
}

impl<B: RegisterBus> SampleSource for ImuChannel<'_, B> {
    type Error = TelemetryError;

    fn read_sample(&mut self) -> Result<RawTriplet, Self::Error> {
        self.imu.read_raw(self.kind)
    }
}
