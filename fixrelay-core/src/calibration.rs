//! Static bias calibration
//!
//! With the board held still and level, each sensor's mean raw output is its
//! bias. The mean is taken over `n` reads, summed in `i64` and divided with
//! truncation toward zero, then subtracted from every later read.
//!
//! A level accelerometer still reads 1 g on Z. That reading is gravity, not
//! bias, so [`CalibrationOffset::measure`] leaves it out of the Z offset and
//! corrected samples keep the gravity vector the attitude filter needs.

use crate::constants::sensors::ACCEL_COUNTS_PER_G;
use crate::errors::{TelemetryError, TelemetryResult};
use crate::sensors::{Imu, ImuSample, RawTriplet, SensorKind};
use crate::traits::{RegisterBus, SampleSource};

/// Mean of `n` raw triplets from `source`
///
/// Blocks for `n` reads. Any read failure aborts with `SensorRead`.
pub fn calibrate<S: SampleSource>(source: &mut S, n: usize) -> TelemetryResult<RawTriplet> {
    if n == 0 {
        return Err(TelemetryError::InsufficientSamples {
            required: 1,
            available: 0,
        });
    }

    let mut sum = [0i64; 3];
    for _ in 0..n {
        let sample = source.read_sample().map_err(|_e| {
            log_warn!("calibration read failed: {:?}", _e);
            TelemetryError::SensorRead { register: 0 }
        })?;
        for (acc, &v) in sum.iter_mut().zip(sample.iter()) {
            *acc += v as i64;
        }
    }

    let n = n as i64;
    Ok([
        (sum[0] / n) as i16,
        (sum[1] / n) as i16,
        (sum[2] / n) as i16,
    ])
}

/// Per-axis bias of every sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationOffset {
    /// Accelerometer bias (counts)
    pub accel: RawTriplet,
    /// Gyroscope bias (counts)
    pub gyro: RawTriplet,
    /// Magnetometer bias (counts)
    pub mag: RawTriplet,
}

impl CalibrationOffset {
    /// No correction
    pub const ZERO: Self = Self::new([0; 3], [0; 3], [0; 3]);

    /// Known offsets
    pub const fn new(accel: RawTriplet, gyro: RawTriplet, mag: RawTriplet) -> Self {
        Self { accel, gyro, mag }
    }

    /// Measure all three sensors, `n` reads each
    ///
    /// The board must be level: 1 g on accelerometer Z is kept as gravity.
    pub fn measure<B: RegisterBus>(imu: &mut Imu<B>, n: usize) -> TelemetryResult<Self> {
        let mut offset = Self::ZERO;
        for kind in SensorKind::ALL {
            let bias = calibrate(&mut imu.channel(kind), n).map_err(|e| match e {
                TelemetryError::SensorRead { .. } => TelemetryError::SensorRead {
                    register: kind.register_base(),
                },
                other => other,
            })?;
            *offset.get_mut(kind) = bias;
        }
        offset.accel[2] = offset.accel[2].saturating_sub(ACCEL_COUNTS_PER_G);
        log_info!(
            "calibrated over {} samples: accel {:?} gyro {:?} mag {:?}",
            n,
            offset.accel,
            offset.gyro,
            offset.mag
        );
        Ok(offset)
    }

    /// Bias of one sensor
    pub fn get(&self, kind: SensorKind) -> RawTriplet {
        match kind {
            SensorKind::Accelerometer => self.accel,
            SensorKind::Gyroscope => self.gyro,
            SensorKind::Magnetometer => self.mag,
        }
    }

    fn get_mut(&mut self, kind: SensorKind) -> &mut RawTriplet {
        match kind {
            SensorKind::Accelerometer => &mut self.accel,
            SensorKind::Gyroscope => &mut self.gyro,
            SensorKind::Magnetometer => &mut self.mag,
        }
    }

    /// Subtract the bias of `kind` from a raw triplet, saturating
    pub fn correct(&self, kind: SensorKind, raw: RawTriplet) -> RawTriplet {
        let bias = self.get(kind);
        [
            raw[0].saturating_sub(bias[0]),
            raw[1].saturating_sub(bias[1]),
            raw[2].saturating_sub(bias[2]),
        ]
    }

    /// Bias-corrected copy of a full IMU reading
    pub fn apply(&self, sample: &ImuSample) -> ImuSample {
        ImuSample {
            accel: self.correct(SensorKind::Accelerometer, sample.accel),
            gyro: self.correct(SensorKind::Gyroscope, sample.gyro),
            mag: self.correct(SensorKind::Magnetometer, sample.mag),
        }
    }
}

/// How the pipeline obtains its offsets at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CalibrationMode {
    /// Average this many stationary reads per sensor
    Measure {
        /// Reads per sensor
        samples: usize,
    },
    /// Use offsets determined beforehand
    Preset(CalibrationOffset),
}

impl Default for CalibrationMode {
    fn default() -> Self {
        Self::Measure {
            samples: crate::constants::sensors::DEFAULT_CALIBRATION_SAMPLES,
        }
    }
}
