//! Attitude Filter Parameters
//!
//! These values are design parameters of the complementary filter, not tuning
//! leftovers: they encode the gyroscope's sensitivity and the filter time
//! constant.

/// Radians to degrees (180 / π, as used by the filter).
pub const RAD_TO_DEG: f32 = 57.296;

/// Integration divisor of the filter, in LSB per °/s.
///
/// Fixed filter parameter, not derived from the configured gyro range. The
/// gyro runs at ±250 °/s (131.072 LSB per °/s, see
/// [`GYRO_FULL_SCALE_DPS`](super::sensors::GYRO_FULL_SCALE_DPS)), which only
/// scales recorded rates. Integrating with 65.5 yields twice the angle per raw
/// count that the ±250 °/s scale would.
pub const GYRO_SENSITIVITY_LSB_PER_DPS: f32 = 65.5;

/// Minimum effective update rate for gyro integration (Hz).
///
/// Below this the integration step is too coarse and the estimator falls back
/// to gravity-only angles.
pub const COMPLEMENTARY_MIN_RATE_HZ: u32 = 200;

/// Weight of the gyro-integrated angle in the blend.
pub const GYRO_WEIGHT: f32 = 0.9996;

/// Weight of the gravity-derived angle in the blend.
pub const GRAVITY_WEIGHT: f32 = 0.0004;

/// Scale applied to `gz·dt` inside the cross-axis coupling sine.
pub const YAW_COUPLING_FACTOR: f32 = 0.1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integration_divisor_is_twice_the_recording_sensitivity() {
        use crate::constants::sensors::{GYRO_FULL_SCALE_DPS, RAW_FULL_SCALE_COUNTS};

        let recording = RAW_FULL_SCALE_COUNTS / GYRO_FULL_SCALE_DPS;
        assert!((recording - 131.072).abs() < 1e-3);
        assert!((recording / GYRO_SENSITIVITY_LSB_PER_DPS - 2.0).abs() < 0.01);
    }

    #[test]
    fn blend_weights_sum_to_one() {
        assert!((GYRO_WEIGHT + GRAVITY_WEIGHT - 1.0).abs() < 1e-6);
    }
}
