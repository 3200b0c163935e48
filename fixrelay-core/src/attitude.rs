//! Complementary-filter attitude estimation
//!
//! ## Overview
//!
//! Pitch and roll come from two sources with opposite failure modes:
//!
//! - **Gravity**: the direction of the accelerometer vector gives absolute
//!   angles, but every vibration shows up in them
//! - **Gyroscope**: integrating angular rate is smooth, but drifts without
//!   bound
//!
//! The estimator integrates the gyroscope and pulls the result toward the
//! gravity angles with a small weight every step:
//!
//! ```text
//! angle = 0.9996 · (angle + rate · dt) + 0.0004 · gravity_angle
//! ```
//!
//! Integration is only meaningful when updates arrive quickly. Below
//! 200 Hz the estimator falls back to gravity alone.
//!
//! ### Units
//!
//! Inputs are bias-corrected raw counts. The accelerometer is only used for
//! its direction, so its scale cancels out. Gyroscope counts are turned into
//! degrees by the `1 / (rate_hz · 65.5)` step factor, 65.5 being the
//! sensitivity in LSB per °/s.
//!
//! ## Full-range angles
//!
//! `asin` only covers ±90°. The signs of the accelerometer components tell
//! which half of the circle the board is in, which unfolds each angle to
//! 0..360°. When a governing component is exactly zero no quadrant applies
//! and the previous full-range value is kept.

use crate::constants::fusion::{
    GRAVITY_WEIGHT, GYRO_SENSITIVITY_LSB_PER_DPS, GYRO_WEIGHT, YAW_COUPLING_FACTOR,
};
use crate::constants::{COMPLEMENTARY_MIN_RATE_HZ, RAD_TO_DEG, US_PER_SECOND};
use crate::errors::{TelemetryError, TelemetryResult};
use crate::sensors::RawTriplet;
use crate::time::Instant;

/// Pitch and roll in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttitudeState {
    /// Rotation about the X axis (°)
    pub pitch: f32,
    /// Rotation about the Y axis (°)
    pub roll: f32,
}

/// Angles from the gravity direction alone
///
/// `None` for a zero-length vector.
pub fn gravity_angles(accel: RawTriplet) -> Option<AttitudeState> {
    let [ax, ay, az] = accel.map(|v| v as f32);
    let magnitude = libm::sqrtf(ax * ax + ay * ay + az * az);
    if magnitude == 0.0 {
        return None;
    }
    Some(AttitudeState {
        pitch: libm::asinf(ay / magnitude) * RAD_TO_DEG,
        roll: -libm::asinf(ax / magnitude) * RAD_TO_DEG,
    })
}

/// How the last update was computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionMode {
    /// Gravity only (first update, or rate below 200 Hz)
    Gravity,
    /// Gyro integration blended with gravity
    Complementary,
    /// Nothing changed (zero elapsed time or zero accelerometer vector)
    Held,
}

/// Stateful pitch/roll estimator
#[derive(Debug, Clone, Default)]
pub struct AttitudeEstimator {
    state: AttitudeState,
    full_range: FullRangeAttitude,
    last_update: Option<Instant>,
}

impl AttitudeEstimator {
    /// Estimator at zero attitude with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Current ±90° angles
    pub fn state(&self) -> AttitudeState {
        self.state
    }

    /// Current 0..360° angles
    pub fn full_range(&self) -> FullRangeAttitude {
        self.full_range
    }

    /// Reset angles from gravity and restart the rate clock at `now`
    ///
    /// A zero vector keeps the prior angles.
    pub fn seed(&mut self, accel: RawTriplet, now: Instant) {
        if let Some(angles) = gravity_angles(accel) {
            self.state = angles;
        }
        self.last_update = Some(now);
    }

    /// Fuse one accelerometer/gyroscope reading taken at `now`
    pub fn update(&mut self, accel: RawTriplet, gyro: RawTriplet, now: Instant) -> FusionMode {
        let Some(gravity) = gravity_angles(accel) else {
            self.last_update = Some(now);
            return FusionMode::Held;
        };

        let elapsed_us = match self.last_update {
            None => {
                self.state = gravity;
                self.last_update = Some(now);
                return FusionMode::Gravity;
            }
            Some(last) => now
                .checked_duration_since(last)
                .map_or(0, |d| d.ticks()),
        };
        if elapsed_us == 0 {
            return FusionMode::Held;
        }
        self.last_update = Some(now);

        let rate_hz = US_PER_SECOND / elapsed_us;
        if rate_hz < COMPLEMENTARY_MIN_RATE_HZ as u64 {
            self.state = gravity;
            return FusionMode::Gravity;
        }

        let dt = 1.0 / (rate_hz as f32 * GYRO_SENSITIVITY_LSB_PER_DPS);
        let [gx, gy, gz] = gyro.map(|v| v as f32);
        let mut pitch = self.state.pitch + gx * dt;
        let mut roll = self.state.roll + gy * dt;

        let coupling = libm::sinf(gz * dt * YAW_COUPLING_FACTOR);
        pitch += roll * coupling;
        roll -= pitch * coupling;

        self.state = AttitudeState {
            pitch: pitch * GYRO_WEIGHT + gravity.pitch * GRAVITY_WEIGHT,
            roll: roll * GYRO_WEIGHT + gravity.roll * GRAVITY_WEIGHT,
        };
        FusionMode::Complementary
    }

    /// Unfold the current angles to 0..360° using `accel` signs
    ///
    /// See [`FullRangeAttitude::unwrap`].
    pub fn unwrap_quadrants(&mut self, accel: RawTriplet) -> TelemetryResult<FullRangeAttitude> {
        self.full_range.unwrap(self.state, accel)?;
        Ok(self.full_range)
    }
}

/// Pitch and roll unfolded to 0..360°
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FullRangeAttitude {
    /// Pitch (°)
    pub pitch: f32,
    /// Roll (°)
    pub roll: f32,
}

impl FullRangeAttitude {
    /// Update from ±90° angles and the accelerometer signs
    ///
    /// Pitch follows the signs of (ay, az), roll the signs of (ax, az). An
    /// axis whose governing components include a zero keeps its previous
    /// value; the other axis is still updated. Reports `AmbiguousQuadrant`
    /// for the first axis that was held.
    pub fn unwrap(&mut self, angles: AttitudeState, accel: RawTriplet) -> TelemetryResult<()> {
        let [ax, ay, az] = accel;
        let pitch = unfold(angles.pitch, ay, az, false);
        let roll = unfold(angles.roll, ax, az, true);

        if let Some(p) = pitch {
            self.pitch = p;
        }
        if let Some(r) = roll {
            self.roll = r;
        }

        match (pitch, roll) {
            (None, _) => Err(TelemetryError::AmbiguousQuadrant { axis: "pitch" }),
            (_, None) => Err(TelemetryError::AmbiguousQuadrant { axis: "roll" }),
            _ => Ok(()),
        }
    }
}

/// Quadrant rule for one axis
///
/// `inverted` flips the sign of the lateral component: roll is measured
/// against -ax, so its "upright" quadrant is (ax < 0, az > 0).
fn unfold(angle: f32, lateral: i16, vertical: i16, inverted: bool) -> Option<f32> {
    let lateral = if inverted { -(lateral as i32) } else { lateral as i32 };
    match (lateral.signum(), vertical.signum()) {
        (1, 1) => Some(angle),
        (1, -1) | (-1, -1) => Some(180.0 - angle),
        (-1, 1) => Some(360.0 + angle),
        _ => None,
    }
}
