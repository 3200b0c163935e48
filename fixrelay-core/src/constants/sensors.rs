//! Sensor Register Layout and Full-Scale Ranges
//!
//! Values for an MPU-9250 class 9-axis IMU in its power-on configuration.

// ===== REGISTER MAP =====

/// First accelerometer output register (ACCEL_XOUT_H).
///
/// Source: MPU-9250 register map, register 59
pub const ACCEL_REGISTER_BASE: u8 = 0x3B;

/// First gyroscope output register (GYRO_XOUT_H).
///
/// Source: MPU-9250 register map, register 67
pub const GYRO_REGISTER_BASE: u8 = 0x43;

/// First magnetometer output register as mirrored into the external
/// sensor data block (EXT_SENS_DATA_00 region).
pub const MAG_REGISTER_BASE: u8 = 0x4A;

/// Bytes per sample block: three big-endian `i16` values.
pub const SAMPLE_BLOCK_LEN: usize = 6;

// ===== FULL-SCALE RANGES =====

/// Raw count magnitude that maps to full scale (2^15).
pub const RAW_FULL_SCALE_COUNTS: f32 = 32768.0;

/// Accelerometer full-scale range (g), AFS_SEL = 0.
pub const ACCEL_FULL_SCALE_G: f32 = 2.0;

/// Gyroscope full-scale range (°/s), FS_SEL = 0.
pub const GYRO_FULL_SCALE_DPS: f32 = 250.0;

/// Magnetometer full-scale range (µT).
///
/// Source: AK8963 datasheet, measurement range ±4912 µT, rounded to the
/// commonly used 4800 µT
pub const MAG_FULL_SCALE_UT: f32 = 4800.0;

/// Raw accelerometer counts for 1 g at ±2 g full scale.
pub const ACCEL_COUNTS_PER_G: i16 = 16384;

// ===== CALIBRATION =====

/// Default number of samples averaged per sensor during calibration.
///
/// At roughly 20 ms per block read this takes about 40 s per sensor.
pub const DEFAULT_CALIBRATION_SAMPLES: usize = 2000;
