//! Outgoing telemetry record
//!
//! One CSV line per valid fix:
//!
//! ```text
//! latitude,longitude,accx,accy,accz,gyrox,gyroy,gyroz,magx,magy,magz
//! 48.117300,-11.516667,0.0003,-0.0012,0.9998,0.0153,-0.0076,0.0000,4.2480,-12.1289,38.5254
//! ```
//!
//! Coordinates carry six decimals (about 0.1 m), sensor axes four. No line
//! terminator is written; the collector reads one record per connection.

use core::fmt::Write;
use core::str::FromStr;

use heapless::String;

use crate::constants::RECORD_CAPACITY;
use crate::errors::{TelemetryError, TelemetryResult};
use crate::nmea::GeoFix;
use crate::sensors::{ScaledSample, Vector3};

/// Column names, in record order
pub const CSV_HEADER: &str = "latitude,longitude,accx,accy,accz,gyrox,gyroy,gyroz,magx,magy,magz";

/// Number of fields in a record
pub const FIELD_COUNT: usize = 11;

/// Formatted record text
pub type RecordLine = String<RECORD_CAPACITY>;

/// Position and sensor values for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelemetryRecord {
    /// Position fix
    pub fix: GeoFix,
    /// Acceleration (g)
    pub accel: Vector3,
    /// Angular rate (°/s)
    pub gyro: Vector3,
    /// Magnetic field (µT)
    pub mag: Vector3,
}

impl TelemetryRecord {
    /// Record from a fix and a scaled sensor reading
    pub fn new(fix: GeoFix, sample: &ScaledSample) -> Self {
        Self {
            fix,
            accel: sample.accel,
            gyro: sample.gyro,
            mag: sample.mag,
        }
    }

    /// Render as one CSV line
    pub fn format(&self) -> TelemetryResult<RecordLine> {
        let mut line = RecordLine::new();
        self.write_to(&mut line)
            .map_err(|_| TelemetryError::FrameTruncated {
                capacity: RECORD_CAPACITY,
            })?;
        Ok(line)
    }

    fn write_to<W: Write>(&self, out: &mut W) -> core::fmt::Result {
        write!(out, "{:.6},{:.6}", self.fix.latitude, self.fix.longitude)?;
        for v in [self.accel, self.gyro, self.mag] {
            write!(out, ",{:.4},{:.4},{:.4}", v.x, v.y, v.z)?;
        }
        Ok(())
    }

    /// Parse a CSV line produced by [`format`](Self::format)
    ///
    /// Surrounding whitespace and a trailing line terminator are ignored.
    pub fn parse(line: &str) -> TelemetryResult<Self> {
        let mut fields = line.trim().split(',');
        let mut next = || fields.next().ok_or(TelemetryError::MalformedFrame {
            reason: "record has too few fields",
        });

        let latitude = number::<f64>(next()?)?;
        let longitude = number::<f64>(next()?)?;
        let mut axes = [Vector3::default(); 3];
        for v in axes.iter_mut() {
            v.x = number(next()?)?;
            v.y = number(next()?)?;
            v.z = number(next()?)?;
        }
        if fields.next().is_some() {
            return Err(TelemetryError::MalformedFrame {
                reason: "record has too many fields",
            });
        }

        let [accel, gyro, mag] = axes;
        Ok(Self {
            fix: GeoFix {
                latitude,
                longitude,
            },
            accel,
            gyro,
            mag,
        })
    }
}

impl core::fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.write_to(f)
    }
}

fn number<T: FromStr>(field: &str) -> TelemetryResult<T> {
    field.trim().parse().map_err(|_| TelemetryError::MalformedFrame {
        reason: "record field is not a number",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> TelemetryRecord {
        TelemetryRecord {
            fix: GeoFix {
                latitude: 48.1173,
                longitude: -11.516_666_7,
            },
            accel: Vector3 { x: 0.0, y: -0.5, z: 1.0 },
            gyro: Vector3 { x: 1.25, y: 0.0, z: -250.0 },
            mag: Vector3 { x: 4799.8535, y: 0.0, z: -12.5 },
        }
    }

    #[test]
    fn formats_with_fixed_precision() {
        let line = sample_record().format().unwrap();
        assert_eq!(
            line.as_str(),
            "48.117300,-11.516667,0.0000,-0.5000,1.0000,1.2500,0.0000,-250.0000,4799.8535,0.0000,-12.5000"
        );
    }

    #[test]
    fn parses_collector_input() {
        let record = TelemetryRecord::parse(
            "48.117300,-11.516667,0.0000,-0.5000,1.0000,1.2500,0.0000,-250.0000,4799.8535,0.0000,-12.5000\r\n",
        )
        .unwrap();
        assert!((record.fix.longitude + 11.516667).abs() < 1e-9);
        assert_eq!(record.gyro.z, -250.0);
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(
            TelemetryRecord::parse("1,2,3"),
            Err(TelemetryError::MalformedFrame {
                reason: "record has too few fields"
            })
        );
        assert!(TelemetryRecord::parse("1,2,3,4,5,6,7,8,9,10,11,12").is_err());
        assert!(TelemetryRecord::parse("a,2,3,4,5,6,7,8,9,10,11").is_err());
    }

    #[test]
    fn header_matches_field_count() {
        assert_eq!(CSV_HEADER.split(',').count(), FIELD_COUNT);
    }
}
