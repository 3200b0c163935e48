//! Shared fixtures for integration tests
//!
//! This module provides:
//! - Sentence builders that frame arbitrary payloads with a correct checksum
//! - A scripted modem that acknowledges every command
//! - Register buses preloaded with level-board readings
//! - `assert_within_tolerance!` for float comparisons

#![allow(dead_code)]

use fixrelay_core::calibration::{CalibrationMode, CalibrationOffset};
use fixrelay_core::frame::encode;
use fixrelay_core::mock::{MockRegisterBus, MockSerial};
use fixrelay_core::modem::{DeliveryTiming, LinkConfig, ModemLink};
use fixrelay_core::sensors::{RawTriplet, SensorKind};
use fixrelay_core::time::MockTimeSource;
use fixrelay_core::{PipelineConfig, TelemetryPipeline, TransportConfig, TransportSession};

/// Pipeline wired to mocks, sharing one mock clock
pub type MockPipeline<'a> =
    TelemetryPipeline<MockSerial, MockRegisterBus, MockSerial, &'a MockTimeSource>;

/// Assert two floats differ by at most `tol`
#[macro_export]
macro_rules! assert_within_tolerance {
    ($actual:expr, $expected:expr, $tol:expr) => {{
        let (actual, expected, tol) = ($actual as f64, $expected as f64, $tol as f64);
        assert!(
            (actual - expected).abs() <= tol,
            "expected {} within {} of {}, got {}",
            stringify!($actual),
            tol,
            expected,
            actual
        );
    }};
}

/// Frame `payload` as a complete sentence
pub fn sentence(payload: &str) -> Vec<u8> {
    encode(payload.as_bytes())
        .expect("payload fits a frame")
        .to_vec()
}

/// RMC sentence carrying only a position
pub fn rmc(lat: &str, ns: char, lon: &str, ew: char) -> Vec<u8> {
    sentence(&format!("GPRMC,,,{},{},{},{},,,,,,", lat, ns, lon, ew))
}

/// GGA sentence carrying only a position
pub fn gga(lat: &str, ns: char, lon: &str, ew: char) -> Vec<u8> {
    sentence(&format!("GPGGA,123519,{},{},{},{},1,08,0.9,545.4,M,46.9,M,,", lat, ns, lon, ew))
}

/// Modem that answers `OK` to every command and `>` to the send prompt
pub fn cooperative_modem() -> MockSerial {
    let mut modem = MockSerial::new();
    modem.respond_to("AT", b"\r\nOK\r\n");
    modem.respond_to("AT+CIPSEND", b"\r\nOK\r\n> ");
    modem
}

/// Register bus for a board lying flat and still
pub fn level_bus() -> MockRegisterBus {
    let mut bus = MockRegisterBus::new();
    bus.set_triplet(SensorKind::Accelerometer.register_base(), [0, 0, 16384]);
    bus.set_triplet(SensorKind::Gyroscope.register_base(), [0, 0, 0]);
    bus.set_triplet(SensorKind::Magnetometer.register_base(), [120, -40, 900]);
    bus
}

/// Register bus with fixed readings per sensor
pub fn bus_with(accel: RawTriplet, gyro: RawTriplet, mag: RawTriplet) -> MockRegisterBus {
    let mut bus = MockRegisterBus::new();
    bus.set_triplet(SensorKind::Accelerometer.register_base(), accel);
    bus.set_triplet(SensorKind::Gyroscope.register_base(), gyro);
    bus.set_triplet(SensorKind::Magnetometer.register_base(), mag);
    bus
}

/// Test network credentials
pub fn test_link() -> LinkConfig {
    LinkConfig::new("fieldnet", "s3cret", "192.168.4.2", 8080).expect("short credentials")
}

/// Pipeline over mocks with zero offsets and no record pacing
pub fn mock_pipeline<'a>(
    gps: MockSerial,
    bus: MockRegisterBus,
    modem: MockSerial,
    clock: &'a MockTimeSource,
) -> MockPipeline<'a> {
    let config = PipelineConfig::default()
        .with_calibration(CalibrationMode::Preset(CalibrationOffset::ZERO))
        .with_record_interval_ms(0);
    mock_pipeline_with(gps, bus, modem, clock, config)
}

/// Pipeline over mocks with an explicit configuration
pub fn mock_pipeline_with<'a>(
    gps: MockSerial,
    bus: MockRegisterBus,
    modem: MockSerial,
    clock: &'a MockTimeSource,
    config: PipelineConfig,
) -> MockPipeline<'a> {
    let session = TransportSession::new(modem, clock, TransportConfig::default());
    let modem = ModemLink::new(session, test_link(), DeliveryTiming::default());
    TelemetryPipeline::new(gps, bus, modem, clock, config)
}
