//! Simulated Relay Example
//!
//! Runs the full telemetry loop against in-memory peripherals: a GPS
//! receiver replaying a short log, an IMU lying flat and a modem that
//! acknowledges everything.
//!
//! ## What You'll Learn
//!
//! - Wiring a `TelemetryPipeline` from a GPS stream, a register bus and a modem
//! - What the startup sequence sends to each peripheral
//! - How each cycle outcome maps to a received line
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example simulated_relay
//! ```

use fixrelay_core::calibration::{CalibrationMode, CalibrationOffset};
use fixrelay_core::mock::{MockRegisterBus, MockSerial};
use fixrelay_core::modem::{DeliveryTiming, LinkConfig, ModemLink};
use fixrelay_core::time::MockTimeSource;
use fixrelay_core::{
    CycleOutcome, PipelineConfig, TelemetryPipeline, TimeSource, TransportConfig,
    TransportSession,
};

const RECEIVER_LOG: &[u8] = b"$GPGSV,1,1,01,07,79,048,42*4B\r\n\
$GPRMC,235947,V,,N,,W,,,,,,*0A\r\n\
$GPRMC,,,4807.038,N,01131.000,W,,,,,,*60\r\n\
$GPRMC,,,4807.038,N,01131.000,W,,,,,,*00\r\n";

fn main() {
    println!("fixrelay Simulated Relay");
    println!("========================\n");

    let clock = MockTimeSource::new(0);

    let mut gps = MockSerial::new();
    gps.inject_rx(RECEIVER_LOG);
    gps.close_when_drained();

    // Bench offsets measured on the reference board
    let offsets = CalibrationOffset::new([1, 8, 9], [-11, -6, -15], [1, 4, 0]);
    let mut bus = MockRegisterBus::new();
    bus.set_triplet(0x3B, [1, 8, 16393]);
    bus.set_triplet(0x43, [-11, -6, -15]);
    bus.set_triplet(0x4A, [121, -36, 900]);

    let mut modem = MockSerial::new();
    modem.respond_to("AT", b"OK\r\n");
    modem.respond_to("AT+CIPSEND", b"> ");
    let session = TransportSession::new(modem, &clock, TransportConfig::default());
    let link = match LinkConfig::new("fieldnet", "s3cret", "192.168.4.2", 8080) {
        Ok(link) => link,
        Err(e) => {
            println!("Bad link settings: {}", e);
            return;
        }
    };
    let modem = ModemLink::new(session, link, DeliveryTiming::default());

    let config = PipelineConfig::default().with_calibration(CalibrationMode::Preset(offsets));
    let mut pipeline = TelemetryPipeline::new(gps, bus, modem, &clock, config);

    match pipeline.start() {
        Ok(report) => {
            println!("Startup:");
            println!("  offsets: {:?}", report.offsets);
            println!("  attitude: {:?}", report.attitude);
            println!("  association clean: {}", report.association.is_clean());
        }
        Err(e) => {
            println!("Startup failed: {}", e);
            return;
        }
    }
    println!();

    println!("Cycles:");
    loop {
        let t_ms = clock.now().ticks() / 1000;
        match pipeline.step() {
            CycleOutcome::Transmitted { record, attitude, delivery } => {
                println!("  t={:6}ms sent {}", t_ms, record);
                println!(
                    "               pitch {:.2}° roll {:.2}°, {} steps failed",
                    attitude.pitch, attitude.roll, delivery.failed
                );
            }
            CycleOutcome::LinkFault(e) => {
                println!("  t={:6}ms receiver gone: {}", t_ms, e);
                break;
            }
            other => println!("  t={:6}ms {:?}", t_ms, other),
        }
    }

    let metrics = pipeline.metrics();
    println!();
    println!("Summary: {} cycles, {} delivered, {} rejected, {} ignored, {} without fix",
        metrics.cycles, metrics.delivered, metrics.rejected, metrics.ignored, metrics.no_fix);
    println!("Modem traffic:");
    for line in pipeline.modem_mut().session_mut().stream_mut().written_lines() {
        println!("  > {}", line);
    }
}
