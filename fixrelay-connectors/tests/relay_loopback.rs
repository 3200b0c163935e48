//! GPS sentences over TCP in, records through the collector out

use std::fs;
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use fixrelay_connectors::collector::Collector;
use fixrelay_connectors::IoStream;
use fixrelay_core::calibration::{CalibrationMode, CalibrationOffset};
use fixrelay_core::mock::{MockRegisterBus, MockSerial};
use fixrelay_core::modem::{DeliveryTiming, LinkConfig, ModemLink};
use fixrelay_core::record::CSV_HEADER;
use fixrelay_core::time::StdClock;
use fixrelay_core::{
    CycleOutcome, PipelineConfig, TelemetryError, TelemetryPipeline, TransportConfig,
    TransportSession,
};

const SENTENCES: &[u8] = b"$GPGSV,1,1,01,07,79,048,42*4B\r\n\
$GPRMC,,,4807.038,N,01131.000,W,,,,,,*60\r\n";

/// Serve `data` to the first client, then hang up
fn replay_receiver(data: &'static [u8]) -> (std::net::SocketAddr, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(data).unwrap();
    });
    (addr, handle)
}

#[test]
fn fix_reaches_the_collector() {
    let (gps_addr, receiver) = replay_receiver(SENTENCES);
    let gps = TcpStream::connect(gps_addr).unwrap();
    gps.set_read_timeout(Some(Duration::from_millis(1))).unwrap();

    let clock = StdClock::new();
    let mut modem = MockSerial::new();
    modem.respond_to("AT", b"OK\r\n");
    modem.respond_to("AT+CIPSEND", b"> ");
    let session = TransportSession::new(modem, clock, TransportConfig::default());
    let link = LinkConfig::new("fieldnet", "s3cret", "127.0.0.1", 8080).unwrap();
    let modem = ModemLink::new(session, link, DeliveryTiming::default());

    let mut bus = MockRegisterBus::new();
    bus.set_triplet(0x3B, [0, 0, 16384]);
    let config = PipelineConfig::default()
        .with_calibration(CalibrationMode::Preset(CalibrationOffset::ZERO))
        .with_record_interval_ms(0);
    let mut pipeline = TelemetryPipeline::new(IoStream::new(gps), bus, modem, clock, config);

    let mut payloads = Vec::new();
    loop {
        match pipeline.step() {
            CycleOutcome::Transmitted { record, .. } => {
                payloads.push(record.format().unwrap().to_string())
            }
            CycleOutcome::LinkFault(e) => {
                assert!(matches!(e, TelemetryError::Serial { .. }));
                break;
            }
            _ => {}
        }
    }
    receiver.join().unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(pipeline.metrics().ignored, 1);

    // Forward what the modem would have sent
    let dir = tempfile::tempdir().unwrap();
    let mut collector = Collector::bind("127.0.0.1:0", dir.path().join("fixes.csv")).unwrap();
    let collector_addr = collector.local_addr().unwrap();
    let payload = payloads[0].clone();
    let sender = thread::spawn(move || {
        let mut stream = TcpStream::connect(collector_addr).unwrap();
        stream.write_all(payload.as_bytes()).unwrap();
    });
    let stored = collector.accept_one().unwrap().unwrap();
    sender.join().unwrap();

    assert!((stored.fix.latitude - 48.1173).abs() < 1e-3);
    let csv = fs::read_to_string(collector.output()).unwrap();
    assert_eq!(csv, format!("{}\n{}\n", CSV_HEADER, payloads[0]));
}
