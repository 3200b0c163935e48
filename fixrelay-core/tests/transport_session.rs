//! Modem command exchanges and scripts over a mock link

mod common;

use common::{cooperative_modem, test_link};
use fixrelay_core::mock::MockSerial;
use fixrelay_core::modem::{DeliveryTiming, ModemLink};
use fixrelay_core::time::MockTimeSource;
use fixrelay_core::{
    ByteStream, Command, TelemetryError, TimeSource, TransportConfig, TransportSession,
};

/// Modem stuck printing dots, one every 100 µs
struct Chatty<'a> {
    clock: &'a MockTimeSource,
    sent: usize,
}

impl ByteStream for Chatty<'_> {
    type Error = ();

    fn read_byte(&mut self) -> nb::Result<u8, ()> {
        self.clock.advance(100);
        self.sent += 1;
        Ok(b'.')
    }

    fn write_all(&mut self, _bytes: &[u8]) -> Result<(), ()> {
        Ok(())
    }
}

#[test]
fn exchange_returns_on_first_match() {
    let mut modem = MockSerial::new();
    modem.respond_after("AT+CWMODE=3", b"AT+CWMODE=3\r\r\nOK\r\n", 5);
    let clock = MockTimeSource::new(0);
    let mut session: TransportSession<_, _> =
        TransportSession::new(modem, &clock, TransportConfig::default());

    assert!(session.exchange(&Command::new("AT+CWMODE=3", "OK")));
    // five idle polls at the default interval, nowhere near the timeout
    assert_eq!(clock.now().ticks(), 5 * 2_000);
}

#[test]
fn exchange_fails_after_deadline() {
    let mut modem = MockSerial::new();
    modem.respond_to("AT", b"busy p...\r\n");
    let clock = MockTimeSource::new(1_000);
    let config = TransportConfig::default().with_response_timeout_ms(300);
    let mut session: TransportSession<_, _> = TransportSession::new(modem, &clock, config);

    let command = session.command("AT", "OK");
    assert!(!session.exchange(&command));
    let waited = clock.now().ticks() - 1_000;
    assert!(waited >= 300_000 && waited < 305_000, "waited {} µs", waited);
}

#[test]
fn timeout_reports_time_waited() {
    let clock = MockTimeSource::new(0);
    let mut session: TransportSession<_, _> =
        TransportSession::new(MockSerial::new(), &clock, TransportConfig::default());

    let result = session.try_exchange(&Command::new("AT+CIPSEND", ">").with_timeout_ms(50));
    assert_eq!(result, Err(TelemetryError::TransportTimeout { waited_ms: 50 }));
}

#[test]
fn endless_output_still_times_out() {
    let clock = MockTimeSource::new(0);
    let modem = Chatty { clock: &clock, sent: 0 };
    let mut session: TransportSession<_, _> =
        TransportSession::new(modem, &clock, TransportConfig::default());

    match session.try_exchange(&Command::new("AT", "OK").with_timeout_ms(100)) {
        Err(TelemetryError::TransportTimeout { waited_ms }) => {
            assert!((100..=126).contains(&waited_ms), "waited {} ms", waited_ms)
        }
        other => panic!("unexpected {:?}", other),
    }

    // at most one buffer of overrun past the deadline
    let (modem, _) = session.into_inner();
    assert!(modem.sent >= 1_000, "sent {}", modem.sent);
    assert!(modem.sent <= 1_000 + 256, "sent {}", modem.sent);
}

#[test]
fn association_script() {
    let clock = MockTimeSource::new(0);
    let session = TransportSession::new(cooperative_modem(), &clock, TransportConfig::default());
    let mut link = ModemLink::new(session, test_link(), DeliveryTiming::default());

    link.reset().unwrap();
    let report = link.associate();
    assert!(report.is_clean());
    assert_eq!(report.completed, 3);

    let modem = link.into_inner().into_inner().0;
    assert_eq!(
        modem.written_lines(),
        ["+++AT", "AT+CWMODE=3", "AT+CWJAP=\"fieldnet\",\"s3cret\""]
    );
}

#[test]
fn failed_join_is_reported_and_script_finishes() {
    let mut modem = MockSerial::new();
    modem.respond_to("AT", b"OK\r\n");
    modem.respond_to("AT+CWJAP", b"+CWJAP:1\r\nFAIL\r\n");
    let clock = MockTimeSource::new(0);
    let session = TransportSession::new(modem, &clock, TransportConfig::default());
    let mut link = ModemLink::new(session, test_link(), DeliveryTiming::default());

    let report = link.associate();
    assert!(!report.is_clean());
    assert_eq!(report.failed, 1);
    assert!(matches!(
        report.first_failure,
        Some(TelemetryError::TransportTimeout { .. })
    ));
}

#[test]
fn delivery_script_with_close() {
    let clock = MockTimeSource::new(0);
    let session = TransportSession::new(cooperative_modem(), &clock, TransportConfig::default());
    let timing = DeliveryTiming::default().with_close_after_send(true);
    let mut link = ModemLink::new(session, test_link(), timing);

    let report = link.deliver(b"48.117300,-11.516667");
    assert!(report.is_clean());

    let modem = link.into_inner().into_inner().0;
    assert_eq!(
        modem.written_lines(),
        [
            "AT+CIPSTART=\"TCP\",\"192.168.4.2\",8080",
            "AT+CIPMODE=1",
            "AT+CIPSEND",
            "48.117300,-11.516667+++AT+CIPCLOSE",
            "AT+CIPMODE=0",
        ]
    );
}

#[test]
fn delivery_continues_after_refused_session() {
    let mut modem = cooperative_modem();
    modem.respond_to("AT+CIPSTART", b"ERROR\r\n");
    let clock = MockTimeSource::new(0);
    let config = TransportConfig::default().with_response_timeout_ms(20);
    let session = TransportSession::new(modem, &clock, config);
    let mut link = ModemLink::new(session, test_link(), DeliveryTiming::default());

    let report = link.deliver(b"payload");
    assert_eq!(report.failed, 1);
    assert!(link.session_mut().stream_mut().written().ends_with(b"payload+++"));
}
