//! Property tests for sentence framing
//!
//! Payloads are drawn from printable ASCII minus the four framing bytes, up
//! to the longest payload a receive buffer can hold.

mod common;

use fixrelay_core::frame::{checksum, encode, validate, xor_checksum};
use fixrelay_core::TelemetryError;
use proptest::prelude::*;

const MAX_PAYLOAD: usize = 249;

fn payload_byte() -> impl Strategy<Value = u8> {
    (0x20u8..0x7F).prop_filter("framing byte", |b| !matches!(b, b'$' | b'*'))
}

fn payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(payload_byte(), 0..=MAX_PAYLOAD)
}

proptest! {
    #[test]
    fn encoded_payloads_validate(p in payload()) {
        let frame = encode(&p).unwrap();
        let sentence = validate(&frame);
        prop_assert!(sentence.is_valid(), "{:?}", sentence.rejection());
        prop_assert_eq!(sentence.payload(), &p[..]);
    }

    #[test]
    fn single_bit_flip_is_detected(
        p in prop::collection::vec(payload_byte(), 1..=MAX_PAYLOAD),
        index in any::<prop::sample::Index>(),
        bit in 0u8..7,
    ) {
        let mut frame = encode(&p).unwrap().to_vec();
        let at = 1 + index.index(p.len());
        frame[at] ^= 1 << bit;
        let flipped = frame[at];
        prop_assume!(!matches!(flipped, b'$' | b'*' | b'\r' | b'\n'));

        prop_assert!(!validate(&frame).is_valid());
    }

    #[test]
    fn validation_is_deterministic(bytes in prop::collection::vec(any::<u8>(), 0..300)) {
        prop_assert_eq!(validate(&bytes), validate(&bytes));
    }

    #[test]
    fn checksum_digits_are_uppercase_hex(p in payload()) {
        let digits = checksum(&p);
        let expected = format!("{:02X}", xor_checksum(&p));
        prop_assert_eq!(&digits[..], expected.as_bytes());
    }
}

#[test]
fn framing_bytes_are_refused() {
    for &byte in b"$*\r\n" {
        let payload = [b'G', b'P', byte, b'X'];
        assert_eq!(encode(&payload), Err(TelemetryError::InvalidPayload { byte }));
    }
}

#[test]
fn longest_payload_fits_a_receive_buffer() {
    let payload = vec![b'A'; MAX_PAYLOAD];
    assert_eq!(encode(&payload).unwrap().len(), MAX_PAYLOAD + 6);
    assert!(matches!(
        encode(&vec![b'A'; MAX_PAYLOAD + 1]),
        Err(TelemetryError::FrameTruncated { .. })
    ));
}

#[test]
fn reference_sentence_matches_receiver_output() {
    let frame = common::sentence("GPRMC,,,4807.038,N,01131.000,W,,,,,,");
    assert_eq!(frame, b"$GPRMC,,,4807.038,N,01131.000,W,,,,,,*60\r\n");
}
