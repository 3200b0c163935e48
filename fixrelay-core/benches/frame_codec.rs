//! Benchmark sentence framing and decoding.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fixrelay_core::frame::{encode, validate};
use fixrelay_core::nmea::{decode, HemispherePolicy};

const RMC: &[u8] = b"$GPRMC,123519,A,4807.038,N,01131.000,W,022.4,084.4,230394,003.1,W*78\r\n";
const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,W,1,08,0.9,545.4,M,46.9,M,,*55\r\n";

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    for (name, frame) in [("rmc", RMC), ("gga", GGA)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), frame, |b, frame| {
            b.iter(|| validate(black_box(frame)).is_valid())
        });
    }
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for len in [16usize, 64, 249] {
        let payload = vec![b'A'; len];
        group.bench_with_input(BenchmarkId::from_parameter(len), &payload, |b, payload| {
            b.iter(|| encode(black_box(payload)))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let sentence = validate(RMC);
    c.bench_function("decode_rmc", |b| {
        b.iter(|| decode(black_box(&sentence), HemispherePolicy::NorthWest))
    });
}

criterion_group!(benches, bench_validate, bench_encode, bench_decode);
criterion_main!(benches);
