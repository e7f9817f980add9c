//! Criterion benchmarks for the length-prefixed frame codec.
//!
//! Run with:
//! ```bash
//! cargo bench --package proxy-core --bench frame_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use proxy_core::{decode_frame, encode_frame, Handshake, MAX_FRAME_LEN};

const SIZES: [usize; 4] = [16, 1024, 16 * 1024, MAX_FRAME_LEN];

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_frame");
    for size in SIZES {
        let payload = vec![0x5Au8; size];
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, p| {
            b.iter(|| encode_frame(black_box(p)).unwrap())
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");
    for size in SIZES {
        let bytes = encode_frame(&vec![0x5Au8; size]).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| decode_frame(black_box(bytes)).unwrap())
        });
    }
    group.finish();
}

fn bench_handshake(c: &mut Criterion) {
    let hs = Handshake {
        room_id: 42,
        application_name: "benchmark-app",
        version: "1.0.0",
        password: Some("password"),
        token: Some("c2Vzc2lvbi10b2tlbi1ieXRlcw=="),
    };
    c.bench_function("handshake_encode_frames", |b| {
        b.iter(|| black_box(&hs).encode_frames().unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_handshake);
criterion_main!(benches);
