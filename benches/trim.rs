//! Benchmarks for WAV trimming
//!
//! Measures decode plus copy throughput for in-memory files at several copy
//! buffer sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::{Cursor, Write};
use std::time::Duration;
use wavtrim_media::{ChunkId, InfoRecord, Trimmer, WavFile};

/// 10 seconds of 44.1 kHz 16-bit stereo.
fn cd_quality_wav() -> Vec<u8> {
    let mut wav = WavFile::create(Cursor::new(Vec::new()), 44_100, 2, 16).unwrap();
    let pcm: Vec<u8> = (0..176_400 * 10).map(|i| (i % 251) as u8).collect();
    wav.pcm_writer().unwrap().write_all(&pcm).unwrap();
    wav.push_info(InfoRecord::new(ChunkId::INAM, "bench"));
    wav.encode().unwrap();
    wav.into_inner().into_inner()
}

fn bench_trim(c: &mut Criterion) {
    let src = cd_quality_wav();
    let mut group = c.benchmark_group("trim");

    // 2s..8s of a 10s file
    group.throughput(Throughput::Bytes(176_400 * 6));
    for size in [4 * 1024usize, 32 * 1024, 256 * 1024] {
        group.bench_with_input(BenchmarkId::new("middle", size), &size, |b, &size| {
            let trimmer = Trimmer::new()
                .start(Some(Duration::from_secs(2)))
                .end(Some(Duration::from_secs(8)))
                .buffer_size(size);
            b.iter(|| {
                let mut out = Cursor::new(Vec::with_capacity(src.len()));
                trimmer.run(Cursor::new(black_box(&src)), &mut out).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let src = cd_quality_wav();

    c.bench_function("decode/with_info", |b| {
        b.iter(|| WavFile::decode(Cursor::new(black_box(&src))).unwrap().duration());
    });
}

criterion_group!(benches, bench_trim, bench_decode);
criterion_main!(benches);
