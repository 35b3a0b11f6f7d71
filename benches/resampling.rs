//! Benchmarks for the recording pipeline
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use opensignals_relay::recording::{parse_reader, resample, GapPolicy, Normalizer};
use opensignals_relay::{RecordingMetadata, SampleSeries};
use std::io::Cursor;
use std::path::Path;

fn series(rows: usize, width: usize) -> SampleSeries {
    let mut series = SampleSeries::new(width);
    for i in 0..rows {
        series.push((0..width).map(|c| ((i * 31 + c * 7) % 65536) as i64).collect());
    }
    series
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");

    for rows in [1000, 60_000, 600_000].iter() {
        let data = series(*rows, 3);
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("1000hz_to_30hz", rows), &data, |b, data| {
            b.iter(|| black_box(resample(data, 1000.0, 30.0, GapPolicy::CarryForward)));
        });
        group.bench_with_input(BenchmarkId::new("1000hz_to_2000hz", rows), &data, |b, data| {
            b.iter(|| black_box(resample(data, 1000.0, 2000.0, GapPolicy::CarryForward)));
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for rows in [1000, 60_000].iter() {
        let mut text = String::from(
            "# OpenSignals Text File Format. Version 1\n\
             # {\"AA\": {\"sampling rate\": 1000, \"column\": [\"nSeq\", \"DI\", \"CH1\", \"CH2\"], \"resolution\": [16, 16]}}\n\
             # EndOfHeader\n",
        );
        for i in 0..*rows {
            text.push_str(&format!("{}\t{}\t{}\t{}\n", i % 16, i % 2, i % 65536, (i * 3) % 65536));
        }

        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &text, |b, text| {
            b.iter(|| black_box(parse_reader(Cursor::new(text.as_bytes()), Path::new("bench.txt"))));
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let meta = RecordingMetadata::new(
        "AA",
        1000.0,
        vec!["DI".into(), "CH1".into(), "CH2".into()],
        vec![1, 16, 10],
    )
    .expect("valid metadata");
    let normalizer = Normalizer::new(&meta);
    let row = [1i64, 40_000, 512];

    c.bench_function("normalize_row", |b| {
        b.iter(|| black_box(normalizer.row(black_box(&row))));
    });
}

criterion_group!(benches, bench_resample, bench_parse, bench_normalize);

criterion_main!(benches);
