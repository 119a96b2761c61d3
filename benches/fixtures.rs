//! Fixture generation throughput
//!
//! Run: cargo bench --bench fixtures
//! Compare: cargo bench --bench fixtures -- --save-baseline main
//!          cargo bench --bench fixtures -- --baseline main

use chrono::{TimeZone, Utc};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::io;
use vcs_duel::fixture::{ContentKind, FixtureBuilder};
use vcs_duel::scenario::{FileSize, Workload};
use vcs_duel::{Category, Scenario};

const SIZES: [FileSize; 3] = [FileSize::kb(1), FileSize::kb(64), FileSize::mb(1)];

const KINDS: [ContentKind; 6] = [
    ContentKind::Compressible,
    ContentKind::Encoded,
    ContentKind::Record,
    ContentKind::Duplicate,
    ContentKind::Source,
    ContentKind::Binary,
];

fn bench_content(c: &mut Criterion) {
    let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now);
    let builder = FixtureBuilder::new(stamp);
    let mut group = c.benchmark_group("content");

    for size in SIZES {
        let bytes = size.as_bytes();
        group.throughput(Throughput::Bytes(bytes));

        for kind in KINDS {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", kind), size),
                &bytes,
                |b, &bytes| {
                    b.iter(|| {
                        builder
                            .write_content("bench", kind, black_box(1), bytes, &mut io::sink())
                            .unwrap()
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let builder = FixtureBuilder::new(Utc::now());
    let mut group = c.benchmark_group("build");
    group.sample_size(20);

    for workload in [Workload::Generated, Workload::Duplicate, Workload::Mixed] {
        let scenario =
            Scenario::new(100, FileSize::kb(4), "bench", Category::Small).with_workload(workload);
        group.throughput(Throughput::Bytes(scenario.total_bytes()));
        group.bench_function(scenario.key(), |b| {
            b.iter_batched(
                || tempfile::tempdir().unwrap(),
                |dir| {
                    builder.build(&scenario, dir.path()).unwrap();
                    dir
                },
                BatchSize::PerIteration,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_content, bench_build);
criterion_main!(benches);
