/// Heat grid and aggregation benchmarks
///
/// Measures grid building over synthetic records at several resolutions and
/// snapshot aggregation over growing snapshot counts.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use regionscope::aggregate::aggregate_snapshots;
use regionscope::heatmap::build_heatmap;
use regionscope::record::{Record, RecordId, Region, Snapshot};
use regionscope::units::{AccessFrequency, Age, Intervals};
use std::time::Duration;

const PAGE: u64 = 4096;
const SNAPSHOT_NS: u64 = 100_000_000;

/// Snapshots of `regions` pages each, with shifting boundaries and heat
fn synthetic_snapshots(count: usize, regions: u64) -> Vec<Snapshot> {
    (0..count as u64)
        .map(|i| {
            let shift = (i % 3) * PAGE / 4;
            let layout = (0..regions)
                .map(|r| {
                    let start = if r == 0 { 0 } else { r * PAGE + shift };
                    Region::new(
                        start,
                        (r + 1) * PAGE + shift,
                        AccessFrequency::Samples((r * 7 + i) % 20),
                        Age::AggrIntervals(i % 5),
                    )
                })
                .collect();
            Snapshot::new(i * SNAPSHOT_NS, (i + 1) * SNAPSHOT_NS, layout)
        })
        .collect()
}

fn bench_heatmap_resolutions(c: &mut Criterion) {
    let mut group = c.benchmark_group("heatmap_resolution");
    group.measurement_time(Duration::from_secs(5));

    let snapshots = synthetic_snapshots(100, 64);
    let record = Record::new(
        RecordId::new(0, 0, None, 1),
        Some(Intervals::default()),
        snapshots,
    );
    let records = [record];
    let time_range = 0..100 * SNAPSHOT_NS;
    let addr_range = 0..65 * PAGE;

    for resolution in [10usize, 100, 300].iter() {
        group.throughput(Throughput::Elements((resolution * resolution) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(resolution),
            resolution,
            |b, &resolution| {
                b.iter(|| {
                    build_heatmap(
                        black_box(&records),
                        time_range.clone(),
                        addr_range.clone(),
                        (resolution, resolution),
                        false,
                    )
                })
            },
        );
    }

    group.finish();
}

fn bench_aggregate_snapshots(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_snapshots");
    group.measurement_time(Duration::from_secs(5));

    for count in [10usize, 100, 500].iter() {
        let snapshots = synthetic_snapshots(*count, 64);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &snapshots, |b, snapshots| {
            b.iter(|| aggregate_snapshots(black_box(snapshots), None))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_heatmap_resolutions, bench_aggregate_snapshots);
criterion_main!(benches);
