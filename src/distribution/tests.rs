// Tests for size-weighted distributions over realistic region layouts

use super::*;
use crate::error::Error;
use crate::record::{Region, Snapshot};
use crate::units::{AccessFrequency, Age, AgeUnit, FrequencyUnit, Intervals};

fn region(start: u64, end: u64, samples: u64, age: u64) -> Region {
    Region::new(
        start,
        end,
        AccessFrequency::Samples(samples),
        Age::AggrIntervals(age),
    )
}

fn idle_time_of(region: &Region) -> crate::error::Result<f64> {
    idle_time(region, None)
}

/// Hot heap, lukewarm stack, and a big cold mapping
fn process_layout() -> Vec<Region> {
    vec![
        region(0x1000, 0x11000, 18, 5),      // 64 KiB heap, hot
        region(0x11000, 0x111000, 0, 300),   // 1 MiB, idle for 300 intervals
        region(0x111000, 0x121000, 4, 40),   // 64 KiB, lukewarm
        region(0x121000, 0x521000, 0, 1200), // 4 MiB, long idle
    ]
}

#[test]
fn test_idle_time_percentile_scenario() {
    let regions = vec![region(0, 100, 0, 1000), region(100, 200, 50, 10)];
    let rows = percentiles(&regions, idle_time_of, &PercentileConfig::default()).unwrap();

    let at = |p: f64| rows.iter().find(|r| r.percentile == p).unwrap().value;
    assert_eq!(at(0.0), 0.0);
    assert_eq!(at(50.0), 0.0);
    assert_eq!(at(75.0), 1000.0);
    assert_eq!(at(100.0), 1000.0);
}

#[test]
fn test_percentiles_monotonic() {
    let rows = percentiles(&process_layout(), idle_time_of, &PercentileConfig::every(5.0)).unwrap();
    assert_eq!(rows.len(), 21);
    for pair in rows.windows(2) {
        assert!(pair[0].value <= pair[1].value);
    }
    assert_eq!(rows.last().unwrap().value, 1200.0);
}

#[test]
fn test_percentiles_weighted_by_size() {
    // The 4 MiB idle mapping is ~78% of bytes, so the median lands on it
    let rows = percentiles(&process_layout(), idle_time_of, &PercentileConfig::default()).unwrap();
    let median = rows.iter().find(|r| r.percentile == 50.0).unwrap();
    assert_eq!(median.value, 1200.0);

    let p1 = rows.iter().find(|r| r.percentile == 1.0).unwrap();
    assert_eq!(p1.value, 0.0);
}

#[test]
fn test_percentiles_empty_is_invalid() {
    assert!(matches!(
        percentiles(&[], idle_time_of, &PercentileConfig::default()),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_percentiles_custom_metric() {
    let rows = percentiles(
        &process_layout(),
        |r: &Region| Ok(r.size() as f64),
        &PercentileConfig::default(),
    )
    .unwrap();
    assert_eq!(rows[0].value, 65536.0);
    assert_eq!(rows.last().unwrap().value, 4194304.0);
}

#[test]
fn test_histogram_mass_conservation() {
    let config = HistogramConfig {
        buckets: 7,
        ..HistogramConfig::default()
    };
    let rows = histogram(&process_layout(), idle_time_of, &config).unwrap();
    assert_eq!(rows.len(), 7);

    let total: f64 = rows.iter().map(|r| r.percent).sum();
    assert!((total - 100.0).abs() < 1e-9);
}

#[test]
fn test_histogram_skip_empty_keeps_mass() {
    let config = HistogramConfig {
        skip_empty: true,
        ..HistogramConfig::default()
    };
    let rows = histogram(&process_layout(), idle_time_of, &config).unwrap();
    assert!(rows.iter().all(|r| r.bytes > 0));
    assert!(rows.len() <= 4);

    let total: f64 = rows.iter().map(|r| r.percent).sum();
    assert!((total - 100.0).abs() < 1e-9);
    assert_eq!(rows.last().unwrap().upper_bound, 1200.0);
}

#[test]
fn test_histogram_bucket_bounds() {
    let regions = vec![region(0, 10, 0, 0), region(10, 30, 0, 100)];
    let config = HistogramConfig {
        buckets: 4,
        ..HistogramConfig::default()
    };
    let rows = histogram(&regions, |r: &Region| Ok(r.age.raw() as f64), &config).unwrap();

    let bounds: Vec<f64> = rows.iter().map(|r| r.upper_bound).collect();
    assert_eq!(bounds, vec![25.0, 50.0, 75.0, 100.0]);
    assert_eq!(rows[0].bytes, 10);
    assert_eq!(rows[3].bytes, 20);
    assert!((rows[3].percent - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_histogram_granularity() {
    let regions = vec![region(0, 10, 0, 0), region(10, 20, 0, 95)];
    let config = HistogramConfig {
        granularity: Some(10.0),
        ..HistogramConfig::default()
    };
    let rows = histogram(&regions, |r: &Region| Ok(r.age.raw() as f64), &config).unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0].upper_bound, 10.0);
    assert_eq!(rows[9].upper_bound, 95.0);
    assert_eq!(rows[9].bytes, 10);
}

#[test]
fn test_histogram_single_value() {
    let regions = vec![region(0, 10, 3, 0), region(10, 20, 3, 0)];
    let rows = histogram(&regions, |r: &Region| Ok(r.access.raw()), &HistogramConfig::default()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].upper_bound, 3.0);
    assert_eq!(rows[0].percent, 100.0);
}

#[test]
fn test_histogram_log_scale() {
    let config = HistogramConfig {
        buckets: 3,
        log_scale: true,
        ..HistogramConfig::default()
    };
    let regions = vec![region(0, 10, 0, 0), region(10, 20, 0, 9), region(20, 30, 0, 999)];
    let rows = histogram(&regions, |r: &Region| Ok(r.age.raw() as f64), &config).unwrap();

    // ln(1000) / 3 per bucket: upper bounds 9, 99, 999
    assert_eq!(rows.len(), 3);
    assert!((rows[0].upper_bound - 9.0).abs() < 1e-6);
    assert!((rows[1].upper_bound - 99.0).abs() < 1e-6);
    assert_eq!(rows[2].upper_bound, 999.0);
    assert_eq!(rows[2].bytes, 10);
}

#[test]
fn test_footprint_for_bandwidth() {
    let rows = footprint_for_bandwidth(&process_layout(), None, &PercentileConfig::default()).unwrap();

    let at = |p: f64| rows.iter().find(|r| r.percentile == p).unwrap().bytes;
    assert_eq!(at(0.0), 0);
    // the hot heap alone carries 18 * 64 KiB of 22 * 64 KiB
    assert_eq!(at(50.0), 0x10000);
    assert_eq!(at(99.0), 0x20000);
    // idle mappings never join the footprint
    assert_eq!(at(100.0), 0x20000);
}

#[test]
fn test_footprint_without_accesses_is_invalid() {
    let regions = vec![region(0, 10, 0, 3)];
    assert!(footprint_for_bandwidth(&regions, None, &PercentileConfig::default()).is_err());
}

#[test]
fn test_metrics_after_unit_normalization() {
    let intervals = Intervals::default();
    let mut snapshot = Snapshot::new(
        0,
        100,
        vec![
            Region::new(0, 100, AccessFrequency::Percent(0.0), Age::Usecs(2_000_000)),
            Region::new(100, 200, AccessFrequency::Samples(0), Age::AggrIntervals(10)),
        ],
    );
    snapshot
        .convert_units(FrequencyUnit::Samples, AgeUnit::AggrIntervals, Some(&intervals))
        .unwrap();

    let rows = percentiles(snapshot.regions(), idle_time_of, &PercentileConfig::default()).unwrap();
    assert_eq!(rows[0].value, 10.0);
    assert_eq!(rows.last().unwrap().value, 20.0);
}

#[test]
fn test_inverted_regions_are_inconsistent() {
    let regions = vec![region(10, 5, 1, 0), region(20, 20, 1, 0)];
    assert!(matches!(
        histogram(&regions, idle_time_of, &HistogramConfig::default()),
        Err(Error::Inconsistent(_))
    ));
    assert!(matches!(
        percentiles(&regions, idle_time_of, &PercentileConfig::default()),
        Err(Error::Inconsistent(_))
    ));
    assert!(matches!(
        footprint_for_bandwidth(&regions, None, &PercentileConfig::default()),
        Err(Error::Inconsistent(_))
    ));
}

#[test]
fn test_metric_errors_are_passed_through() {
    let regions = vec![Region::new(
        0,
        100,
        AccessFrequency::Percent(50.0),
        Age::AggrIntervals(0),
    )];
    let bandwidth_of = |r: &Region| RegionMetric::Bandwidth.evaluate(r, None);
    assert!(matches!(
        percentiles(&regions, bandwidth_of, &PercentileConfig::default()),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        histogram(&regions, bandwidth_of, &HistogramConfig::default()),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_footprint_compares_mixed_units_as_samples() {
    // 50% of 20 samples is 10, colder than the 20-sample region
    let regions = vec![
        Region::new(0, 100, AccessFrequency::Percent(50.0), Age::AggrIntervals(0)),
        Region::new(100, 200, AccessFrequency::Samples(20), Age::AggrIntervals(0)),
    ];
    let intervals = Intervals::default();
    assert!(matches!(
        footprint_for_bandwidth(&regions, None, &PercentileConfig::default()),
        Err(Error::InvalidArgument(_))
    ));

    let rows =
        footprint_for_bandwidth(&regions, Some(&intervals), &PercentileConfig::default()).unwrap();
    let at = |p: f64| rows.iter().find(|r| r.percentile == p).unwrap().bytes;
    // the hotter region alone serves 2000 of 3000 bandwidth units
    assert_eq!(at(50.0), 100);
    assert_eq!(at(75.0), 200);
    assert_eq!(at(100.0), 200);
}

#[test]
fn test_histogram_granularity_bucket_limit() {
    let regions = vec![region(0, 10, 0, 0), region(10, 20, 0, 1_000_000)];
    let config = HistogramConfig {
        granularity: Some(1e-12),
        ..HistogramConfig::default()
    };
    assert!(matches!(
        histogram(&regions, |r: &Region| Ok(r.age.raw() as f64), &config),
        Err(Error::InvalidArgument(_))
    ));

    let log_config = HistogramConfig {
        log_scale: true,
        ..config
    };
    assert!(matches!(
        histogram(&regions, |r: &Region| Ok(r.age.raw() as f64), &log_config),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_percentiles_tiny_interval_is_invalid() {
    assert!(matches!(
        percentiles(&process_layout(), idle_time_of, &PercentileConfig::every(1e-9)),
        Err(Error::InvalidArgument(_))
    ));
}
