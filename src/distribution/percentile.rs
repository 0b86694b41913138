// Size-weighted percentiles and bandwidth footprints

use crate::distribution::config::PercentileConfig;
use crate::error::{Error, Result};
use crate::record::{validate_regions, Region};
use crate::units::Intervals;
use serde::Serialize;
use std::fmt;

/// Metric value at a percentile of total bytes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileRow {
    pub percentile: f64,
    pub value: f64,
}

impl fmt::Display for PercentileRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6.2} {}", self.percentile, self.value)
    }
}

/// Smallest memory footprint serving a percentile of total bandwidth
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FootprintRow {
    pub percentile: f64,
    pub bytes: u64,
}

/// Size-weighted percentiles of `metric` over `regions`
///
/// Regions are sorted by metric value (ties keep input order) and walked in
/// ascending order. Each threshold reports the value of the region at which
/// the accumulated size first reaches that share of the total. The 100th
/// percentile always reports the largest value. Regions with inverted or
/// empty bounds are [`Error::Inconsistent`], and the first error `metric`
/// returns is passed through.
///
/// # Example
/// ```
/// use regionscope::distribution::{idle_time, percentiles, PercentileConfig};
/// use regionscope::record::Region;
/// use regionscope::units::{AccessFrequency, Age};
///
/// let regions = vec![
///     Region::new(0, 100, AccessFrequency::Samples(0), Age::AggrIntervals(1000)),
///     Region::new(100, 200, AccessFrequency::Samples(50), Age::AggrIntervals(10)),
/// ];
/// let rows = percentiles(&regions, |r| idle_time(r, None), &PercentileConfig::default()).unwrap();
/// let median = rows.iter().find(|r| r.percentile == 50.0).unwrap();
/// assert_eq!(median.value, 0.0);
/// assert_eq!(rows.last().unwrap().value, 1000.0);
/// ```
pub fn percentiles<F>(
    regions: &[Region],
    metric: F,
    config: &PercentileConfig,
) -> Result<Vec<PercentileRow>>
where
    F: Fn(&Region) -> Result<f64>,
{
    if regions.is_empty() {
        return Err(Error::invalid("no regions to compute percentiles over"));
    }
    validate_regions(regions)?;
    let thresholds = config.thresholds()?;

    let mut entries = regions
        .iter()
        .map(|r| Ok((metric(r)?, r.size())))
        .collect::<Result<Vec<(f64, u64)>>>()?;
    entries.sort_by(|a, b| a.0.total_cmp(&b.0));
    let total: u64 = entries.iter().map(|e| e.1).sum();
    let last = entries.len() - 1;

    let mut rows = Vec::with_capacity(thresholds.len());
    let mut idx = 0;
    let mut accumulated = entries[0].1;
    for percentile in thresholds {
        if percentile >= 100.0 {
            rows.push(PercentileRow {
                percentile,
                value: entries[last].0,
            });
            continue;
        }
        let target = total as f64 * percentile / 100.0;
        while (accumulated as f64) < target && idx < last {
            idx += 1;
            accumulated += entries[idx].1;
        }
        rows.push(PercentileRow {
            percentile,
            value: entries[idx].0,
        });
    }

    Ok(rows)
}

/// Minimum bytes serving each percentile of total bandwidth
///
/// Regions are taken from the most to the least frequently accessed, so
/// the accumulated size at each threshold is the smallest footprint that
/// accounts for that share of traffic. Frequencies are compared as sample
/// counts, so percent-valued regions need `intervals`.
pub fn footprint_for_bandwidth(
    regions: &[Region],
    intervals: Option<&Intervals>,
    config: &PercentileConfig,
) -> Result<Vec<FootprintRow>> {
    if regions.is_empty() {
        return Err(Error::invalid("no regions to compute a footprint over"));
    }
    validate_regions(regions)?;
    let thresholds = config.thresholds()?;

    let mut entries = regions
        .iter()
        .map(|r| Ok((r.access.samples(intervals)? as f64, r.size())))
        .collect::<Result<Vec<(f64, u64)>>>()?;
    entries.sort_by(|a, b| b.0.total_cmp(&a.0));

    // Summed in walk order so the final threshold lands exactly on the total
    let total_bandwidth: f64 = entries.iter().map(|(freq, size)| freq * *size as f64).sum();
    if total_bandwidth <= 0.0 {
        return Err(Error::invalid(
            "regions carry no accesses, bandwidth footprint is undefined",
        ));
    }

    let mut rows = Vec::with_capacity(thresholds.len());
    let mut idx = 0;
    let mut bandwidth = 0.0;
    let mut bytes = 0u64;
    for percentile in thresholds {
        let target = if percentile >= 100.0 {
            total_bandwidth
        } else {
            total_bandwidth * percentile / 100.0
        };
        while bandwidth < target && idx < entries.len() {
            let (freq, size) = entries[idx];
            bandwidth += freq * size as f64;
            bytes += size;
            idx += 1;
        }
        rows.push(FootprintRow {
            percentile,
            bytes,
        });
    }

    Ok(rows)
}
