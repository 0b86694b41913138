// Size-weighted histogram of a region metric

use crate::distribution::config::{HistogramConfig, MAX_BUCKETS};
use crate::error::{Error, Result};
use crate::record::{validate_regions, Region};
use serde::Serialize;
use std::fmt;

/// One histogram bucket: upper metric bound and share of total bytes in it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramRow {
    pub upper_bound: f64,
    pub bytes: u64,
    pub percent: f64,
}

impl fmt::Display for HistogramRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<= {:<16} {:>16} bytes {:>7.3}%",
            self.upper_bound, self.bytes, self.percent
        )
    }
}

/// Bucket layout over `[min, max]`, linear or in `ln(1 + v - min)` space
struct Buckets {
    min: f64,
    max: f64,
    width: f64,
    count: usize,
    log_scale: bool,
}

impl Buckets {
    fn new(min: f64, max: f64, config: &HistogramConfig) -> Result<Self> {
        let log_scale = config.log_scale;
        let span = if log_scale { (max - min).ln_1p() } else { max - min };

        if span <= 0.0 {
            return Ok(Self {
                min,
                max,
                width: 0.0,
                count: 1,
                log_scale,
            });
        }

        let (width, count) = match config.granularity {
            Some(granularity) => {
                let count = (span / granularity).ceil();
                if !(count <= MAX_BUCKETS as f64) {
                    return Err(Error::invalid(format!(
                        "granularity {} over a span of {} needs more than {} buckets",
                        granularity, span, MAX_BUCKETS
                    )));
                }
                (granularity, (count as usize).max(1))
            }
            None => (span / config.buckets as f64, config.buckets),
        };
        Ok(Self {
            min,
            max,
            width,
            count,
            log_scale,
        })
    }

    fn position(&self, value: f64) -> f64 {
        if self.log_scale {
            (value - self.min).ln_1p()
        } else {
            value - self.min
        }
    }

    fn index_of(&self, value: f64) -> usize {
        if self.width <= 0.0 {
            return self.count - 1;
        }
        ((self.position(value) / self.width) as usize).min(self.count - 1)
    }

    fn upper_bound(&self, idx: usize) -> f64 {
        if idx + 1 == self.count {
            return self.max;
        }
        let position = (idx + 1) as f64 * self.width;
        if self.log_scale {
            self.min + position.exp_m1()
        } else {
            self.min + position
        }
    }
}

/// Share of total bytes whose `metric` value falls in each bucket
///
/// Buckets split `[min, max]` of the metric into equal widths. With
/// `skip_empty` the buckets holding no bytes are left out; the remaining
/// percentages still sum to 100. Regions with inverted or empty bounds are
/// [`Error::Inconsistent`], as are non-finite metric values.
pub fn histogram<F>(
    regions: &[Region],
    metric: F,
    config: &HistogramConfig,
) -> Result<Vec<HistogramRow>>
where
    F: Fn(&Region) -> Result<f64>,
{
    if regions.is_empty() {
        return Err(Error::invalid("no regions to build a histogram over"));
    }
    config.validate()?;
    validate_regions(regions)?;

    let values = regions
        .iter()
        .map(|r| Ok((metric(r)?, r.size())))
        .collect::<Result<Vec<(f64, u64)>>>()?;
    if let Some((value, _)) = values.iter().find(|v| !v.0.is_finite()) {
        return Err(Error::inconsistent(format!(
            "metric value {} cannot be bucketed",
            value
        )));
    }
    let min = values.iter().map(|v| v.0).fold(f64::INFINITY, f64::min);
    let max = values.iter().map(|v| v.0).fold(f64::NEG_INFINITY, f64::max);
    let total: u64 = values.iter().map(|v| v.1).sum();

    let buckets = Buckets::new(min, max, config)?;
    let mut sizes = vec![0u64; buckets.count];
    for (value, size) in &values {
        sizes[buckets.index_of(*value)] += size;
    }

    let rows = sizes
        .iter()
        .enumerate()
        .filter(|(_, bytes)| !(config.skip_empty && **bytes == 0))
        .map(|(idx, bytes)| HistogramRow {
            upper_bound: buckets.upper_bound(idx),
            bytes: *bytes,
            percent: *bytes as f64 / total as f64 * 100.0,
        })
        .collect();

    Ok(rows)
}
