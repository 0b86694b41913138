// Region metric functions
//
// Metrics read frequencies as sample counts and ages as aggregation
// intervals. Regions carrying percentages or microseconds are converted on
// the fly, which needs the record's intervals; without them such regions
// are rejected rather than read in the wrong unit.

use crate::error::Result;
use crate::record::Region;
use crate::units::Intervals;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregation intervals a region has gone without any access; zero while
/// it is accessed
pub fn idle_time(region: &Region, intervals: Option<&Intervals>) -> Result<f64> {
    if region.access.is_accessed() {
        Ok(0.0)
    } else {
        Ok(region.age.aggr_intervals(intervals)? as f64)
    }
}

/// Estimated memory traffic of a region: bytes times access samples
pub fn bandwidth(region: &Region, intervals: Option<&Intervals>) -> Result<f64> {
    Ok(region.size() as f64 * region.access.samples(intervals)? as f64)
}

/// Named metric selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionMetric {
    #[default]
    IdleTime,
    Bandwidth,
    AccessFrequency,
    Age,
    Size,
}

impl RegionMetric {
    /// Value of this metric for `region`, in sample and aggregation
    /// interval units
    pub fn evaluate(&self, region: &Region, intervals: Option<&Intervals>) -> Result<f64> {
        match self {
            RegionMetric::IdleTime => idle_time(region, intervals),
            RegionMetric::Bandwidth => bandwidth(region, intervals),
            RegionMetric::AccessFrequency => Ok(region.access.samples(intervals)? as f64),
            RegionMetric::Age => Ok(region.age.aggr_intervals(intervals)? as f64),
            RegionMetric::Size => Ok(region.size() as f64),
        }
    }
}

impl fmt::Display for RegionMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionMetric::IdleTime => "idle_time",
            RegionMetric::Bandwidth => "bandwidth",
            RegionMetric::AccessFrequency => "access_frequency",
            RegionMetric::Age => "age",
            RegionMetric::Size => "size",
        };
        f.write_str(name)
    }
}
