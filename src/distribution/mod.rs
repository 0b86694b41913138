// Size-weighted metric distributions over a snapshot's regions
//
// Each region contributes its byte size as weight and a metric value computed
// by a caller-supplied function. Two views are derived from that:
// - percentiles: the metric value below which a given share of bytes lies
// - histograms: the share of bytes whose metric falls in each value bucket
//
// A third view answers "how much memory serves X% of the bandwidth" by walking
// regions from the most to the least frequently accessed.

mod config;
mod histogram;
mod metrics;
mod percentile;

pub use config::{HistogramConfig, PercentileConfig};
pub use histogram::{histogram, HistogramRow};
pub use metrics::{bandwidth, idle_time, RegionMetric};
pub use percentile::{footprint_for_bandwidth, percentiles, FootprintRow, PercentileRow};

#[cfg(test)]
mod tests;
