// Configuration for percentile and histogram views
//
// Breakpoints and bucket counts are explicit fields with `Default` impls, so
// every caller states (or inherits) the exact parameters it ran with.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Upper limit on histogram buckets, fixed or derived from a granularity
pub const MAX_BUCKETS: usize = 1_000_000;

/// Upper limit on percentile thresholds generated from an interval
pub const MAX_THRESHOLDS: usize = 1_000_000;

/// Which percentiles to report
///
/// # Example
/// ```
/// use regionscope::distribution::PercentileConfig;
///
/// let config = PercentileConfig::default();
/// assert_eq!(config.thresholds().unwrap(), vec![0.0, 1.0, 25.0, 50.0, 75.0, 99.0, 100.0]);
///
/// let every_ten = PercentileConfig::every(10.0);
/// assert_eq!(every_ten.thresholds().unwrap().len(), 11);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PercentileConfig {
    /// Explicit breakpoints in percent, used when `interval` is unset
    pub breakpoints: Vec<f64>,

    /// Report every `interval` percent from 0 to 100 instead of `breakpoints`
    pub interval: Option<f64>,
}

impl Default for PercentileConfig {
    fn default() -> Self {
        Self {
            breakpoints: vec![0.0, 1.0, 25.0, 50.0, 75.0, 99.0, 100.0],
            interval: None,
        }
    }
}

impl PercentileConfig {
    pub fn every(interval: f64) -> Self {
        Self {
            interval: Some(interval),
            ..Self::default()
        }
    }

    /// Sorted thresholds to evaluate, always ending at 100
    pub fn thresholds(&self) -> Result<Vec<f64>> {
        self.validate()?;

        let mut thresholds = match self.interval {
            Some(interval) => {
                let steps = (100.0 / interval).floor() as usize;
                (0..=steps).map(|i| i as f64 * interval).collect()
            }
            None => self.breakpoints.clone(),
        };
        thresholds.sort_by(f64::total_cmp);
        thresholds.dedup();
        if thresholds.last() != Some(&100.0) {
            thresholds.push(100.0);
        }
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(interval) = self.interval {
            if !(interval > 0.0 && interval <= 100.0) {
                return Err(Error::invalid(format!(
                    "percentile interval must be in (0, 100], got {}",
                    interval
                )));
            }
            if 100.0 / interval > MAX_THRESHOLDS as f64 {
                return Err(Error::invalid(format!(
                    "percentile interval {} yields more than {} thresholds",
                    interval, MAX_THRESHOLDS
                )));
            }
            return Ok(());
        }

        if self.breakpoints.is_empty() {
            return Err(Error::invalid("no percentile breakpoints given"));
        }
        if let Some(bad) = self
            .breakpoints
            .iter()
            .find(|p| !(0.0..=100.0).contains(*p))
        {
            return Err(Error::invalid(format!(
                "percentile breakpoint must be in [0, 100], got {}",
                bad
            )));
        }
        Ok(())
    }
}

/// How to bucket metric values into a histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Number of equal-width buckets, ignored when `granularity` is set
    pub buckets: usize,

    /// Bucket width in metric units (log units when `log_scale` is set)
    pub granularity: Option<f64>,

    /// Space buckets evenly in `ln(1 + value - min)` instead of `value`
    pub log_scale: bool,

    /// Omit buckets holding no bytes from the output
    pub skip_empty: bool,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            buckets: 100,
            granularity: None,
            log_scale: false,
            skip_empty: false,
        }
    }
}

impl HistogramConfig {
    pub fn validate(&self) -> Result<()> {
        match self.granularity {
            Some(granularity) if !(granularity > 0.0 && granularity.is_finite()) => {
                Err(Error::invalid(format!(
                    "histogram granularity must be positive, got {}",
                    granularity
                )))
            }
            None if self.buckets == 0 => Err(Error::invalid("histogram needs at least one bucket")),
            None if self.buckets > MAX_BUCKETS => Err(Error::invalid(format!(
                "histogram takes at most {} buckets, got {}",
                MAX_BUCKETS, self.buckets
            ))),
            _ => Ok(()),
        }
    }
}
