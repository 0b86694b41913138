//! Monitoring intervals and the dual units of access frequency and age
//!
//! A monitor reports access frequency either as a raw sample count (bounded
//! by `aggregate / sample`) or as a percentage of that bound, and age either
//! in microseconds or in aggregation intervals. Both forms are explicit
//! variants here; converting between them needs the owning record's
//! [`Intervals`] unless the value is already in the requested unit.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Sampling, aggregation and update intervals of a monitoring context (microseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Intervals {
    pub sample: u64,
    pub aggregate: u64,
    pub update: u64,
}

impl Intervals {
    pub fn new(sample: u64, aggregate: u64, update: u64) -> Self {
        Self {
            sample,
            aggregate,
            update,
        }
    }

    /// Upper bound of a sample-count access frequency
    pub fn max_samples(&self) -> Result<u64> {
        self.check()?;
        Ok((self.aggregate / self.sample).max(1))
    }

    /// Aggregation interval in nanoseconds, the time base of snapshots
    pub fn aggregate_ns(&self) -> u64 {
        self.aggregate.saturating_mul(1000)
    }

    fn check(&self) -> Result<()> {
        if self.sample == 0 || self.aggregate == 0 {
            return Err(Error::invalid(format!(
                "intervals must be positive for unit conversion (sample={}us, aggregate={}us)",
                self.sample, self.aggregate
            )));
        }
        Ok(())
    }
}

impl Default for Intervals {
    /// Kernel defaults: 5ms sampling, 100ms aggregation, 1s update
    fn default() -> Self {
        Self::new(5_000, 100_000, 1_000_000)
    }
}

/// Unit an access frequency is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyUnit {
    #[default]
    Samples,
    Percent,
}

/// Unit an age is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeUnit {
    #[default]
    AggrIntervals,
    Usecs,
}

/// Observed access frequency of a region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessFrequency {
    /// Number of sampling intervals in which an access was seen
    Samples(u64),
    /// Share of sampling intervals with an access, 0 to 100
    Percent(f64),
}

impl AccessFrequency {
    pub fn unit(&self) -> FrequencyUnit {
        match self {
            AccessFrequency::Samples(_) => FrequencyUnit::Samples,
            AccessFrequency::Percent(_) => FrequencyUnit::Percent,
        }
    }

    /// Numeric value in whichever unit this frequency carries
    pub fn raw(&self) -> f64 {
        match *self {
            AccessFrequency::Samples(n) => n as f64,
            AccessFrequency::Percent(p) => p,
        }
    }

    pub fn is_accessed(&self) -> bool {
        self.raw() > 0.0
    }

    /// Sample count; converting a percentage needs `intervals`
    pub fn samples(&self, intervals: Option<&Intervals>) -> Result<u64> {
        match *self {
            AccessFrequency::Samples(n) => Ok(n),
            AccessFrequency::Percent(p) => {
                let max = require(intervals, "percent access frequency")?.max_samples()?;
                Ok((p * max as f64 / 100.0).round().max(0.0) as u64)
            }
        }
    }

    /// Percentage; converting a sample count needs `intervals`
    pub fn percent(&self, intervals: Option<&Intervals>) -> Result<f64> {
        match *self {
            AccessFrequency::Percent(p) => Ok(p),
            AccessFrequency::Samples(n) => {
                let max = require(intervals, "sample-count access frequency")?.max_samples()?;
                Ok(n as f64 * 100.0 / max as f64)
            }
        }
    }

    pub fn to_unit(&self, unit: FrequencyUnit, intervals: Option<&Intervals>) -> Result<Self> {
        Ok(match unit {
            FrequencyUnit::Samples => AccessFrequency::Samples(self.samples(intervals)?),
            FrequencyUnit::Percent => AccessFrequency::Percent(self.percent(intervals)?),
        })
    }
}

/// How long a region has kept its current access pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Age {
    AggrIntervals(u64),
    Usecs(u64),
}

impl Age {
    pub fn unit(&self) -> AgeUnit {
        match self {
            Age::AggrIntervals(_) => AgeUnit::AggrIntervals,
            Age::Usecs(_) => AgeUnit::Usecs,
        }
    }

    pub fn raw(&self) -> u64 {
        match *self {
            Age::AggrIntervals(n) | Age::Usecs(n) => n,
        }
    }

    pub fn aggr_intervals(&self, intervals: Option<&Intervals>) -> Result<u64> {
        match *self {
            Age::AggrIntervals(n) => Ok(n),
            Age::Usecs(us) => {
                let intervals = require(intervals, "microsecond age")?;
                intervals.check()?;
                Ok(us / intervals.aggregate)
            }
        }
    }

    pub fn usecs(&self, intervals: Option<&Intervals>) -> Result<u64> {
        match *self {
            Age::Usecs(us) => Ok(us),
            Age::AggrIntervals(n) => {
                let intervals = require(intervals, "aggregation-interval age")?;
                intervals.check()?;
                Ok(n.saturating_mul(intervals.aggregate))
            }
        }
    }

    pub fn to_unit(&self, unit: AgeUnit, intervals: Option<&Intervals>) -> Result<Self> {
        Ok(match unit {
            AgeUnit::AggrIntervals => Age::AggrIntervals(self.aggr_intervals(intervals)?),
            AgeUnit::Usecs => Age::Usecs(self.usecs(intervals)?),
        })
    }
}

impl Default for Age {
    fn default() -> Self {
        Age::AggrIntervals(0)
    }
}

fn require<'a>(intervals: Option<&'a Intervals>, what: &str) -> Result<&'a Intervals> {
    intervals.ok_or_else(|| Error::invalid(format!("converting {} requires intervals", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_samples() {
        let intervals = Intervals::default();
        assert_eq!(intervals.max_samples().unwrap(), 20);
        assert_eq!(intervals.aggregate_ns(), 100_000_000);
    }

    #[test]
    fn test_max_samples_zero_interval() {
        let intervals = Intervals::new(0, 100_000, 1_000_000);
        assert!(matches!(
            intervals.max_samples(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_frequency_conversion() {
        let intervals = Intervals::default();
        let freq = AccessFrequency::Samples(5);
        assert_eq!(freq.percent(Some(&intervals)).unwrap(), 25.0);

        let freq = AccessFrequency::Percent(50.0);
        assert_eq!(freq.samples(Some(&intervals)).unwrap(), 10);
    }

    #[test]
    fn test_same_unit_needs_no_intervals() {
        assert_eq!(AccessFrequency::Samples(7).samples(None).unwrap(), 7);
        assert_eq!(AccessFrequency::Percent(7.5).percent(None).unwrap(), 7.5);
        assert_eq!(Age::Usecs(30).usecs(None).unwrap(), 30);
    }

    #[test]
    fn test_cross_unit_without_intervals_fails() {
        assert!(AccessFrequency::Percent(10.0).samples(None).is_err());
        assert!(Age::AggrIntervals(3).usecs(None).is_err());
    }

    #[test]
    fn test_age_conversion() {
        let intervals = Intervals::default();
        assert_eq!(
            Age::AggrIntervals(3).usecs(Some(&intervals)).unwrap(),
            300_000
        );
        assert_eq!(
            Age::Usecs(250_000).aggr_intervals(Some(&intervals)).unwrap(),
            2
        );
        assert_eq!(
            Age::Usecs(250_000)
                .to_unit(AgeUnit::AggrIntervals, Some(&intervals))
                .unwrap(),
            Age::AggrIntervals(2)
        );
    }

    #[test]
    fn test_frequency_serde_tagged() {
        let json = serde_json::to_string(&AccessFrequency::Samples(4)).unwrap();
        assert_eq!(json, r#"{"samples":4}"#);
        let back: AccessFrequency = serde_json::from_str(r#"{"percent":12.5}"#).unwrap();
        assert_eq!(back, AccessFrequency::Percent(12.5));
    }
}
