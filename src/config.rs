//! Report configuration
//!
//! Groups the parameters of every engine operation the reporting binary can
//! run. Loaded from a TOML file; command line flags override single fields.
//!
//! # Example regionscope.toml
//!
//! ```toml
//! metric = "idle_time"
//!
//! [percentiles]
//! interval = 10.0
//!
//! [histogram]
//! buckets = 20
//! log_scale = true
//! skip_empty = true
//!
//! [heatmap]
//! time_resolution = 300
//! address_resolution = 80
//! address_policy = "hottest"
//!
//! [resample]
//! duration_ns = 5000000000
//! skip = 1
//! ```

use crate::distribution::{HistogramConfig, PercentileConfig, RegionMetric};
use crate::heatmap::HeatmapConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Temporal resampling parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    /// Minimum time span of each output snapshot (nanoseconds)
    pub duration_ns: u64,

    /// Warm-up snapshots discarded before grouping
    pub skip: usize,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            duration_ns: 1_000_000_000,
            skip: 0,
        }
    }
}

/// All report parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Metric used by percentile and histogram reports
    pub metric: RegionMetric,
    pub percentiles: PercentileConfig,
    pub histogram: HistogramConfig,
    pub heatmap: HeatmapConfig,
    pub resample: ResampleConfig,
}

impl ReportConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid report configuration in {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ReportConfig = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.percentiles.validate()?;
        self.histogram.validate()?;
        self.heatmap.validate()?;
        if self.resample.duration_ns == 0 {
            anyhow::bail!("resample duration_ns must be positive");
        }
        Ok(())
    }
}
