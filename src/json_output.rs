//! JSON output format for reports
//!
//! Every report is wrapped in a versioned envelope so consumers can tell the
//! report kind apart without guessing from its shape.

use crate::distribution::{FootprintRow, HistogramRow, PercentileRow, RegionMetric};
use crate::guide::GuideInfo;
use crate::heatmap::HeatGrid;
use crate::record::{Record, RecordId};
use serde::Serialize;

/// Distribution rows of one record
#[derive(Debug, Clone, Serialize)]
pub struct JsonRows<T> {
    pub id: RecordId,
    pub rows: Vec<T>,
}

/// Report body, tagged by kind
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum JsonReport {
    Records {
        records: Vec<Record>,
    },
    Percentiles {
        metric: RegionMetric,
        records: Vec<JsonRows<PercentileRow>>,
    },
    Histogram {
        metric: RegionMetric,
        records: Vec<JsonRows<HistogramRow>>,
    },
    Footprint {
        records: Vec<JsonRows<FootprintRow>>,
    },
    Heatmap {
        grid: HeatGrid,
    },
    Guide {
        guides: Vec<GuideInfo>,
    },
}

/// Root JSON document
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    #[serde(flatten)]
    pub report: JsonReport,
}

impl JsonOutput {
    pub fn new(report: JsonReport) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "regionscope-json-v1".to_string(),
            report,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heatmap::build_heatmap;
    use crate::record::{Region, Snapshot};
    use crate::units::{AccessFrequency, Age};

    fn record() -> Record {
        Record::new(
            RecordId::new(0, 0, None, 1),
            None,
            vec![Snapshot::new(
                0,
                100,
                vec![Region::new(
                    0,
                    4096,
                    AccessFrequency::Samples(3),
                    Age::AggrIntervals(2),
                )],
            )],
        )
    }

    #[test]
    fn test_envelope_fields() {
        let output = JsonOutput::new(JsonReport::Records {
            records: vec![record()],
        });
        let json = output.to_json().unwrap();
        assert!(json.contains("\"format\": \"regionscope-json-v1\""));
        assert!(json.contains("\"report\": \"records\""));
        assert!(json.contains("\"samples\": 3"));
    }

    #[test]
    fn test_percentile_rows() {
        let output = JsonOutput::new(JsonReport::Percentiles {
            metric: RegionMetric::IdleTime,
            records: vec![JsonRows {
                id: RecordId::new(0, 0, None, 1),
                rows: vec![PercentileRow {
                    percentile: 50.0,
                    value: 12.0,
                }],
            }],
        });
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        assert_eq!(value["report"], "percentiles");
        assert_eq!(value["metric"], "idle_time");
        assert_eq!(value["records"][0]["rows"][0]["value"], 12.0);
        assert_eq!(value["records"][0]["id"]["target"], 1);
    }

    #[test]
    fn test_heatmap_void_is_null() {
        let grid = build_heatmap(&[record()], 0..200, 0..4096, (2, 1), false).unwrap();
        let output = JsonOutput::new(JsonReport::Heatmap { grid });
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

        let pixels = &value["grid"]["pixels"];
        assert_eq!(pixels[0][0]["heat"], 3.0);
        assert!(pixels[1][0]["heat"].is_null());
        assert_eq!(value["grid"]["time_resolution"], 2);
    }
}
