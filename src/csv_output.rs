//! CSV output format for reports
//!
//! One header row, then one row per data point. Multi-record reports carry
//! the record identity in a leading `record` column.

use crate::distribution::{FootprintRow, HistogramRow, PercentileRow};
use crate::guide::GuideInfo;
use crate::heatmap::HeatGrid;
use crate::record::RecordId;

/// CSV table builder
#[derive(Debug)]
pub struct CsvOutput {
    columns: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl CsvOutput {
    pub fn new(columns: Vec<&'static str>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Add a row; missing trailing fields are left empty
    pub fn add_row(&mut self, fields: Vec<String>) {
        self.rows.push(fields);
    }

    fn header(&self) -> String {
        self.columns.join(",")
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn format_row(&self, fields: &[String]) -> String {
        (0..self.columns.len())
            .map(|i| fields.get(i).map(|f| Self::escape_field(f)).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Generate complete CSV output
    pub fn to_csv(&self) -> String {
        let mut output = self.header();
        output.push('\n');
        for row in &self.rows {
            output.push_str(&self.format_row(row));
            output.push('\n');
        }
        output
    }
}

pub fn percentiles_csv(records: &[(RecordId, Vec<PercentileRow>)]) -> String {
    let mut csv = CsvOutput::new(vec!["record", "percentile", "value"]);
    for (id, rows) in records {
        for row in rows {
            csv.add_row(vec![
                id.to_string(),
                row.percentile.to_string(),
                row.value.to_string(),
            ]);
        }
    }
    csv.to_csv()
}

pub fn histogram_csv(records: &[(RecordId, Vec<HistogramRow>)]) -> String {
    let mut csv = CsvOutput::new(vec!["record", "upper_bound", "bytes", "percent"]);
    for (id, rows) in records {
        for row in rows {
            csv.add_row(vec![
                id.to_string(),
                row.upper_bound.to_string(),
                row.bytes.to_string(),
                format!("{:.2}", row.percent),
            ]);
        }
    }
    csv.to_csv()
}

pub fn footprint_csv(records: &[(RecordId, Vec<FootprintRow>)]) -> String {
    let mut csv = CsvOutput::new(vec!["record", "percentile", "bytes"]);
    for (id, rows) in records {
        for row in rows {
            csv.add_row(vec![
                id.to_string(),
                row.percentile.to_string(),
                row.bytes.to_string(),
            ]);
        }
    }
    csv.to_csv()
}

/// One row per pixel; void pixels have an empty heat field
pub fn heatmap_csv(grid: &HeatGrid) -> String {
    let mut csv = CsvOutput::new(vec!["time", "address", "heat"]);
    for pixel in grid.pixels() {
        csv.add_row(vec![
            format!("{:.0}", pixel.time),
            format!("{:.0}", pixel.addr),
            pixel.heat.map(|h| h.to_string()).unwrap_or_default(),
        ]);
    }
    csv.to_csv()
}

/// One row per contiguous region of every guide
pub fn guide_csv(guides: &[GuideInfo]) -> String {
    let mut csv = CsvOutput::new(vec!["record", "start", "end", "size", "heat"]);
    for guide in guides {
        for region in &guide.contig_regions {
            csv.add_row(vec![
                guide.id.to_string(),
                region.start.to_string(),
                region.end.to_string(),
                region.size().to_string(),
                region.heat.to_string(),
            ]);
        }
    }
    csv.to_csv()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heatmap::build_heatmap;
    use crate::record::{Record, Region, Snapshot};
    use crate::units::{AccessFrequency, Age};

    #[test]
    fn test_csv_escape_field_simple() {
        assert_eq!(CsvOutput::escape_field("hello"), "hello");
    }

    #[test]
    fn test_csv_escape_field_with_comma() {
        assert_eq!(CsvOutput::escape_field("hello,world"), "\"hello,world\"");
    }

    #[test]
    fn test_csv_escape_field_with_quote() {
        assert_eq!(CsvOutput::escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_short_rows_padded() {
        let mut csv = CsvOutput::new(vec!["a", "b", "c"]);
        csv.add_row(vec!["1".to_string()]);
        assert_eq!(csv.to_csv(), "a,b,c\n1,,\n");
    }

    #[test]
    fn test_percentiles_csv() {
        let id = RecordId::new(0, 0, None, 1);
        let rows = vec![
            PercentileRow {
                percentile: 0.0,
                value: 0.0,
            },
            PercentileRow {
                percentile: 100.0,
                value: 42.5,
            },
        ];
        let csv = percentiles_csv(&[(id, rows)]);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "record,percentile,value");
        assert_eq!(lines[2], "kdamond 0 context 0 target 1,100,42.5");
    }

    #[test]
    fn test_heatmap_csv_void_empty() {
        let record = Record::new(
            RecordId::new(0, 0, None, 1),
            None,
            vec![Snapshot::new(
                0,
                100,
                vec![Region::new(
                    0,
                    50,
                    AccessFrequency::Samples(4),
                    Age::AggrIntervals(0),
                )],
            )],
        );
        let grid = build_heatmap(&[record], 0..100, 0..100, (1, 2), false).unwrap();
        let csv = heatmap_csv(&grid);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines, vec!["time,address,heat", "0,0,4", "0,50,"]);
    }
}
