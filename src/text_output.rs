//! Human-readable text output for reports

use crate::distribution::{FootprintRow, HistogramRow, PercentileRow, RegionMetric};
use crate::guide::GuideInfo;
use crate::heatmap::HeatGrid;
use crate::record::{Record, RecordId};

fn push_line(out: &mut String, line: impl AsRef<str>) {
    out.push_str(line.as_ref());
    out.push('\n');
}

/// Snapshots of every record with their regions, one per line
pub fn records_text(records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        push_line(&mut out, record.id.to_string());
        if let Some(intervals) = &record.intervals {
            push_line(
                &mut out,
                format!(
                    "intervals: sample {} us, aggr {} us, update {} us",
                    intervals.sample, intervals.aggregate, intervals.update
                ),
            );
        }
        for snapshot in &record.snapshots {
            push_line(
                &mut out,
                format!(
                    "snapshot {} - {} ({} regions, {} bytes)",
                    snapshot.start_time,
                    snapshot.end_time,
                    snapshot.regions().len(),
                    snapshot.total_bytes()
                ),
            );
            for region in snapshot.regions() {
                push_line(&mut out, format!("  {}", region));
            }
        }
    }
    out
}

/// One `# <record> (<metric>)` header per record followed by its rows
fn sections<T: ToString>(
    records: &[(RecordId, Vec<T>)],
    title: impl Fn(&RecordId) -> String,
) -> String {
    let mut out = String::new();
    for (id, rows) in records {
        push_line(&mut out, title(id));
        for row in rows {
            push_line(&mut out, row.to_string());
        }
    }
    out
}

pub fn percentiles_text(metric: RegionMetric, records: &[(RecordId, Vec<PercentileRow>)]) -> String {
    sections(records, |id| format!("# {} ({})", id, metric))
}

pub fn histogram_text(metric: RegionMetric, records: &[(RecordId, Vec<HistogramRow>)]) -> String {
    sections(records, |id| format!("# {} ({})", id, metric))
}

pub fn footprint_text(records: &[(RecordId, Vec<FootprintRow>)]) -> String {
    let mut out = String::new();
    for (id, rows) in records {
        push_line(&mut out, format!("# {} (bandwidth footprint)", id));
        for row in rows {
            push_line(&mut out, format!("{:>6.2} {}", row.percentile, row.bytes));
        }
    }
    out
}

/// Raw heat rows `<time> <address> <heat>`, time-major
///
/// Void pixels are printed with a heat of 0 so plotting tools get a dense
/// lattice; the JSON and CSV outputs keep them distinct.
pub fn heatmap_text(grid: &HeatGrid) -> String {
    let mut out = String::new();
    for pixel in grid.pixels() {
        push_line(
            &mut out,
            format!(
                "{:.0} {:.0} {}",
                pixel.time,
                pixel.addr,
                pixel.heat.unwrap_or(0.0)
            ),
        );
    }
    out
}

pub fn guide_text(guides: &[GuideInfo]) -> String {
    guides.iter().map(ToString::to_string).collect()
}
