// Projection of records onto a heat grid

use crate::error::{Error, Result};
use crate::guide::{default_address_range, infer_guides, AddressRangePolicy};
use crate::heatmap::grid::HeatGrid;
use crate::record::{Record, Region, Snapshot};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Heat grid parameters; unset ranges are derived from the records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Nanoseconds; defaults to first snapshot start .. last snapshot end
    pub time_range: Option<Range<u64>>,

    /// Defaults to a guide-inferred range picked by `address_policy`
    pub address_range: Option<Range<u64>>,

    pub time_resolution: usize,
    pub address_resolution: usize,

    /// Only render the filter-passed share of each region's accesses
    pub filter_passed_only: bool,

    pub address_policy: AddressRangePolicy,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            time_range: None,
            address_range: None,
            time_resolution: 100,
            address_resolution: 100,
            filter_passed_only: false,
            address_policy: AddressRangePolicy::default(),
        }
    }
}

impl HeatmapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.time_resolution == 0 || self.address_resolution == 0 {
            return Err(Error::invalid(format!(
                "heatmap resolution must be positive, got {}x{}",
                self.time_resolution, self.address_resolution
            )));
        }
        for (name, range) in [
            ("time", &self.time_range),
            ("address", &self.address_range),
        ] {
            if let Some(range) = range {
                if range.start >= range.end {
                    return Err(Error::invalid(format!(
                        "heatmap {} range [{}, {}) is empty",
                        name, range.start, range.end
                    )));
                }
            }
        }
        Ok(())
    }

    /// Time and address ranges to render, filling in unset ones
    pub fn resolve_extents(&self, records: &[Record]) -> Result<(Range<u64>, Range<u64>)> {
        let time_range = match &self.time_range {
            Some(range) => range.clone(),
            None => records
                .iter()
                .filter_map(Record::time_span)
                .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))
                .map(|(start, end)| start..end)
                .ok_or_else(|| Error::invalid("no snapshots to derive a time range from"))?,
        };

        let address_range = match &self.address_range {
            Some(range) => range.clone(),
            None => {
                let guides = infer_guides(records)?;
                default_address_range(&guides, self.address_policy)?
            }
        };

        Ok((time_range, address_range))
    }

    /// Build the heat grid of `records` with these parameters
    pub fn build(&self, records: &[Record]) -> Result<HeatGrid> {
        self.validate()?;
        let (time_range, address_range) = self.resolve_extents(records)?;
        tracing::debug!(
            time_start = time_range.start,
            time_end = time_range.end,
            addr_start = address_range.start,
            addr_end = address_range.end,
            "resolved heatmap extents"
        );
        build_heatmap(
            records,
            time_range,
            address_range,
            (self.time_resolution, self.address_resolution),
            self.filter_passed_only,
        )
    }
}

/// Accumulate the heat of every region of every record into a grid
///
/// Each region is painted over the time from its effective observation start
/// to its snapshot's end. With known intervals the start is back-dated by the
/// region's age, but never before the end of the record's previous snapshot.
/// Heat is measured in access samples per unit of time and space.
///
/// # Example
/// ```
/// use regionscope::heatmap::build_heatmap;
/// use regionscope::record::{Record, RecordId, Region, Snapshot};
/// use regionscope::units::{AccessFrequency, Age};
///
/// let record = Record::new(
///     RecordId::new(0, 0, None, 1),
///     None,
///     vec![Snapshot::new(0, 1000, vec![
///         Region::new(0, 4096, AccessFrequency::Samples(12), Age::AggrIntervals(0)),
///     ])],
/// );
///
/// let grid = build_heatmap(&[record], 0..1000, 0..4096, (1, 1), false).unwrap();
/// assert_eq!(grid.pixel(0, 0).unwrap().heat, Some(12.0));
/// ```
pub fn build_heatmap(
    records: &[Record],
    time_range: Range<u64>,
    addr_range: Range<u64>,
    resolution: (usize, usize),
    filter_passed_only: bool,
) -> Result<HeatGrid> {
    let mut grid = HeatGrid::new(time_range, addr_range, resolution)?;
    for record in records {
        record.validate()?;
    }

    let addr = grid.addr_range();
    let mut painted = 0usize;
    for record in records {
        let mut previous_end: Option<u64> = None;
        for snapshot in &record.snapshots {
            for region in snapshot
                .regions()
                .iter()
                .filter(|r| r.intersects(addr.start, addr.end))
            {
                let start = effective_start(record, snapshot, region, previous_end)?;
                if start >= snapshot.end_time {
                    continue;
                }
                let access = region_access(record, region, filter_passed_only)?;
                grid.paint(start..snapshot.end_time, region.start..region.end, access);
                painted += 1;
            }
            previous_end = Some(snapshot.end_time);
        }
    }

    tracing::debug!(
        records = records.len(),
        painted,
        time_resolution = grid.time_resolution(),
        addr_resolution = grid.addr_resolution(),
        "built heatmap"
    );
    Ok(grid)
}

fn effective_start(
    record: &Record,
    snapshot: &Snapshot,
    region: &Region,
    previous_end: Option<u64>,
) -> Result<u64> {
    let start = match &record.intervals {
        Some(intervals) => {
            let age = region.age.aggr_intervals(Some(intervals))?;
            snapshot
                .start_time
                .saturating_sub(age.saturating_mul(intervals.aggregate_ns()))
        }
        None => snapshot.start_time,
    };
    Ok(match previous_end {
        Some(end) => start.max(end),
        None => start,
    })
}

fn region_access(record: &Record, region: &Region, filter_passed_only: bool) -> Result<f64> {
    let samples = region.access.samples(record.intervals.as_ref())? as f64;
    if !filter_passed_only {
        return Ok(samples);
    }
    let passed = region.filter_passed_bytes.ok_or_else(|| {
        Error::invalid(format!(
            "{}: region [{:#x}, {:#x}) has no filter-passed bytes",
            record.id, region.start, region.end
        ))
    })?;
    Ok(samples * passed as f64 / region.size() as f64)
}
