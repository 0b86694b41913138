//! Monitoring records: regions, snapshots and identified snapshot sequences
//!
//! A [`Snapshot`] partitions the monitored address space into disjoint,
//! sorted [`Region`]s. A [`Record`] is the time-ordered snapshot stream of
//! one monitoring target, identified by a [`RecordId`].

use crate::error::{Error, Result};
use crate::units::{AccessFrequency, Age, AgeUnit, FrequencyUnit, Intervals};
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;

/// A `[start, end)` address range with its observed access pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub start: u64,
    pub end: u64,
    pub access: AccessFrequency,
    #[serde(default)]
    pub age: Age,
    /// Bytes of this region that passed a downstream filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_passed_bytes: Option<u64>,
}

impl Region {
    pub fn new(start: u64, end: u64, access: AccessFrequency, age: Age) -> Self {
        Self {
            start,
            end,
            access,
            age,
            filter_passed_bytes: None,
        }
    }

    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn intersects(&self, start: u64, end: u64) -> bool {
        self.start < end && start < self.end
    }

    /// Bytes shared with `[start, end)`
    pub fn overlap(&self, start: u64, end: u64) -> u64 {
        self.end.min(end).saturating_sub(self.start.max(start))
    }

    /// Copy of this region covering `[start, end)` with the same metrics
    ///
    /// Filter-passed bytes are scaled to the new size.
    pub(crate) fn slice(&self, start: u64, end: u64) -> Self {
        let size = self.size().max(1) as u128;
        let new_size = end.saturating_sub(start) as u128;
        Self {
            start,
            end,
            access: self.access,
            age: self.age,
            filter_passed_bytes: self
                .filter_passed_bytes
                .map(|passed| (passed as u128 * new_size / size) as u64),
        }
    }

    pub fn convert_units(
        &mut self,
        frequency: FrequencyUnit,
        age: AgeUnit,
        intervals: Option<&Intervals>,
    ) -> Result<()> {
        self.access = self.access.to_unit(frequency, intervals)?;
        self.age = self.age.to_unit(age, intervals)?;
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.start >= self.end {
            return Err(Error::inconsistent(format!(
                "region [{}, {}) has start >= end",
                self.start, self.end
            )));
        }
        if let Some(passed) = self.filter_passed_bytes {
            if passed > self.size() {
                return Err(Error::inconsistent(format!(
                    "region [{}, {}) reports {} filter-passed bytes, more than its size",
                    self.start, self.end, passed
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = match self.access {
            AccessFrequency::Samples(n) => format!("{} samples", n),
            AccessFrequency::Percent(p) => format!("{:.2}%", p),
        };
        let age = match self.age {
            Age::AggrIntervals(n) => format!("{} intervals", n),
            Age::Usecs(us) => format!("{} us", us),
        };
        write!(
            f,
            "[{:#x}, {:#x}) ({} bytes) access {}, age {}",
            self.start,
            self.end,
            self.size(),
            access,
            age
        )
    }
}

/// One point-in-time partition of the monitored address space
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Nanoseconds
    pub start_time: u64,
    /// Nanoseconds
    pub end_time: u64,
    regions: Vec<Region>,
    #[serde(skip)]
    total_bytes: OnceCell<u64>,
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.start_time == other.start_time
            && self.end_time == other.end_time
            && self.regions == other.regions
    }
}

impl Snapshot {
    pub fn new(start_time: u64, end_time: u64, regions: Vec<Region>) -> Self {
        Self {
            start_time,
            end_time,
            regions,
            total_bytes: OnceCell::new(),
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Mutable access to the regions; drops the cached size total
    pub fn regions_mut(&mut self) -> &mut Vec<Region> {
        self.total_bytes.take();
        &mut self.regions
    }

    pub fn set_regions(&mut self, regions: Vec<Region>) {
        self.total_bytes.take();
        self.regions = regions;
    }

    pub fn into_regions(self) -> Vec<Region> {
        self.regions
    }

    /// Sum of region sizes, computed on first use
    pub fn total_bytes(&self) -> u64 {
        *self
            .total_bytes
            .get_or_init(|| self.regions.iter().map(Region::size).sum())
    }

    pub fn duration(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }

    /// Rewrite every region's metrics into a single unit pair
    ///
    /// Address ranges are untouched, so the cached size total survives.
    pub fn convert_units(
        &mut self,
        frequency: FrequencyUnit,
        age: AgeUnit,
        intervals: Option<&Intervals>,
    ) -> Result<()> {
        for region in &mut self.regions {
            region.convert_units(frequency, age, intervals)?;
        }
        Ok(())
    }

    /// Check time span, region bounds, ordering and disjointness
    pub fn validate(&self) -> Result<()> {
        if self.start_time >= self.end_time {
            return Err(Error::inconsistent(format!(
                "snapshot time span [{}, {}) is empty or inverted",
                self.start_time, self.end_time
            )));
        }
        let mut last_end: Option<u64> = None;
        for region in &self.regions {
            region.validate()?;
            if let Some(last_end) = last_end {
                if region.start < last_end {
                    return Err(Error::inconsistent(format!(
                        "region [{}, {}) overlaps or precedes previous region ending at {}",
                        region.start, region.end, last_end
                    )));
                }
            }
            last_end = Some(region.end);
        }
        Ok(())
    }
}

/// Check each region's bounds, without requiring any order between them
pub(crate) fn validate_regions(regions: &[Region]) -> Result<()> {
    regions.iter().try_for_each(Region::validate)
}

/// Check a free-standing snapshot sequence: non-decreasing start times and
/// every snapshot valid on its own
pub(crate) fn validate_snapshots(snapshots: &[Snapshot]) -> Result<()> {
    for (idx, pair) in snapshots.windows(2).enumerate() {
        if pair[1].start_time < pair[0].start_time {
            return Err(Error::inconsistent(format!(
                "snapshot {} starts at {} before previous start {}",
                idx + 1,
                pair[1].start_time,
                pair[0].start_time
            )));
        }
    }
    snapshots.iter().try_for_each(Snapshot::validate)
}

/// Identity of a monitoring record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId {
    pub kdamond: usize,
    pub context: usize,
    /// `None` for plain monitoring results, `Some` for scheme-tried regions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<usize>,
    pub target: u64,
}

impl RecordId {
    pub fn new(kdamond: usize, context: usize, scheme: Option<usize>, target: u64) -> Self {
        Self {
            kdamond,
            context,
            scheme,
            target,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kdamond {} context {}", self.kdamond, self.context)?;
        if let Some(scheme) = self.scheme {
            write!(f, " scheme {}", scheme)?;
        }
        write!(f, " target {}", self.target)
    }
}

/// Time-ordered snapshot stream of one monitoring target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervals: Option<Intervals>,
    pub snapshots: Vec<Snapshot>,
}

impl Record {
    pub fn new(id: RecordId, intervals: Option<Intervals>, snapshots: Vec<Snapshot>) -> Self {
        Self {
            id,
            intervals,
            snapshots,
        }
    }

    /// Check every snapshot and the non-decreasing start time order
    pub fn validate(&self) -> Result<()> {
        let mut last_start = 0;
        for (idx, snapshot) in self.snapshots.iter().enumerate() {
            snapshot.validate().map_err(|e| match e {
                Error::Inconsistent(msg) => {
                    Error::inconsistent(format!("{} snapshot {}: {}", self.id, idx, msg))
                }
                other => other,
            })?;
            if idx > 0 && snapshot.start_time < last_start {
                return Err(Error::inconsistent(format!(
                    "{} snapshot {} starts at {} before previous start {}",
                    self.id, idx, snapshot.start_time, last_start
                )));
            }
            last_start = snapshot.start_time;
        }
        Ok(())
    }

    pub fn is_mergeable(&self, other: &Record) -> bool {
        self.id == other.id && self.intervals == other.intervals
    }

    /// Append `other`'s snapshots and restore start time order
    pub fn merge(&mut self, other: Record) -> Result<()> {
        if !self.is_mergeable(&other) {
            return Err(Error::invalid(format!(
                "cannot merge record '{}' into '{}': identity or intervals differ",
                other.id, self.id
            )));
        }
        self.snapshots.extend(other.snapshots);
        self.snapshots.sort_by_key(|s| s.start_time);
        Ok(())
    }

    /// First start and last end time over all snapshots
    pub fn time_span(&self) -> Option<(u64, u64)> {
        let first = self.snapshots.first()?;
        let end = self.snapshots.iter().map(|s| s.end_time).max()?;
        Some((first.start_time, end))
    }

    pub fn convert_units(&mut self, frequency: FrequencyUnit, age: AgeUnit) -> Result<()> {
        let intervals = self.intervals;
        for snapshot in &mut self.snapshots {
            snapshot.convert_units(frequency, age, intervals.as_ref())?;
        }
        Ok(())
    }
}

/// Fold mergeable records together, keeping first-appearance order
pub fn merge_records(records: Vec<Record>) -> Vec<Record> {
    let mut merged: Vec<Record> = Vec::new();
    let mut index: FnvHashMap<(RecordId, Option<Intervals>), usize> = FnvHashMap::default();

    for record in records {
        let key = (record.id, record.intervals);
        match index.get(&key) {
            Some(&idx) => {
                let target = &mut merged[idx];
                target.snapshots.extend(record.snapshots);
                target.snapshots.sort_by_key(|s| s.start_time);
            }
            None => {
                index.insert(key, merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(start: u64, end: u64, samples: u64) -> Region {
        Region::new(start, end, AccessFrequency::Samples(samples), Age::AggrIntervals(0))
    }

    fn record(target: u64, snapshots: Vec<Snapshot>) -> Record {
        Record::new(
            RecordId::new(0, 0, None, target),
            Some(Intervals::default()),
            snapshots,
        )
    }

    #[test]
    fn test_total_bytes_cached_and_invalidated() {
        let mut snapshot = Snapshot::new(0, 10, vec![region(0, 10, 1), region(20, 50, 0)]);
        assert_eq!(snapshot.total_bytes(), 40);

        snapshot.regions_mut().push(region(50, 60, 3));
        assert_eq!(snapshot.total_bytes(), 50);

        snapshot.set_regions(vec![region(0, 4096, 0)]);
        assert_eq!(snapshot.total_bytes(), 4096);
    }

    #[test]
    fn test_snapshot_validate_overlap() {
        let snapshot = Snapshot::new(0, 10, vec![region(0, 10, 1), region(5, 15, 1)]);
        assert!(matches!(snapshot.validate(), Err(Error::Inconsistent(_))));
    }

    #[test]
    fn test_snapshot_validate_empty_region() {
        let snapshot = Snapshot::new(0, 10, vec![region(10, 10, 1)]);
        assert!(matches!(snapshot.validate(), Err(Error::Inconsistent(_))));
    }

    #[test]
    fn test_snapshot_validate_inverted_time() {
        let snapshot = Snapshot::new(10, 10, vec![region(0, 10, 1)]);
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_record_validate_order() {
        let rec = record(
            1,
            vec![
                Snapshot::new(100, 200, vec![region(0, 10, 1)]),
                Snapshot::new(50, 150, vec![region(0, 10, 1)]),
            ],
        );
        let err = rec.validate().unwrap_err();
        assert!(matches!(err, Error::Inconsistent(_)));
        assert!(err.to_string().contains("snapshot 1"));
    }

    #[test]
    fn test_merge_resorts_snapshots() {
        let mut a = record(1, vec![Snapshot::new(200, 300, vec![region(0, 10, 1)])]);
        let b = record(1, vec![Snapshot::new(100, 200, vec![region(0, 10, 2)])]);

        a.merge(b).unwrap();
        assert_eq!(a.snapshots.len(), 2);
        assert_eq!(a.snapshots[0].start_time, 100);
        assert_eq!(a.time_span(), Some((100, 300)));
    }

    #[test]
    fn test_merge_mismatched_identity() {
        let mut a = record(1, vec![]);
        let b = record(2, vec![]);
        assert!(matches!(a.merge(b), Err(Error::InvalidArgument(_))));

        let mut c = record(1, vec![]);
        c.intervals = None;
        assert!(!a.is_mergeable(&c));
    }

    #[test]
    fn test_merge_records_groups_by_identity() {
        let records = vec![
            record(1, vec![Snapshot::new(100, 200, vec![region(0, 10, 1)])]),
            record(2, vec![Snapshot::new(0, 100, vec![region(0, 10, 1)])]),
            record(1, vec![Snapshot::new(0, 100, vec![region(0, 10, 1)])]),
        ];

        let merged = merge_records(records);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id.target, 1);
        assert_eq!(merged[0].snapshots.len(), 2);
        assert_eq!(merged[0].snapshots[0].start_time, 0);
        assert_eq!(merged[1].id.target, 2);
    }

    #[test]
    fn test_convert_units_keeps_total_bytes() {
        let mut snapshot = Snapshot::new(0, 10, vec![region(0, 100, 10)]);
        assert_eq!(snapshot.total_bytes(), 100);
        snapshot
            .convert_units(
                FrequencyUnit::Percent,
                AgeUnit::Usecs,
                Some(&Intervals::default()),
            )
            .unwrap();
        assert_eq!(snapshot.regions()[0].access, AccessFrequency::Percent(50.0));
        assert_eq!(snapshot.total_bytes(), 100);
    }

    #[test]
    fn test_record_json_roundtrip_shape() {
        let json = r#"{
            "id": {"kdamond": 0, "context": 0, "target": 42},
            "intervals": {"sample": 5000, "aggregate": 100000, "update": 1000000},
            "snapshots": [
                {"start_time": 0, "end_time": 100000000, "regions": [
                    {"start": 4096, "end": 8192, "access": {"samples": 3}, "age": {"aggr_intervals": 2}}
                ]}
            ]
        }"#;
        let rec: Record = serde_json::from_str(json).unwrap();
        assert!(rec.validate().is_ok());
        assert_eq!(rec.id.scheme, None);
        assert_eq!(rec.snapshots[0].total_bytes(), 4096);
    }
}
