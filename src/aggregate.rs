//! Collapse a group of snapshots into one synthetic snapshot
//!
//! Every region of every snapshot is reconciled into a growing partition.
//! After each snapshot the highest frequency it showed over a pre-existing
//! region is added to that region's sample count: the merged window saw the
//! region accessed at least that much more. Parts of a snapshot not yet
//! covered enter the partition with their own frequency.

use crate::error::{Error, Result};
use crate::record::{validate_snapshots, Record, Region, Snapshot};
use crate::region_algebra::{reconcile_pending, PendingDeltas};
use crate::units::{AccessFrequency, Intervals};

/// Aggregate `snapshots` (oldest first) into a single snapshot
///
/// Frequencies are folded as sample counts; percent-valued regions need
/// `intervals` for the conversion. The result spans from the first
/// snapshot's start to the last snapshot's end and its regions are sorted
/// by address. Snapshots out of start time order, or holding invalid
/// regions, are [`Error::Inconsistent`].
///
/// Note that each delta is applied to the region's value as it stood before
/// the contributing snapshot, so with three or more partially overlapping
/// snapshots a region can end up counted differently than a per-address
/// running maximum would give.
///
/// # Example
/// ```
/// use regionscope::aggregate::aggregate_snapshots;
/// use regionscope::record::{Region, Snapshot};
/// use regionscope::units::{AccessFrequency, Age};
///
/// let snapshots = vec![
///     Snapshot::new(0, 100, vec![Region::new(0, 50, AccessFrequency::Samples(2), Age::AggrIntervals(0))]),
///     Snapshot::new(100, 200, vec![Region::new(0, 50, AccessFrequency::Samples(5), Age::AggrIntervals(0))]),
/// ];
///
/// let merged = aggregate_snapshots(&snapshots, None).unwrap();
/// assert_eq!(merged.regions().len(), 1);
/// assert_eq!(merged.total_bytes(), 50);
/// assert_eq!((merged.start_time, merged.end_time), (0, 200));
/// ```
pub fn aggregate_snapshots(
    snapshots: &[Snapshot],
    intervals: Option<&Intervals>,
) -> Result<Snapshot> {
    let (Some(first), Some(last)) = (snapshots.first(), snapshots.last()) else {
        return Err(Error::invalid("cannot aggregate an empty snapshot list"));
    };
    validate_snapshots(snapshots)?;

    let mut regions: Vec<Region> = Vec::new();
    for snapshot in snapshots {
        let mut pending = PendingDeltas::new();
        for region in snapshot.regions() {
            let mut incoming = region.clone();
            incoming.access = AccessFrequency::Samples(region.access.samples(intervals)?);
            regions = reconcile_pending(regions, incoming, &mut pending);
        }
        pending.apply_additive(&mut regions);
    }

    regions.sort_by_key(|r| r.start);
    tracing::trace!(
        snapshots = snapshots.len(),
        regions = regions.len(),
        "aggregated snapshot group"
    );

    Ok(Snapshot::new(first.start_time, last.end_time, regions))
}

impl Record {
    /// This record with all of its snapshots collapsed into one
    pub fn aggregate(&self) -> Result<Record> {
        self.validate()?;
        let snapshot = aggregate_snapshots(&self.snapshots, self.intervals.as_ref())?;
        Ok(Record::new(self.id, self.intervals, vec![snapshot]))
    }
}
