//! Regroup a snapshot stream into fixed-duration buckets
//!
//! Consecutive snapshots are collected until the group spans at least the
//! target duration, then aggregated into one snapshot. The first snapshots
//! of a recording are often unrepresentative (the monitor is still adapting
//! its regions), so a number of them can be discarded up front.

use crate::aggregate::aggregate_snapshots;
use crate::error::{Error, Result};
use crate::record::{validate_snapshots, Record, Snapshot};
use crate::units::Intervals;

/// Resample `snapshots` into groups spanning at least `target_duration_ns`
///
/// The first `skip` snapshots are dropped. A trailing group that never
/// reaches the target duration is dropped as well, so the output is lossy
/// at the tail.
pub fn resample(
    snapshots: &[Snapshot],
    target_duration_ns: u64,
    skip: usize,
    intervals: Option<&Intervals>,
) -> Result<Vec<Snapshot>> {
    if target_duration_ns == 0 {
        return Err(Error::invalid("resample duration must be positive"));
    }
    validate_snapshots(snapshots)?;

    let mut resampled = Vec::new();
    let mut group_start = skip.min(snapshots.len());

    for idx in group_start..snapshots.len() {
        let span = snapshots[idx]
            .end_time
            .saturating_sub(snapshots[group_start].start_time);
        if span >= target_duration_ns {
            resampled.push(aggregate_snapshots(
                &snapshots[group_start..=idx],
                intervals,
            )?);
            group_start = idx + 1;
        }
    }

    if group_start < snapshots.len() {
        tracing::debug!(
            dropped = snapshots.len() - group_start,
            target_duration_ns,
            "dropping trailing snapshots shorter than the resample duration"
        );
    }

    Ok(resampled)
}

impl Record {
    /// This record with its snapshots resampled to `target_duration_ns`
    pub fn resample(&self, target_duration_ns: u64, skip: usize) -> Result<Record> {
        let snapshots = resample(
            &self.snapshots,
            target_duration_ns,
            skip,
            self.intervals.as_ref(),
        )?;
        Ok(Record::new(self.id, self.intervals, snapshots))
    }
}
