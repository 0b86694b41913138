//! Disjoint-partition merge of address regions
//!
//! Reconciling an incoming region into an existing partition never rewrites
//! the address range of an existing region. An existing region hit by the
//! incoming one only records a frequency delta (the highest incoming
//! frequency seen over it); the parts of the incoming region that no
//! existing region covers are appended as new regions. The deltas are kept
//! in a [`PendingDeltas`] table so that a caller folding a whole snapshot can
//! apply them once, after every region of that snapshot has been placed.

use crate::record::Region;
use crate::units::AccessFrequency;
use std::collections::BTreeMap;

/// Per-region frequency deltas collected during one reconciliation pass
///
/// Keys are indices into the region list being built. Regions are only ever
/// appended during a pass, so indices stay valid until the deltas are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingDeltas {
    deltas: BTreeMap<usize, f64>,
}

impl PendingDeltas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Highest frequency recorded against region `idx` in this pass
    pub fn get(&self, idx: usize) -> Option<f64> {
        self.deltas.get(&idx).copied()
    }

    fn record(&mut self, idx: usize, value: f64) {
        let entry = self.deltas.entry(idx).or_insert(value);
        if value > *entry {
            *entry = value;
        }
    }

    /// Add each delta on top of its region's frequency (counting semantics)
    pub fn apply_additive(self, regions: &mut [Region]) {
        for (idx, delta) in self.deltas {
            if let Some(region) = regions.get_mut(idx) {
                region.access = with_value(region.access, region.access.raw() + delta);
            }
        }
    }

    /// Raise each region's frequency to at least its delta
    pub fn apply_max(self, regions: &mut [Region]) {
        for (idx, delta) in self.deltas {
            if let Some(region) = regions.get_mut(idx) {
                if delta > region.access.raw() {
                    region.access = with_value(region.access, delta);
                }
            }
        }
    }
}

fn with_value(access: AccessFrequency, value: f64) -> AccessFrequency {
    match access {
        AccessFrequency::Samples(_) => AccessFrequency::Samples(value.round().max(0.0) as u64),
        AccessFrequency::Percent(_) => AccessFrequency::Percent(value),
    }
}

/// Reconcile `incoming` into `existing`, deferring frequency updates
///
/// Takes the partition by value and hands it back extended with the
/// uncovered parts of `incoming`, in append order. Hits on existing regions
/// are recorded in `pending`.
pub fn reconcile_pending(
    mut existing: Vec<Region>,
    incoming: Region,
    pending: &mut PendingDeltas,
) -> Vec<Region> {
    place(&mut existing, incoming, pending);
    existing
}

fn place(regions: &mut Vec<Region>, incoming: Region, pending: &mut PendingDeltas) {
    if incoming.start >= incoming.end {
        return;
    }

    let hit = regions
        .iter()
        .position(|r| r.intersects(incoming.start, incoming.end));
    let Some(idx) = hit else {
        regions.push(incoming);
        return;
    };

    let (hit_start, hit_end) = (regions[idx].start, regions[idx].end);
    pending.record(idx, incoming.access.raw());

    // The remainders may still intersect other existing regions
    if incoming.start < hit_start {
        place(regions, incoming.slice(incoming.start, hit_start), pending);
    }
    if hit_end < incoming.end {
        place(regions, incoming.slice(hit_end, incoming.end), pending);
    }
}

/// Union of `existing` and `incoming` as a sorted disjoint partition
///
/// Existing regions intersected by `incoming` keep the maximum of their own
/// and the incoming frequency. Both inputs are left untouched.
///
/// # Example
/// ```
/// use regionscope::record::Region;
/// use regionscope::region_algebra::reconcile;
/// use regionscope::units::{AccessFrequency, Age};
///
/// let existing = vec![Region::new(0, 10, AccessFrequency::Samples(3), Age::AggrIntervals(0))];
/// let incoming = Region::new(5, 15, AccessFrequency::Samples(7), Age::AggrIntervals(0));
///
/// let merged = reconcile(&existing, &incoming);
/// assert_eq!(merged.len(), 2);
/// assert_eq!((merged[0].start, merged[0].end), (0, 10));
/// assert_eq!(merged[0].access, AccessFrequency::Samples(7));
/// assert_eq!((merged[1].start, merged[1].end), (10, 15));
/// ```
pub fn reconcile(existing: &[Region], incoming: &Region) -> Vec<Region> {
    let mut pending = PendingDeltas::new();
    let mut regions = reconcile_pending(existing.to_vec(), incoming.clone(), &mut pending);
    pending.apply_max(&mut regions);
    regions.sort_by_key(|r| r.start);
    regions
}
