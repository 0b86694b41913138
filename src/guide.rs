//! Guide information: which address ranges a recording actually observed
//!
//! Monitoring targets usually have huge unmapped holes (between heap and
//! stack, for example) that the monitor never reports. Rendering a heatmap
//! over the full address extent would squeeze the interesting parts into a
//! few pixels, so this module infers the contiguous observed sub-ranges of
//! each record and how hot each one is, to pick sane default extents.

use crate::error::{Error, Result};
use crate::record::{Record, RecordId};
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A contiguous observed address range and its accumulated heat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContigRegion {
    pub start: u64,
    pub end: u64,
    /// Sum of overlapping bytes times access samples over all snapshots
    pub heat: u128,
}

impl ContigRegion {
    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    pub fn range(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// Observed extent, gaps and contiguous regions of one record identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideInfo {
    pub id: RecordId,
    pub start_time: u64,
    pub end_time: u64,
    pub lowest_addr: u64,
    pub highest_addr: u64,
    /// Address spans no snapshot ever covered, sorted by address
    pub gaps: Vec<Range<u64>>,
    /// Sorted by descending size, ties by address
    pub contig_regions: Vec<ContigRegion>,
}

/// Which part of the observed address space a default view should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressRangePolicy {
    /// The biggest contiguous observed region
    #[default]
    Largest,
    /// The contiguous region with the most accumulated heat
    Hottest,
    /// Everything from the lowest to the highest observed address
    All,
}

impl GuideInfo {
    pub fn largest(&self) -> Option<&ContigRegion> {
        self.contig_regions.first()
    }

    /// Hottest contiguous region; the larger one wins a tie
    pub fn hottest(&self) -> Option<&ContigRegion> {
        self.contig_regions
            .iter()
            .reduce(|best, r| if r.heat > best.heat { r } else { best })
    }

    pub fn observed_bytes(&self) -> u64 {
        self.contig_regions.iter().map(ContigRegion::size).sum()
    }

    pub fn address_range(&self, policy: AddressRangePolicy) -> Range<u64> {
        let pick = match policy {
            AddressRangePolicy::Largest => self.largest(),
            AddressRangePolicy::Hottest => self.hottest(),
            AddressRangePolicy::All => None,
        };
        match pick {
            Some(region) => region.range(),
            None => self.lowest_addr..self.highest_addr,
        }
    }
}

impl fmt::Display for GuideInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.id)?;
        writeln!(
            f,
            "  time: {} - {} ({} ns)",
            self.start_time,
            self.end_time,
            self.end_time - self.start_time
        )?;
        writeln!(
            f,
            "  address: {:#x} - {:#x} ({} bytes observed)",
            self.lowest_addr,
            self.highest_addr,
            self.observed_bytes()
        )?;
        for gap in &self.gaps {
            writeln!(f, "  gap: {:#x} - {:#x}", gap.start, gap.end)?;
        }
        for (idx, region) in self.contig_regions.iter().enumerate() {
            writeln!(
                f,
                "  region {}: {:#x} - {:#x} ({} bytes, heat {})",
                idx,
                region.start,
                region.end,
                region.size(),
                region.heat
            )?;
        }
        Ok(())
    }
}

/// Infer guide information per record identity, in first-appearance order
///
/// Records sharing an identity are treated as one stream. Identities whose
/// snapshots contain no region at all have no extent and are omitted.
pub fn infer_guides(records: &[Record]) -> Result<Vec<GuideInfo>> {
    let mut groups: Vec<(RecordId, Vec<&Record>)> = Vec::new();
    let mut index: FnvHashMap<RecordId, usize> = FnvHashMap::default();
    for record in records {
        record.validate()?;
        let idx = *index.entry(record.id).or_insert_with(|| {
            groups.push((record.id, Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(record);
    }

    let mut guides = Vec::with_capacity(groups.len());
    for (id, members) in groups {
        match infer_one(id, &members)? {
            Some(guide) => guides.push(guide),
            None => tracing::debug!(%id, "no regions observed, skipping guide"),
        }
    }
    Ok(guides)
}

fn infer_one(id: RecordId, records: &[&Record]) -> Result<Option<GuideInfo>> {
    let snapshots = || records.iter().flat_map(|r| r.snapshots.iter());

    let mut extent: Option<(u64, u64)> = None;
    for region in snapshots().flat_map(|s| s.regions()) {
        extent = Some(match extent {
            None => (region.start, region.end),
            Some((lo, hi)) => (lo.min(region.start), hi.max(region.end)),
        });
    }
    let Some((lowest_addr, highest_addr)) = extent else {
        return Ok(None);
    };
    let start_time = snapshots().map(|s| s.start_time).min().unwrap_or(0);
    let end_time = snapshots().map(|s| s.end_time).max().unwrap_or(0);

    // A gap persists only if every snapshot leaves it uncovered
    let mut gaps = vec![lowest_addr..highest_addr];
    for snapshot in snapshots() {
        let covered: Vec<Range<u64>> = snapshot.regions().iter().map(|r| r.start..r.end).collect();
        let uncovered = complement(&covered, lowest_addr, highest_addr);
        gaps = intersect(&gaps, &uncovered);
        if gaps.is_empty() {
            break;
        }
    }

    let mut contig_regions: Vec<ContigRegion> = complement(&gaps, lowest_addr, highest_addr)
        .into_iter()
        .map(|r| ContigRegion {
            start: r.start,
            end: r.end,
            heat: 0,
        })
        .collect();

    for record in records {
        let intervals = record.intervals.as_ref();
        for region in record.snapshots.iter().flat_map(|s| s.regions()) {
            let samples = region.access.samples(intervals)?;
            if samples == 0 {
                continue;
            }
            for contig in contig_regions
                .iter_mut()
                .filter(|c| region.intersects(c.start, c.end))
            {
                contig.heat += region.overlap(contig.start, contig.end) as u128 * samples as u128;
            }
        }
    }

    // Stable: equal sizes keep address order
    contig_regions.sort_by(|a, b| b.size().cmp(&a.size()));

    Ok(Some(GuideInfo {
        id,
        start_time,
        end_time,
        lowest_addr,
        highest_addr,
        gaps,
        contig_regions,
    }))
}

/// Spans of `[lo, hi)` not covered by the sorted, disjoint `ranges`
fn complement(ranges: &[Range<u64>], lo: u64, hi: u64) -> Vec<Range<u64>> {
    let mut result = Vec::new();
    let mut cursor = lo;
    for range in ranges {
        if range.start > cursor {
            result.push(cursor..range.start.min(hi));
        }
        cursor = cursor.max(range.end);
        if cursor >= hi {
            break;
        }
    }
    if cursor < hi {
        result.push(cursor..hi);
    }
    result
}

/// Intersection of two sorted, disjoint range lists
fn intersect(a: &[Range<u64>], b: &[Range<u64>]) -> Vec<Range<u64>> {
    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let start = a[i].start.max(b[j].start);
        let end = a[i].end.min(b[j].end);
        if start < end {
            result.push(start..end);
        }
        if a[i].end < b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }
    result
}

/// Default address range across guides, merging per-record picks
///
/// Errors when no guide carries an observed extent.
pub fn default_address_range(
    guides: &[GuideInfo],
    policy: AddressRangePolicy,
) -> Result<Range<u64>> {
    guides
        .iter()
        .map(|g| g.address_range(policy))
        .reduce(|a, b| a.start.min(b.start)..a.end.max(b.end))
        .ok_or_else(|| Error::invalid("no observed regions to derive an address range from"))
}
