// Time x address pixel lattice

use crate::error::{Error, Result};
use serde::Serialize;
use std::ops::Range;

/// One cell of the heat grid
///
/// `heat` is `None` until some region is observed over the cell. An observed
/// but never accessed cell has `Some(0.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pixel {
    /// Start time of the cell (ns)
    pub time: f64,
    /// Start address of the cell
    pub addr: f64,
    pub heat: Option<f64>,
}

impl Pixel {
    pub fn is_void(&self) -> bool {
        self.heat.is_none()
    }

    /// Fold one region's contribution into the cell's heat density
    ///
    /// The contribution `access * overlap_time * overlap_addr` is spread over
    /// the whole cell area, i.e. `new = (old * area + contribution) / area`.
    /// `time_share` and `addr_share` are the overlaps already divided by the
    /// cell's time and address units.
    fn accumulate(&mut self, access: f64, time_share: f64, addr_share: f64) {
        let old = self.heat.unwrap_or(0.0);
        self.heat = Some(old + access * time_share * addr_share);
    }
}

/// Heat density over `time_resolution x addr_resolution` equal cells
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatGrid {
    time_start: u64,
    time_end: u64,
    time_unit: f64,
    time_resolution: usize,
    addr_start: u64,
    addr_end: u64,
    addr_unit: f64,
    addr_resolution: usize,
    /// Indexed `[time][addr]`
    pixels: Vec<Vec<Pixel>>,
}

impl HeatGrid {
    pub(crate) fn new(
        time_range: Range<u64>,
        addr_range: Range<u64>,
        resolution: (usize, usize),
    ) -> Result<Self> {
        let (time_resolution, addr_resolution) = resolution;
        if time_resolution == 0 || addr_resolution == 0 {
            return Err(Error::invalid(format!(
                "heatmap resolution must be positive, got {}x{}",
                time_resolution, addr_resolution
            )));
        }
        if time_range.start >= time_range.end {
            return Err(Error::invalid(format!(
                "heatmap time range [{}, {}) is empty",
                time_range.start, time_range.end
            )));
        }
        if addr_range.start >= addr_range.end {
            return Err(Error::invalid(format!(
                "heatmap address range [{:#x}, {:#x}) is empty",
                addr_range.start, addr_range.end
            )));
        }

        let time_unit = (time_range.end - time_range.start) as f64 / time_resolution as f64;
        let addr_unit = (addr_range.end - addr_range.start) as f64 / addr_resolution as f64;
        let pixels = (0..time_resolution)
            .map(|t| {
                (0..addr_resolution)
                    .map(|a| Pixel {
                        time: time_range.start as f64 + t as f64 * time_unit,
                        addr: addr_range.start as f64 + a as f64 * addr_unit,
                        heat: None,
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            time_start: time_range.start,
            time_end: time_range.end,
            time_unit,
            time_resolution,
            addr_start: addr_range.start,
            addr_end: addr_range.end,
            addr_unit,
            addr_resolution,
            pixels,
        })
    }

    pub fn time_start(&self) -> u64 {
        self.time_start
    }

    pub fn time_unit(&self) -> f64 {
        self.time_unit
    }

    pub fn time_resolution(&self) -> usize {
        self.time_resolution
    }

    pub fn addr_start(&self) -> u64 {
        self.addr_start
    }

    pub fn addr_unit(&self) -> f64 {
        self.addr_unit
    }

    pub fn addr_resolution(&self) -> usize {
        self.addr_resolution
    }

    pub fn time_range(&self) -> Range<u64> {
        self.time_start..self.time_end
    }

    pub fn addr_range(&self) -> Range<u64> {
        self.addr_start..self.addr_end
    }

    pub fn pixel(&self, time_idx: usize, addr_idx: usize) -> Option<&Pixel> {
        self.pixels.get(time_idx)?.get(addr_idx)
    }

    /// Rows of pixels, one per time bucket, oldest first
    pub fn rows(&self) -> impl Iterator<Item = &[Pixel]> {
        self.pixels.iter().map(Vec::as_slice)
    }

    pub fn pixels(&self) -> impl Iterator<Item = &Pixel> {
        self.pixels.iter().flatten()
    }

    /// Lowest and highest heat over non-void pixels
    pub fn heat_range(&self) -> Option<(f64, f64)> {
        self.pixels()
            .filter_map(|p| p.heat)
            .fold(None, |acc, heat| match acc {
                None => Some((heat, heat)),
                Some((lo, hi)) => Some((lo.min(heat), hi.max(heat))),
            })
    }

    pub fn void_count(&self) -> usize {
        self.pixels().filter(|p| p.is_void()).count()
    }

    /// Spread `access` over the cells intersecting a time x address rectangle
    pub(crate) fn paint(&mut self, time: Range<u64>, addr: Range<u64>, access: f64) {
        let time_cells = cell_span(
            time.start,
            time.end,
            self.time_start,
            self.time_end,
            self.time_unit,
            self.time_resolution,
        );
        let addr_cells = cell_span(
            addr.start,
            addr.end,
            self.addr_start,
            self.addr_end,
            self.addr_unit,
            self.addr_resolution,
        );

        for (t, time_share) in time_cells {
            for (a, addr_share) in &addr_cells {
                self.pixels[t][*a].accumulate(access, time_share, *addr_share);
            }
        }
    }
}

/// Cells of one axis overlapped by `[from, to)`, with overlap / unit
fn cell_span(
    from: u64,
    to: u64,
    origin: u64,
    limit: u64,
    unit: f64,
    resolution: usize,
) -> Vec<(usize, f64)> {
    let from = from.max(origin);
    let to = to.min(limit);
    if from >= to {
        return Vec::new();
    }

    let offset_from = (from - origin) as f64;
    let offset_to = (to - origin) as f64;
    let first = ((offset_from / unit).floor() as usize).min(resolution - 1);
    let last = ((offset_to / unit).ceil() as usize).min(resolution);

    (first..last)
        .filter_map(|idx| {
            let cell_from = idx as f64 * unit;
            let cell_to = if idx + 1 == resolution {
                (limit - origin) as f64
            } else {
                (idx + 1) as f64 * unit
            };
            let overlap = offset_to.min(cell_to) - offset_from.max(cell_from);
            if overlap <= 0.0 {
                return None;
            }
            let share = if overlap == unit { 1.0 } else { overlap / unit };
            Some((idx, share))
        })
        .collect()
}
