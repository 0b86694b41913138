// Time x address heat grid
//
// Regions from every snapshot are projected onto a regular lattice of time
// and address buckets. A region usually covers only part of a pixel, in time
// or in space, so each contribution is weighted by the overlapped area and
// folded into the pixel as a density: the heat of a pixel is the average
// access frequency observed over its full area.

mod builder;
mod grid;

pub use builder::{build_heatmap, HeatmapConfig};
pub use grid::{HeatGrid, Pixel};
