//! regionscope - analysis of memory access monitoring records
//!
//! This library turns snapshots of monitored address-space regions into
//! reports: aggregated and resampled snapshots, size-weighted metric
//! distributions, time x address heat grids and address-space guides.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod distribution;
pub mod error;
pub mod guide;
pub mod heatmap;
pub mod json_output;
pub mod record;
pub mod region_algebra;
pub mod resample;
pub mod text_output;
pub mod units;

pub use error::{Error, Result};
