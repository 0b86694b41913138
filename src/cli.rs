//! CLI argument parsing for regionscope

use crate::distribution::RegionMetric;
use crate::guide::AddressRangePolicy;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

/// Per-region metric for distribution reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricArg {
    IdleTime,
    Bandwidth,
    AccessFrequency,
    Age,
    Size,
}

impl From<MetricArg> for RegionMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::IdleTime => RegionMetric::IdleTime,
            MetricArg::Bandwidth => RegionMetric::Bandwidth,
            MetricArg::AccessFrequency => RegionMetric::AccessFrequency,
            MetricArg::Age => RegionMetric::Age,
            MetricArg::Size => RegionMetric::Size,
        }
    }
}

/// Default heatmap address range selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Largest contiguous observed region
    Largest,
    /// Contiguous region with the most accesses
    Hottest,
    /// Lowest to highest observed address
    All,
}

impl From<PolicyArg> for AddressRangePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Largest => AddressRangePolicy::Largest,
            PolicyArg::Hottest => AddressRangePolicy::Hottest,
            PolicyArg::All => AddressRangePolicy::All,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "regionscope")]
#[command(version)]
#[command(about = "Analyze memory access monitoring records", long_about = None)]
pub struct Cli {
    /// Monitoring records, a JSON array
    #[arg(short, long, value_name = "FILE", global = true)]
    pub input: Option<PathBuf>,

    /// Report configuration (TOML); flags override its values
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fold every snapshot of each record into one
    Aggregate,

    /// Group consecutive snapshots into buckets of a minimum duration
    Resample {
        /// Minimum duration of each output snapshot (ns)
        #[arg(long = "duration-ns", value_name = "NS")]
        duration_ns: Option<u64>,

        /// Snapshots to discard before grouping
        #[arg(long, value_name = "N")]
        skip: Option<usize>,
    },

    /// Size-weighted percentiles of a region metric
    Percentiles {
        #[arg(long, value_enum)]
        metric: Option<MetricArg>,

        /// Report every N percent instead of the default breakpoints
        #[arg(long, value_name = "PERCENT")]
        interval: Option<f64>,

        #[command(flatten)]
        selection: SnapshotSelection,
    },

    /// Share of bytes per metric value bucket
    Histogram {
        #[arg(long, value_enum)]
        metric: Option<MetricArg>,

        #[arg(long, value_name = "N")]
        buckets: Option<usize>,

        /// Fixed bucket width, overrides --buckets
        #[arg(long, value_name = "WIDTH")]
        granularity: Option<f64>,

        /// Logarithmic bucket widths
        #[arg(long = "log-scale")]
        log_scale: bool,

        /// Omit buckets holding no bytes
        #[arg(long = "skip-empty")]
        skip_empty: bool,

        #[command(flatten)]
        selection: SnapshotSelection,
    },

    /// Smallest memory footprint serving each share of the bandwidth
    Footprint {
        #[arg(long, value_name = "PERCENT")]
        interval: Option<f64>,

        #[command(flatten)]
        selection: SnapshotSelection,
    },

    /// Time x address access heat grid
    Heatmap {
        #[arg(long = "time-range", num_args = 2, value_names = ["START", "END"])]
        time_range: Option<Vec<u64>>,

        #[arg(long = "address-range", num_args = 2, value_names = ["START", "END"])]
        address_range: Option<Vec<u64>>,

        /// Time and address resolution
        #[arg(long, num_args = 2, value_names = ["TIME", "ADDR"])]
        resolution: Option<Vec<usize>>,

        /// Render only accesses to bytes that passed the record's filters
        #[arg(long = "filter-passed-only")]
        filter_passed_only: bool,

        /// Default address range when --address-range is not given
        #[arg(long = "address-policy", value_enum)]
        address_policy: Option<PolicyArg>,
    },

    /// Observed time span, address gaps and contiguous regions per record
    Guide,
}

/// Which snapshot of each record a distribution report reads
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct SnapshotSelection {
    /// Snapshot index; negative counts from the end. Default: aggregate all
    #[arg(long, value_name = "IDX", allow_negative_numbers = true)]
    pub snapshot: Option<i64>,
}
