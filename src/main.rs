use anyhow::{bail, Context, Result};
use clap::Parser;
use regionscope::cli::{Cli, Command, OutputFormat, SnapshotSelection};
use regionscope::config::ReportConfig;
use regionscope::distribution::{
    footprint_for_bandwidth, histogram, percentiles, PercentileConfig,
};
use regionscope::guide::infer_guides;
use regionscope::json_output::{JsonOutput, JsonReport, JsonRows};
use regionscope::record::{merge_records, Record, RecordId, Region};
use regionscope::units::{AgeUnit, FrequencyUnit};
use regionscope::{csv_output, text_output};
use std::ops::Range;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Decode a JSON array of records and fold duplicates of the same target
fn load_records(path: &Path) -> Result<Vec<Record>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records: Vec<Record> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse records from {}", path.display()))?;

    let loaded = records.len();
    let records = merge_records(records);
    for record in &records {
        record
            .validate()
            .with_context(|| format!("Invalid record in {}", path.display()))?;
    }
    tracing::debug!(loaded, merged = records.len(), "loaded records");
    Ok(records)
}

fn pair<T: Copy>(values: &[T], flag: &str) -> Result<(T, T)> {
    match values {
        [a, b] => Ok((*a, *b)),
        _ => bail!("{} takes exactly two values", flag),
    }
}

fn range(values: &[u64], flag: &str) -> Result<Range<u64>> {
    let (start, end) = pair(values, flag)?;
    Ok(start..end)
}

/// Fold command line flags into the loaded configuration
fn apply_overrides(config: &mut ReportConfig, command: &Command) -> Result<()> {
    match command {
        Command::Aggregate | Command::Guide => {}
        Command::Resample { duration_ns, skip } => {
            if let Some(duration_ns) = duration_ns {
                config.resample.duration_ns = *duration_ns;
            }
            if let Some(skip) = skip {
                config.resample.skip = *skip;
            }
        }
        Command::Percentiles {
            metric, interval, ..
        } => {
            if let Some(metric) = metric {
                config.metric = (*metric).into();
            }
            if let Some(interval) = interval {
                config.percentiles = PercentileConfig::every(*interval);
            }
        }
        Command::Histogram {
            metric,
            buckets,
            granularity,
            log_scale,
            skip_empty,
            ..
        } => {
            if let Some(metric) = metric {
                config.metric = (*metric).into();
            }
            if let Some(buckets) = buckets {
                config.histogram.buckets = *buckets;
            }
            if granularity.is_some() {
                config.histogram.granularity = *granularity;
            }
            config.histogram.log_scale |= *log_scale;
            config.histogram.skip_empty |= *skip_empty;
        }
        Command::Footprint { interval, .. } => {
            if let Some(interval) = interval {
                config.percentiles = PercentileConfig::every(*interval);
            }
        }
        Command::Heatmap {
            time_range,
            address_range,
            resolution,
            filter_passed_only,
            address_policy,
        } => {
            if let Some(values) = time_range {
                config.heatmap.time_range = Some(range(values, "--time-range")?);
            }
            if let Some(values) = address_range {
                config.heatmap.address_range = Some(range(values, "--address-range")?);
            }
            if let Some(values) = resolution {
                let (time, addr) = pair(values, "--resolution")?;
                config.heatmap.time_resolution = time;
                config.heatmap.address_resolution = addr;
            }
            if let Some(policy) = address_policy {
                config.heatmap.address_policy = (*policy).into();
            }
            config.heatmap.filter_passed_only |= *filter_passed_only;
        }
    }
    config.validate()
}

/// Regions a distribution report of `record` reads
///
/// Units are normalized to sample counts and aggregation intervals first, so
/// metrics compare across records. Without an explicit snapshot index every
/// snapshot is aggregated into one.
fn selected_regions(record: &Record, selection: SnapshotSelection) -> Result<Vec<Region>> {
    let mut record = record.clone();
    record
        .convert_units(FrequencyUnit::Samples, AgeUnit::AggrIntervals)
        .with_context(|| format!("Cannot normalize units of {}", record.id))?;

    let snapshot = match selection.snapshot {
        None => record
            .aggregate()
            .with_context(|| format!("Cannot aggregate {}", record.id))?
            .snapshots
            .pop(),
        Some(idx) => {
            let count = record.snapshots.len() as i64;
            let resolved = if idx < 0 { count + idx } else { idx };
            if resolved < 0 || resolved >= count {
                bail!(
                    "{} has {} snapshots, index {} is out of range",
                    record.id,
                    count,
                    idx
                );
            }
            Some(record.snapshots.swap_remove(resolved as usize))
        }
    };

    snapshot
        .map(|s| s.into_regions())
        .with_context(|| format!("{} has no snapshots", record.id))
}

fn per_record<T, F>(
    records: &[Record],
    selection: SnapshotSelection,
    report: F,
) -> Result<Vec<(RecordId, Vec<T>)>>
where
    F: Fn(&[Region]) -> regionscope::Result<Vec<T>>,
{
    records
        .iter()
        .map(|record| {
            let regions = selected_regions(record, selection)?;
            let rows = report(regions.as_slice())
                .with_context(|| format!("Report failed for {}", record.id))?;
            Ok((record.id, rows))
        })
        .collect()
}

fn json_rows<T>(rows: Vec<(RecordId, Vec<T>)>) -> Vec<JsonRows<T>> {
    rows.into_iter()
        .map(|(id, rows)| JsonRows { id, rows })
        .collect()
}

fn render_records(records: Vec<Record>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text_output::records_text(&records)),
        OutputFormat::Json => JsonOutput::new(JsonReport::Records { records }).to_json(),
        OutputFormat::Csv => bail!("CSV output is not available for snapshot reports"),
    }
}

/// Execute one report command
fn run(
    command: &Command,
    config: &ReportConfig,
    records: &[Record],
    format: OutputFormat,
) -> Result<String> {
    match command {
        Command::Aggregate => {
            let aggregated = records
                .iter()
                .map(|r| r.aggregate().with_context(|| format!("Cannot aggregate {}", r.id)))
                .collect::<Result<Vec<_>>>()?;
            render_records(aggregated, format)
        }
        Command::Resample { .. } => {
            let resampled = records
                .iter()
                .map(|r| {
                    r.resample(config.resample.duration_ns, config.resample.skip)
                        .with_context(|| format!("Cannot resample {}", r.id))
                })
                .collect::<Result<Vec<_>>>()?;
            render_records(resampled, format)
        }
        Command::Percentiles { selection, .. } => {
            let metric = config.metric;
            let rows = per_record(records, *selection, |regions| {
                percentiles(regions, |r| metric.evaluate(r, None), &config.percentiles)
            })?;
            Ok(match format {
                OutputFormat::Text => text_output::percentiles_text(metric, &rows),
                OutputFormat::Csv => csv_output::percentiles_csv(&rows),
                OutputFormat::Json => JsonOutput::new(JsonReport::Percentiles {
                    metric,
                    records: json_rows(rows),
                })
                .to_json()?,
            })
        }
        Command::Histogram { selection, .. } => {
            let metric = config.metric;
            let rows = per_record(records, *selection, |regions| {
                histogram(regions, |r| metric.evaluate(r, None), &config.histogram)
            })?;
            Ok(match format {
                OutputFormat::Text => text_output::histogram_text(metric, &rows),
                OutputFormat::Csv => csv_output::histogram_csv(&rows),
                OutputFormat::Json => JsonOutput::new(JsonReport::Histogram {
                    metric,
                    records: json_rows(rows),
                })
                .to_json()?,
            })
        }
        Command::Footprint { selection, .. } => {
            let rows = per_record(records, *selection, |regions| {
                footprint_for_bandwidth(regions, None, &config.percentiles)
            })?;
            Ok(match format {
                OutputFormat::Text => text_output::footprint_text(&rows),
                OutputFormat::Csv => csv_output::footprint_csv(&rows),
                OutputFormat::Json => JsonOutput::new(JsonReport::Footprint {
                    records: json_rows(rows),
                })
                .to_json()?,
            })
        }
        Command::Heatmap { .. } => {
            let grid = config
                .heatmap
                .build(records)
                .context("Failed to build heatmap")?;
            Ok(match format {
                OutputFormat::Text => text_output::heatmap_text(&grid),
                OutputFormat::Csv => csv_output::heatmap_csv(&grid),
                OutputFormat::Json => JsonOutput::new(JsonReport::Heatmap { grid }).to_json()?,
            })
        }
        Command::Guide => {
            let guides = infer_guides(records).context("Failed to infer guides")?;
            Ok(match format {
                OutputFormat::Text => text_output::guide_text(&guides),
                OutputFormat::Csv => csv_output::guide_csv(&guides),
                OutputFormat::Json => JsonOutput::new(JsonReport::Guide { guides }).to_json()?,
            })
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::default(),
    };
    apply_overrides(&mut config, &cli.command)?;

    let input = cli
        .input
        .as_deref()
        .context("No input records given, use --input FILE")?;
    let records = load_records(input)?;

    let output = run(&cli.command, &config, &records, cli.format)?;
    match cli.format {
        OutputFormat::Json => println!("{}", output),
        OutputFormat::Text | OutputFormat::Csv => print!("{}", output),
    }
    Ok(())
}
