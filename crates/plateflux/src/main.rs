use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use plateflux_core::config::{LayoutChoice, RunConfig, TriggerSettings};
use plateflux_core::outputs::{default_output_path, write_records, OutputFormat};
use plateflux_core::summary::summarize;
use plateflux_core::swap::{normalize_label, SwapEvent, TriggerComparison, TriggerUnit};
use plateflux_core::{process_plate, ConditionsKey};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod hooks;
mod report;

/// Converts plate reader fluorescence exports into a flat, swap-adjusted table.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Plate reader export: comma separated grid or `key: value` log
    plate_data: PathBuf,

    /// Conditions key: header row, then `row,sample1,sample2,...`
    conditions_key: PathBuf,

    /// Seconds between cycles (grid exports only) [default: 4]
    #[arg(short, long)]
    sampling_interval: Option<i64>,

    /// Export layout; detected from the file when not given
    #[arg(long, value_enum)]
    format: Option<LayoutArg>,

    /// Plate swap as TRIGGER,DURATION,LABEL (repeatable, in trigger order).
    /// Underscores in the label become spaces.
    #[arg(long = "swap", value_name = "TRIGGER,DURATION,LABEL", value_parser = parse_swap)]
    swaps: Vec<SwapEvent>,

    /// What a swap trigger counts; defaults depend on the layout
    #[arg(long, value_enum)]
    trigger_unit: Option<TriggerUnitArg>,

    /// Whether a swap applies at its trigger or only after it
    #[arg(long, value_enum)]
    trigger_comparison: Option<TriggerComparisonArg>,

    /// TOML run configuration; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file [default: processed_<plate_data>]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format; inferred from the output extension when not given
    #[arg(long, value_enum)]
    output_format: Option<OutputFormatArg>,

    /// Field delimiter of the conditions key
    #[arg(long, default_value_t = ',')]
    key_delimiter: char,

    /// Program started after the output is written, with the output path appended
    #[arg(long, value_name = "COMMAND")]
    plot_command: Option<String>,

    /// Print a per plate-state summary table
    #[arg(long)]
    summary: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    Auto,
    Grid,
    Log,
}

impl From<LayoutArg> for LayoutChoice {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Auto => LayoutChoice::Auto,
            LayoutArg::Grid => LayoutChoice::Grid,
            LayoutArg::Log => LayoutChoice::Log,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TriggerUnitArg {
    Cycle,
    Seconds,
}

impl From<TriggerUnitArg> for TriggerUnit {
    fn from(value: TriggerUnitArg) -> Self {
        match value {
            TriggerUnitArg::Cycle => TriggerUnit::Cycle,
            TriggerUnitArg::Seconds => TriggerUnit::Seconds,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TriggerComparisonArg {
    AtOrAfter,
    After,
}

impl From<TriggerComparisonArg> for TriggerComparison {
    fn from(value: TriggerComparisonArg) -> Self {
        match value {
            TriggerComparisonArg::AtOrAfter => TriggerComparison::AtOrAfter,
            TriggerComparisonArg::After => TriggerComparison::After,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Csv,
    Parquet,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(value: OutputFormatArg) -> Self {
        match value {
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Parquet => OutputFormat::Parquet,
        }
    }
}

fn parse_swap(value: &str) -> Result<SwapEvent, String> {
    normalize_label(value)
        .parse::<SwapEvent>()
        .map_err(|err| err.to_string())
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig> {
        let file_config = match &self.config {
            Some(path) => RunConfig::read_config_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => RunConfig::default(),
        };

        let flags = RunConfig {
            sampling_interval_s: self.sampling_interval,
            layout: self.format.map(LayoutChoice::from).unwrap_or_default(),
            trigger: TriggerSettings {
                unit: self.trigger_unit.map(TriggerUnit::from),
                comparison: self.trigger_comparison.map(TriggerComparison::from),
            },
            swaps: self.swaps.clone(),
        };

        let mut config = file_config.merge(flags);
        if matches!(self.format, Some(LayoutArg::Auto)) {
            config.layout = LayoutChoice::Auto;
        }
        config.validate()?;
        Ok(config)
    }

    fn output_target(&self) -> (PathBuf, OutputFormat) {
        let format = self
            .output_format
            .map(OutputFormat::from)
            .or_else(|| self.output.as_deref().and_then(OutputFormat::from_path))
            .unwrap_or_default();
        let path = self
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.plate_data, format));
        (path, format)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    }

    let config = cli.run_config()?;

    if !cli.key_delimiter.is_ascii() {
        bail!("key delimiter '{}' must be a single ASCII character", cli.key_delimiter);
    }
    let key = ConditionsKey::from_path(&cli.conditions_key, cli.key_delimiter as u8)
        .with_context(|| format!("failed to load conditions key {}", cli.conditions_key.display()))?;

    let content = std::fs::read_to_string(&cli.plate_data)
        .with_context(|| format!("failed to read plate data {}", cli.plate_data.display()))?;
    let processed = process_plate(&content, &key, &config)
        .with_context(|| format!("failed to process {}", cli.plate_data.display()))?;

    let (output_path, format) = cli.output_target();
    write_records(&output_path, format, &processed.records)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    info!(
        input = %cli.plate_data.display(),
        output = %output_path.display(),
        records = processed.records.len(),
        unread = processed.unread_count,
        "Plate processed"
    );

    if cli.summary {
        let summaries = summarize(&processed.records);
        println!("{}", report::summary_table(&processed, &summaries));
    }

    if let Some(command) = cli.plot_command.as_deref() {
        hooks::spawn_plot_hook(command, &output_path);
    }

    Ok(())
}
