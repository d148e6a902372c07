use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::timeline::LabeledRecord;

/// Output column order.
pub const OUTPUT_COLUMNS: [&str; 6] = ["Time", "Plate", "Row", "Column", "Condition", "Fluorescence"];

/// Prefix the processed file name gets when no output path is given.
pub const OUTPUT_PREFIX: &str = "processed_";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Polars operation failed: {0}")]
    Polars(#[from] PolarsError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }

    /// Guesses the format from a file extension; anything unrecognised is `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(OutputFormat::Csv),
            "parquet" | "pq" => Some(OutputFormat::Parquet),
            _ => None,
        }
    }
}

/// `processed_<input file name>` in the current directory. Parquet output swaps the
/// extension for `.parquet`.
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plate".to_string());
    let path = PathBuf::from(format!("{OUTPUT_PREFIX}{name}"));
    match format {
        OutputFormat::Csv => path,
        OutputFormat::Parquet => path.with_extension(format.extension()),
    }
}

pub fn write_csv<W: Write>(writer: W, records: &[LabeledRecord]) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_writer(writer);
    if records.is_empty() {
        writer.write_record(OUTPUT_COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn records_to_dataframe(records: &[LabeledRecord]) -> Result<DataFrame, OutputError> {
    let times: Vec<i64> = records.iter().map(|r| r.adjusted_time_s).collect();
    let plates: Vec<&str> = records.iter().map(|r| r.plate_label.as_ref()).collect();
    let rows: Vec<String> = records.iter().map(|r| r.row.to_string()).collect();
    let columns: Vec<i64> = records.iter().map(|r| i64::from(r.column)).collect();
    let conditions: Vec<&str> = records.iter().map(|r| r.condition.as_ref()).collect();
    let fluorescence: Vec<f64> = records.iter().map(|r| r.fluorescence).collect();

    let cols: Vec<Column> = vec![
        Series::new(OUTPUT_COLUMNS[0].into(), times).into(),
        Series::new(OUTPUT_COLUMNS[1].into(), plates).into(),
        Series::new(OUTPUT_COLUMNS[2].into(), rows).into(),
        Series::new(OUTPUT_COLUMNS[3].into(), columns).into(),
        Series::new(OUTPUT_COLUMNS[4].into(), conditions).into(),
        Series::new(OUTPUT_COLUMNS[5].into(), fluorescence).into(),
    ];
    Ok(DataFrame::new(cols)?)
}

pub fn write_parquet<W: Write>(writer: W, records: &[LabeledRecord]) -> Result<(), OutputError> {
    let mut df = records_to_dataframe(records)?;
    ParquetWriter::new(writer).finish(&mut df)?;
    Ok(())
}

/// Stages the content in a temporary file next to `path` and renames it over `path`
/// only once `write` succeeds. On failure the staged file is removed and `path` is
/// left untouched.
fn replace_file<F>(path: &Path, write: F) -> Result<(), OutputError>
where
    F: FnOnce(&mut (dyn Write + Send)) -> Result<(), OutputError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Writes every record to `path`, replacing any existing file.
pub fn write_records(
    path: &Path,
    format: OutputFormat,
    records: &[LabeledRecord],
) -> Result<(), OutputError> {
    replace_file(path, |writer| match format {
        OutputFormat::Csv => write_csv(writer, records),
        OutputFormat::Parquet => write_parquet(writer, records),
    })?;
    info!(
        path = %path.display(),
        format = format.extension(),
        rows = records.len(),
        "Wrote processed plate"
    );
    Ok(())
}
