use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::{ReaderBuilder, Trim};
use plateflux_parser::{WellAddress, WellRow};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConditionsError {
    #[error("conditions key {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("failed to read conditions key: {0}")]
    Io(#[from] std::io::Error),
    #[error("conditions key CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("conditions key record {record} invalid: {message}")]
    InvalidRow { record: usize, message: String },
    #[error("conditions key lists row {row} more than once (record {record})")]
    DuplicateRow { row: WellRow, record: usize },
    #[error("conditions key has no rows after the header")]
    Empty,
}

/// Maps every well to the sample or treatment loaded into it.
///
/// Source table: a header row (ignored), then one row per plate row,
/// `rowLetter, sample1, sample2, ...`. Column `n` of the plate is sample `n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionsKey {
    rows: BTreeMap<WellRow, Vec<Option<Arc<str>>>>,
}

impl ConditionsKey {
    pub fn from_path(path: &Path, delimiter: u8) -> Result<Self, ConditionsError> {
        if !path.exists() {
            return Err(ConditionsError::BadFilePath(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Self::from_reader(file, delimiter)
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, ConditionsError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(delimiter)
            .from_reader(reader);

        let mut key = ConditionsKey::default();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            // record 1 is the header
            let record_no = idx + 2;
            if record.iter().all(str::is_empty) {
                continue;
            }

            let letter = record.get(0).unwrap_or_default();
            let row = WellRow::try_from(letter).map_err(|message| ConditionsError::InvalidRow {
                record: record_no,
                message,
            })?;
            let samples = record.iter().skip(1).map(str::to_string).collect();
            if !key.insert_row(row, samples) {
                return Err(ConditionsError::DuplicateRow {
                    row,
                    record: record_no,
                });
            }
        }

        if key.rows.is_empty() {
            return Err(ConditionsError::Empty);
        }

        debug!(
            rows = key.row_count(),
            wells = key.well_count(),
            "Loaded conditions key"
        );
        Ok(key)
    }

    /// Adds a plate row. Returns `false` (leaving the key unchanged) if the row already exists.
    /// Empty sample names leave that well without a condition.
    pub fn insert_row(&mut self, row: WellRow, samples: Vec<String>) -> bool {
        if self.rows.contains_key(&row) {
            return false;
        }
        let samples = samples
            .into_iter()
            .map(|sample| {
                let trimmed = sample.trim();
                (!trimmed.is_empty()).then(|| Arc::from(trimmed))
            })
            .collect();
        self.rows.insert(row, samples);
        true
    }

    pub fn get(&self, well: &WellAddress) -> Option<&Arc<str>> {
        let idx = usize::try_from(well.column).ok()?.checked_sub(1)?;
        self.rows.get(&well.row)?.get(idx)?.as_ref()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Wells that resolve to a condition.
    pub fn well_count(&self) -> usize {
        self.rows
            .values()
            .map(|samples| samples.iter().filter(|s| s.is_some()).count())
            .sum()
    }
}

impl FromIterator<(WellRow, Vec<String>)> for ConditionsKey {
    /// Later duplicates of a row are ignored.
    fn from_iter<I: IntoIterator<Item = (WellRow, Vec<String>)>>(iter: I) -> Self {
        let mut key = ConditionsKey::default();
        for (row, samples) in iter {
            key.insert_row(row, samples);
        }
        key
    }
}
