use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest plate the row lettering can describe (A through Z).
pub const MAX_PLATE_ROWS: usize = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlateLayout {
    /// Comma separated grid, one line per plate row, blank line between cycles.
    DenseGrid,
    /// `key: value` log with explicit `Cycle` and `Time [s]` markers.
    KeyValueLog,
}

impl PlateLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlateLayout::DenseGrid => "grid",
            PlateLayout::KeyValueLog => "log",
        }
    }
}

impl fmt::Display for PlateLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PlateLayout {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grid" | "dense" | "dense_grid" => Ok(PlateLayout::DenseGrid),
            "log" | "kv" | "key_value" | "key_value_log" => Ok(PlateLayout::KeyValueLog),
            other => Err(format!("unknown plate layout '{other}'")),
        }
    }
}

/// Plate row letter, always upper case A-Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "char")]
pub struct WellRow(char);

impl WellRow {
    pub fn new(ch: char) -> Result<Self, String> {
        let upper = ch.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Ok(Self(upper))
        } else {
            Err(format!("invalid plate row '{ch}'"))
        }
    }

    /// Row for the zero-based position within a cycle (0 -> A).
    pub fn from_index(index: usize) -> Result<Self, String> {
        if index >= MAX_PLATE_ROWS {
            return Err(format!(
                "plate has more than {MAX_PLATE_ROWS} rows (row {})",
                index + 1
            ));
        }
        Ok(Self((b'A' + index as u8) as char))
    }

    pub fn as_char(&self) -> char {
        self.0
    }
}

impl fmt::Display for WellRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<char> for WellRow {
    type Error = String;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        WellRow::new(value)
    }
}

impl TryFrom<&str> for WellRow {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let mut chars = trimmed.chars();
        let ch = chars
            .next()
            .ok_or_else(|| "missing plate row letter".to_string())?;
        if chars.next().is_some() {
            return Err(format!(
                "plate row must be a single letter, got '{trimmed}'"
            ));
        }
        WellRow::new(ch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WellAddress {
    pub row: WellRow,
    /// 1-based.
    pub column: u32,
}

impl WellAddress {
    pub fn new(row: WellRow, column: u32) -> Result<Self, String> {
        if column == 0 {
            return Err(format!("well {row}00 has no column; columns start at 1"));
        }
        Ok(Self { row, column })
    }

    /// Parses a log-style well key: one upper case letter followed by exactly two digits.
    /// Returns `Ok(None)` when the key is not shaped like a well address at all.
    pub fn parse_log_key(key: &str) -> Result<Option<Self>, String> {
        let bytes = key.as_bytes();
        if bytes.len() != 3
            || !bytes[0].is_ascii_uppercase()
            || !bytes[1].is_ascii_digit()
            || !bytes[2].is_ascii_digit()
        {
            return Ok(None);
        }
        let row = WellRow::new(bytes[0] as char)?;
        let column = u32::from(bytes[1] - b'0') * 10 + u32::from(bytes[2] - b'0');
        WellAddress::new(row, column).map(Some)
    }
}

impl fmt::Display for WellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.column)
    }
}

/// A single well reading as reported by the instrument. Unread wells never become one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub cycle_index: u32,
    /// Instrument-reported seconds since start. Grid exports report none and carry 0.
    pub elapsed_time_s: i64,
    pub well: WellAddress,
    pub fluorescence: f64,
}

impl RawObservation {
    pub fn row(&self) -> WellRow {
        self.well.row
    }

    pub fn column(&self) -> u32 {
        self.well.column
    }
}

#[derive(Debug, Clone)]
pub struct ParsedPlate {
    pub layout: PlateLayout,
    pub observations: Vec<RawObservation>,
    /// Well readings skipped because the instrument marked them unread.
    pub unread_count: usize,
}

impl ParsedPlate {
    /// Number of cycles seen, counting from the highest cycle index observed.
    pub fn cycle_count(&self) -> usize {
        self.observations
            .iter()
            .map(|obs| obs.cycle_index as usize + 1)
            .max()
            .unwrap_or(0)
    }
}
