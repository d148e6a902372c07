use crate::errors::ParserError;
use crate::model::{ParsedPlate, PlateLayout, RawObservation, WellAddress};
use crate::registry::PlateParser;

use super::{numbered_lines, parse_reading, parse_required_i64, parse_required_u32};

pub const TIME_KEY: &str = "Time [s]";
pub const CYCLE_KEY: &str = "Cycle";

/// What a single `key: value` line means to the scan.
#[derive(Debug, Clone, PartialEq)]
enum LogEntry<'a> {
    Well { well: WellAddress, value: &'a str },
    Time(&'a str),
    Cycle(&'a str),
    Ignored,
}

impl<'a> LogEntry<'a> {
    fn classify(
        parser: &'static str,
        line: &'a str,
        line_index: usize,
    ) -> Result<Self, ParserError> {
        let Some((key, value)) = line.split_once(':') else {
            return Ok(LogEntry::Ignored);
        };
        let key = key.trim();
        let value = value.trim();

        if key == TIME_KEY {
            return Ok(LogEntry::Time(value));
        }
        if key == CYCLE_KEY {
            return Ok(LogEntry::Cycle(value));
        }

        match WellAddress::parse_log_key(key) {
            Ok(Some(well)) => Ok(LogEntry::Well { well, value }),
            Ok(None) => Ok(LogEntry::Ignored),
            Err(message) => Err(ParserError::DataRow {
                parser,
                line_index,
                message,
            }),
        }
    }
}

/// Most recent `Cycle` and `Time [s]` values; inherited by every reading that follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LogCursor {
    cycle_index: u32,
    elapsed_time_s: i64,
}

#[derive(Default)]
struct LogScan {
    cursor: LogCursor,
    observations: Vec<RawObservation>,
    unread_count: usize,
}

/// Parser for the colon delimited instrument log.
pub struct KeyValueLogParser;

impl Default for KeyValueLogParser {
    fn default() -> Self {
        Self
    }
}

impl KeyValueLogParser {
    const NAME: &'static str = "KEY_VALUE_LOG";

    fn detect(content: &str) -> Result<(), ParserError> {
        let has_well_line = content.lines().any(|line| {
            line.split_once(':')
                .map(|(key, _)| !matches!(WellAddress::parse_log_key(key.trim()), Ok(None)))
                .unwrap_or(false)
        });
        if has_well_line {
            Ok(())
        } else {
            Err(ParserError::FormatMismatch {
                parser: Self::NAME,
                reason: "no 'A01: value' style well lines found".to_string(),
            })
        }
    }

    fn step(
        mut scan: LogScan,
        line_index: usize,
        line: &str,
    ) -> Result<LogScan, ParserError> {
        match LogEntry::classify(Self::NAME, line, line_index)? {
            LogEntry::Time(value) => {
                scan.cursor.elapsed_time_s =
                    parse_required_i64(Self::NAME, value, line_index, TIME_KEY)?;
            }
            LogEntry::Cycle(value) => {
                scan.cursor.cycle_index =
                    parse_required_u32(Self::NAME, value, line_index, CYCLE_KEY)?;
            }
            LogEntry::Well { well, value } => {
                match parse_reading(Self::NAME, value, line_index, &well.to_string())? {
                    Some(fluorescence) => scan.observations.push(RawObservation {
                        cycle_index: scan.cursor.cycle_index,
                        elapsed_time_s: scan.cursor.elapsed_time_s,
                        well,
                        fluorescence,
                    }),
                    None => scan.unread_count += 1,
                }
            }
            LogEntry::Ignored => {}
        }
        Ok(scan)
    }
}

impl PlateParser for KeyValueLogParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn layout(&self) -> PlateLayout {
        PlateLayout::KeyValueLog
    }

    fn parse(&self, content: &str) -> Result<ParsedPlate, ParserError> {
        Self::detect(content)?;

        let scan = numbered_lines(content).try_fold(LogScan::default(), |scan, (idx, line)| {
            Self::step(scan, idx, line)
        })?;

        if scan.observations.is_empty() && scan.unread_count == 0 {
            return Err(ParserError::EmptyData { parser: Self::NAME });
        }

        Ok(ParsedPlate {
            layout: PlateLayout::KeyValueLog,
            observations: scan.observations,
            unread_count: scan.unread_count,
        })
    }
}
