use crate::errors::ParserError;
use crate::model::{ParsedPlate, PlateLayout, RawObservation, WellAddress, WellRow};
use crate::registry::PlateParser;

use super::{is_unread, numbered_lines, parse_reading};

/// One classified line of a dense grid export.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GridLine<'a> {
    Row(Vec<&'a str>),
    EndOfCycle,
}

impl<'a> GridLine<'a> {
    pub(crate) fn classify(line: &'a str) -> Self {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            GridLine::EndOfCycle
        } else {
            GridLine::Row(trimmed.split(',').collect())
        }
    }
}

/// Position within the export: which cycle, and which row of that cycle comes next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GridCursor {
    cycle_index: u32,
    next_row: usize,
}

impl GridCursor {
    fn end_cycle(self) -> Self {
        Self {
            cycle_index: self.cycle_index + 1,
            next_row: 0,
        }
    }

    fn advance_row(self) -> Self {
        Self {
            next_row: self.next_row + 1,
            ..self
        }
    }
}

#[derive(Default)]
struct GridScan {
    cursor: GridCursor,
    observations: Vec<RawObservation>,
    unread_count: usize,
    row_lines: usize,
}

/// Parser for the comma separated grid export: one line per plate row, a blank line after
/// every cycle. The last cycle does not need a trailing blank line.
pub struct DenseGridParser;

impl Default for DenseGridParser {
    fn default() -> Self {
        Self
    }
}

impl DenseGridParser {
    const NAME: &'static str = "DENSE_GRID";

    fn detect(content: &str) -> Result<(), ParserError> {
        let first = content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| ParserError::FormatMismatch {
                parser: Self::NAME,
                reason: "file contains no data lines".to_string(),
            })?;

        let looks_numeric = !first.contains(':')
            && first.split(',').any(|cell| {
                let cell = cell.trim();
                is_unread(cell) || cell.parse::<f64>().is_ok()
            });
        if looks_numeric {
            Ok(())
        } else {
            Err(ParserError::FormatMismatch {
                parser: Self::NAME,
                reason: format!("first line '{first}' is not a row of readings"),
            })
        }
    }

    fn scan_row(
        mut scan: GridScan,
        cells: Vec<&str>,
        line_index: usize,
    ) -> Result<GridScan, ParserError> {
        let row = WellRow::from_index(scan.cursor.next_row).map_err(|message| {
            ParserError::DataRow {
                parser: Self::NAME,
                line_index,
                message,
            }
        })?;

        for (col_idx, cell) in cells.into_iter().enumerate() {
            let column = col_idx as u32 + 1;
            let well = WellAddress { row, column };
            match parse_reading(Self::NAME, cell, line_index, &well.to_string())? {
                Some(fluorescence) => scan.observations.push(RawObservation {
                    cycle_index: scan.cursor.cycle_index,
                    elapsed_time_s: 0,
                    well,
                    fluorescence,
                }),
                None => scan.unread_count += 1,
            }
        }

        scan.cursor = scan.cursor.advance_row();
        scan.row_lines += 1;
        Ok(scan)
    }
}

impl PlateParser for DenseGridParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn layout(&self) -> PlateLayout {
        PlateLayout::DenseGrid
    }

    fn parse(&self, content: &str) -> Result<ParsedPlate, ParserError> {
        Self::detect(content)?;

        let scan = numbered_lines(content).try_fold(
            GridScan::default(),
            |mut scan, (line_index, line)| match GridLine::classify(line) {
                GridLine::EndOfCycle => {
                    scan.cursor = scan.cursor.end_cycle();
                    Ok(scan)
                }
                GridLine::Row(cells) => Self::scan_row(scan, cells, line_index),
            },
        )?;

        if scan.row_lines == 0 {
            return Err(ParserError::EmptyData { parser: Self::NAME });
        }

        Ok(ParsedPlate {
            layout: PlateLayout::DenseGrid,
            observations: scan.observations,
            unread_count: scan.unread_count,
        })
    }
}
