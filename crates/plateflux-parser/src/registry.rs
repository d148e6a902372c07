use crate::errors::{ParserAttempt, ParserError};
use crate::formats::{DenseGridParser, KeyValueLogParser};
use crate::model::{ParsedPlate, PlateLayout};

pub trait PlateParser {
    fn name(&self) -> &'static str;
    fn layout(&self) -> PlateLayout;
    fn parse(&self, content: &str) -> Result<ParsedPlate, ParserError>;
}

/// Detects the export layout and parses it.
pub fn parse_plate_file(content: &str) -> Result<ParsedPlate, ParserError> {
    let key_value_log = KeyValueLogParser;
    let dense_grid = DenseGridParser;
    let parsers: [&dyn PlateParser; 2] = [&key_value_log, &dense_grid];
    parse_with_parsers(content, &parsers)
}

/// Parses with the parser for a known layout, skipping detection.
pub fn parse_with_layout(content: &str, layout: PlateLayout) -> Result<ParsedPlate, ParserError> {
    match layout {
        PlateLayout::DenseGrid => DenseGridParser.parse(content),
        PlateLayout::KeyValueLog => KeyValueLogParser.parse(content),
    }
}

pub fn parse_with_parsers(
    content: &str,
    parsers: &[&dyn PlateParser],
) -> Result<ParsedPlate, ParserError> {
    let mut attempts = Vec::new();

    for parser in parsers {
        match parser.parse(content) {
            Ok(parsed) => return Ok(parsed),
            Err(ParserError::FormatMismatch { reason, .. }) => {
                attempts.push(ParserAttempt::new(parser.name(), reason));
            }
            Err(err) => return Err(err),
        }
    }

    Err(ParserError::NoMatchingParser { attempts })
}
