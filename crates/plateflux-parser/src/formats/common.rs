use crate::errors::ParserError;

/// Marker the instrument writes for a well it did not read.
pub const UNREAD_SENTINEL: &str = "-";

pub(crate) fn is_unread(value: &str) -> bool {
    value.trim() == UNREAD_SENTINEL
}

/// Parses a fluorescence cell. Unread cells come back as `None`.
pub(crate) fn parse_reading(
    parser: &'static str,
    value: &str,
    line_index: usize,
    well: &str,
) -> Result<Option<f64>, ParserError> {
    let trimmed = value.trim();
    if is_unread(trimmed) {
        return Ok(None);
    }
    if trimmed.is_empty() {
        return Err(ParserError::DataRow {
            parser,
            line_index,
            message: format!("well {well} has an empty reading"),
        });
    }

    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(Some(parsed)),
        Ok(parsed) => Err(ParserError::DataRow {
            parser,
            line_index,
            message: format!("well {well} reading '{parsed}' is not finite"),
        }),
        Err(err) => Err(ParserError::DataRow {
            parser,
            line_index,
            message: format!("failed to parse well {well} reading '{trimmed}' as number: {err}"),
        }),
    }
}

pub(crate) fn parse_required_i64(
    parser: &'static str,
    value: &str,
    line_index: usize,
    field: &str,
) -> Result<i64, ParserError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|err| ParserError::DataRow {
            parser,
            line_index,
            message: format!("failed to parse '{field}' as integer: {err}"),
        })
}

pub(crate) fn parse_required_u32(
    parser: &'static str,
    value: &str,
    line_index: usize,
    field: &str,
) -> Result<u32, ParserError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|err| ParserError::DataRow {
            parser,
            line_index,
            message: format!("failed to parse '{field}' as non-negative integer: {err}"),
        })
}

/// Iterates lines paired with their 1-based line number.
pub(crate) fn numbered_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
}
