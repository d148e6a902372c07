pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use errors::{ParserAttempt, ParserError};
pub use model::{
    ParsedPlate, PlateLayout, RawObservation, WellAddress, WellRow, MAX_PLATE_ROWS,
};
pub use registry::{parse_plate_file, parse_with_layout, parse_with_parsers, PlateParser};
