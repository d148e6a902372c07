mod common;
mod dense_grid;
mod key_value_log;

pub use common::UNREAD_SENTINEL;
pub use dense_grid::DenseGridParser;
pub use key_value_log::{KeyValueLogParser, CYCLE_KEY, TIME_KEY};

pub(crate) use common::{
    is_unread, numbered_lines, parse_reading, parse_required_i64, parse_required_u32,
};
