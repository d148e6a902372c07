use comfy_table::{presets::UTF8_FULL, Cell, Table};
use plateflux_core::summary::LabelSummary;
use plateflux_core::{ProcessedPlate, TimeSource};

fn describe_time_source(source: TimeSource) -> String {
    match source {
        TimeSource::CycleInterval { sampling_interval_s } => {
            format!("cycle x {sampling_interval_s}s")
        }
        TimeSource::ElapsedTime => "instrument clock".to_string(),
    }
}

/// Renders one row per plate state, preceded by the run settings in the header.
pub fn summary_table(processed: &ProcessedPlate, summaries: &[LabelSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        Cell::new("Plate"),
        Cell::new("Records"),
        Cell::new("Wells"),
        Cell::new("First time (s)"),
        Cell::new("Last time (s)"),
    ]);

    for summary in summaries {
        table.add_row(vec![
            Cell::new(summary.plate_label.as_ref()),
            Cell::new(summary.records),
            Cell::new(summary.wells),
            Cell::new(summary.first_time_s),
            Cell::new(summary.last_time_s),
        ]);
    }

    table.add_row(vec![
        Cell::new(format!("layout: {}", processed.layout)),
        Cell::new(processed.records.len()),
        Cell::new(format!("{} unread", processed.unread_count)),
        Cell::new(describe_time_source(processed.time_source)),
        Cell::new(format!("swaps: {}", processed.policy)),
    ]);

    table
}
