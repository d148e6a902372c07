use plateflux_parser::{parse_plate_file, parse_with_layout, PlateLayout};
use tracing::{info, warn};

use crate::conditions::ConditionsKey;
use crate::config::RunConfig;
use crate::error::Result;
use crate::swap::TriggerPolicy;
use crate::timeline::{LabeledRecord, TimeSource, TimelineBuilder};

/// Everything produced by one run over a plate export.
#[derive(Debug, Clone)]
pub struct ProcessedPlate {
    pub layout: PlateLayout,
    pub time_source: TimeSource,
    pub policy: TriggerPolicy,
    pub records: Vec<LabeledRecord>,
    pub unread_count: usize,
}

/// Parses `content`, then labels every reading against `key` and the configured swaps.
/// Any parse or lookup failure aborts the whole run.
pub fn process_plate(
    content: &str,
    key: &ConditionsKey,
    config: &RunConfig,
) -> Result<ProcessedPlate> {
    config.validate()?;

    let parsed = match config.layout.layout() {
        Some(layout) => parse_with_layout(content, layout)?,
        None => parse_plate_file(content)?,
    };
    info!(
        layout = %parsed.layout,
        readings = parsed.observations.len(),
        unread = parsed.unread_count,
        cycles = parsed.cycle_count(),
        "Parsed plate export"
    );

    let time_source = config.time_source(parsed.layout)?;
    if parsed.layout == PlateLayout::KeyValueLog && config.sampling_interval_s.is_some() {
        warn!("Sampling interval is ignored for log exports; times come from the instrument");
    }
    let policy = config.trigger_policy(parsed.layout);
    let schedule = config.schedule();

    let records =
        TimelineBuilder::new(key, &schedule, time_source, policy).reconstruct(&parsed.observations)?;

    Ok(ProcessedPlate {
        layout: parsed.layout,
        time_source,
        policy,
        records,
        unread_count: parsed.unread_count,
    })
}
