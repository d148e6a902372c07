use std::collections::HashSet;
use std::sync::Arc;

use plateflux_parser::WellAddress;

use crate::timeline::LabeledRecord;

/// Per plate-state totals for a processed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSummary {
    pub plate_label: Arc<str>,
    pub records: usize,
    pub first_time_s: i64,
    pub last_time_s: i64,
    pub wells: usize,
}

/// Groups records by plate label, labels in order of first appearance.
pub fn summarize(records: &[LabeledRecord]) -> Vec<LabelSummary> {
    let mut summaries: Vec<(LabelSummary, HashSet<WellAddress>)> = Vec::new();

    for record in records {
        let idx = match summaries
            .iter()
            .position(|(summary, _)| summary.plate_label == record.plate_label)
        {
            Some(idx) => idx,
            None => {
                summaries.push((
                    LabelSummary {
                        plate_label: Arc::clone(&record.plate_label),
                        records: 0,
                        first_time_s: record.adjusted_time_s,
                        last_time_s: record.adjusted_time_s,
                        wells: 0,
                    },
                    HashSet::new(),
                ));
                summaries.len() - 1
            }
        };

        let (summary, wells) = &mut summaries[idx];
        summary.records += 1;
        summary.first_time_s = summary.first_time_s.min(record.adjusted_time_s);
        summary.last_time_s = summary.last_time_s.max(record.adjusted_time_s);
        wells.insert(record.well());
        summary.wells = wells.len();
    }

    summaries.into_iter().map(|(summary, _)| summary).collect()
}
