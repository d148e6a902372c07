use std::sync::Arc;

use plateflux_parser::{PlateLayout, RawObservation, WellAddress, WellRow};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::conditions::ConditionsKey;
use crate::swap::{SwapSchedule, TimelinePosition, TriggerPolicy};

/// Plate state before any swap has fired.
pub const DEFAULT_PLATE_LABEL: &str = "Equilibration";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("well {well} has no entry in the conditions key")]
pub struct LookupError {
    pub well: WellAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("adjusted time of well {well} in cycle {cycle_index} does not fit in 64-bit seconds")]
    TimeOverflow { well: WellAddress, cycle_index: u32 },
}

/// How an observation's un-swapped time is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// `cycle_index * sampling_interval_s`; grid exports carry no clock.
    CycleInterval { sampling_interval_s: i64 },
    /// The instrument's own `Time [s]` value.
    ElapsedTime,
}

impl TimeSource {
    pub fn for_layout(layout: PlateLayout, sampling_interval_s: i64) -> Self {
        match layout {
            PlateLayout::DenseGrid => TimeSource::CycleInterval {
                sampling_interval_s,
            },
            PlateLayout::KeyValueLog => TimeSource::ElapsedTime,
        }
    }

    /// Un-swapped time in seconds, `None` on `i64` overflow.
    pub fn logical_time(&self, observation: &RawObservation) -> Option<i64> {
        match self {
            TimeSource::CycleInterval {
                sampling_interval_s,
            } => i64::from(observation.cycle_index).checked_mul(*sampling_interval_s),
            TimeSource::ElapsedTime => Some(observation.elapsed_time_s),
        }
    }
}

/// One output row: a well reading placed on the swap-adjusted timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledRecord {
    #[serde(rename = "Time")]
    pub adjusted_time_s: i64,
    #[serde(rename = "Plate")]
    pub plate_label: Arc<str>,
    #[serde(rename = "Row")]
    pub row: WellRow,
    #[serde(rename = "Column")]
    pub column: u32,
    #[serde(rename = "Condition")]
    pub condition: Arc<str>,
    #[serde(rename = "Fluorescence")]
    pub fluorescence: f64,
}

impl LabeledRecord {
    pub fn well(&self) -> WellAddress {
        WellAddress {
            row: self.row,
            column: self.column,
        }
    }
}

/// Read-only inputs for one reconstruction pass.
#[derive(Debug, Clone)]
pub struct TimelineBuilder<'a> {
    key: &'a ConditionsKey,
    schedule: &'a SwapSchedule,
    time_source: TimeSource,
    policy: TriggerPolicy,
    default_label: Arc<str>,
}

impl<'a> TimelineBuilder<'a> {
    pub fn new(
        key: &'a ConditionsKey,
        schedule: &'a SwapSchedule,
        time_source: TimeSource,
        policy: TriggerPolicy,
    ) -> Self {
        Self {
            key,
            schedule,
            time_source,
            policy,
            default_label: Arc::from(DEFAULT_PLATE_LABEL),
        }
    }

    pub fn time_source(&self) -> TimeSource {
        self.time_source
    }

    pub fn policy(&self) -> TriggerPolicy {
        self.policy
    }

    /// Places a single observation on the adjusted timeline.
    pub fn label(&self, observation: &RawObservation) -> Result<LabeledRecord, TimelineError> {
        let overflow = || TimelineError::TimeOverflow {
            well: observation.well,
            cycle_index: observation.cycle_index,
        };

        let logical_time_s = self
            .time_source
            .logical_time(observation)
            .ok_or_else(overflow)?;
        let position = TimelinePosition {
            cycle_index: observation.cycle_index,
            logical_time_s,
        };
        let state = self
            .schedule
            .state_at(self.policy, position)
            .ok_or_else(overflow)?;
        let adjusted_time_s = logical_time_s
            .checked_add(state.offset_s)
            .ok_or_else(overflow)?;

        let condition = self
            .key
            .get(&observation.well)
            .cloned()
            .ok_or(LookupError {
                well: observation.well,
            })?;

        Ok(LabeledRecord {
            adjusted_time_s,
            plate_label: state
                .label()
                .cloned()
                .unwrap_or_else(|| Arc::clone(&self.default_label)),
            row: observation.well.row,
            column: observation.well.column,
            condition,
            fluorescence: observation.fluorescence,
        })
    }

    /// Lazily labels observations in input order.
    pub fn reconstruct_iter<I>(
        &'a self,
        observations: I,
    ) -> impl Iterator<Item = Result<LabeledRecord, TimelineError>> + 'a
    where
        I: IntoIterator<Item = &'a RawObservation>,
        I::IntoIter: 'a,
    {
        observations.into_iter().map(move |obs| self.label(obs))
    }

    /// Labels every observation, stopping at the first well missing from the key or
    /// the first time that overflows.
    pub fn reconstruct(
        &self,
        observations: &[RawObservation],
    ) -> Result<Vec<LabeledRecord>, TimelineError> {
        let mut records = Vec::with_capacity(observations.len());
        let mut current_label: Option<Arc<str>> = None;

        for observation in observations {
            let record = self.label(observation)?;
            if current_label.as_ref() != Some(&record.plate_label) {
                debug!(
                    plate = %record.plate_label,
                    cycle = observation.cycle_index,
                    time_s = record.adjusted_time_s,
                    "Plate state changed"
                );
                current_label = Some(Arc::clone(&record.plate_label));
            }
            records.push(record);
        }

        info!(
            records = records.len(),
            swaps = self.schedule.len(),
            policy = %self.policy,
            "Reconstructed plate timeline"
        );
        Ok(records)
    }
}

/// Convenience wrapper around [`TimelineBuilder::reconstruct`].
pub fn reconstruct_timeline(
    observations: &[RawObservation],
    key: &ConditionsKey,
    schedule: &SwapSchedule,
    time_source: TimeSource,
    policy: TriggerPolicy,
) -> Result<Vec<LabeledRecord>, TimelineError> {
    TimelineBuilder::new(key, schedule, time_source, policy).reconstruct(observations)
}
