//! Plate swap schedule and the policy deciding when a swap has fired.
//!
//! The two instrument layouts disagree on what a swap trigger counts (cycles or seconds) and
//! on whether the trigger point itself is already "after the swap". Both choices live in
//! [`TriggerPolicy`] so neither is hard-coded.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use plateflux_parser::PlateLayout;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerUnit {
    /// Trigger is a cycle index.
    Cycle,
    /// Trigger is a logical time in seconds (before any swap offset).
    Seconds,
}

impl TriggerUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerUnit::Cycle => "cycle",
            TriggerUnit::Seconds => "seconds",
        }
    }
}

impl fmt::Display for TriggerUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerComparison {
    /// Fires once `trigger <= position`.
    AtOrAfter,
    /// Fires once `position > trigger`.
    After,
}

impl TriggerComparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerComparison::AtOrAfter => "at_or_after",
            TriggerComparison::After => "after",
        }
    }
}

impl fmt::Display for TriggerComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an observation sits on the un-swapped timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelinePosition {
    pub cycle_index: u32,
    pub logical_time_s: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPolicy {
    pub unit: TriggerUnit,
    pub comparison: TriggerComparison,
}

impl TriggerPolicy {
    pub fn new(unit: TriggerUnit, comparison: TriggerComparison) -> Self {
        Self { unit, comparison }
    }

    /// Grid exports count swaps in cycles and include the trigger cycle; logs count seconds
    /// and only apply a swap strictly after the trigger time.
    pub fn for_layout(layout: PlateLayout) -> Self {
        match layout {
            PlateLayout::DenseGrid => Self::new(TriggerUnit::Cycle, TriggerComparison::AtOrAfter),
            PlateLayout::KeyValueLog => Self::new(TriggerUnit::Seconds, TriggerComparison::After),
        }
    }

    /// Compares against the pre-offset position only; adjusted times never feed back in.
    pub fn fires(&self, trigger: i64, position: TimelinePosition) -> bool {
        let value = match self.unit {
            TriggerUnit::Cycle => i64::from(position.cycle_index),
            TriggerUnit::Seconds => position.logical_time_s,
        };
        match self.comparison {
            TriggerComparison::AtOrAfter => trigger <= value,
            TriggerComparison::After => value > trigger,
        }
    }
}

impl fmt::Display for TriggerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.unit, self.comparison)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub trigger: i64,
    pub duration_s: i64,
    pub label: Arc<str>,
}

impl SwapEvent {
    pub fn new(trigger: i64, duration_s: i64, label: impl Into<Arc<str>>) -> Self {
        Self {
            trigger,
            duration_s,
            label: label.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SwapParseError {
    #[error("swap '{input}' must look like trigger,duration,label")]
    MissingField { input: String },
    #[error("swap '{input}' has invalid {field}: {message}")]
    InvalidNumber {
        input: String,
        field: &'static str,
        message: String,
    },
    #[error("swap '{input}' has negative duration {duration_s}")]
    NegativeDuration { input: String, duration_s: i64 },
    #[error("swap '{input}' has an empty label")]
    EmptyLabel { input: String },
}

impl FromStr for SwapEvent {
    type Err = SwapParseError;

    /// Parses the operator shorthand `trigger,duration,label`. Everything after the second
    /// comma is the label, so labels may contain commas.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.splitn(3, ',');
        let (Some(trigger), Some(duration), Some(label)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(SwapParseError::MissingField {
                input: input.to_string(),
            });
        };

        let parse_field = |value: &str, field: &'static str| {
            value
                .trim()
                .parse::<i64>()
                .map_err(|err| SwapParseError::InvalidNumber {
                    input: input.to_string(),
                    field,
                    message: err.to_string(),
                })
        };
        let trigger = parse_field(trigger, "trigger")?;
        let duration_s = parse_field(duration, "duration")?;
        if duration_s < 0 {
            return Err(SwapParseError::NegativeDuration {
                input: input.to_string(),
                duration_s,
            });
        }

        let label = label.trim();
        if label.is_empty() {
            return Err(SwapParseError::EmptyLabel {
                input: input.to_string(),
            });
        }

        Ok(SwapEvent::new(trigger, duration_s, label))
    }
}

/// Shell-friendly labels use underscores for spaces (`Post_swap` -> `Post swap`).
pub fn normalize_label(label: &str) -> String {
    label.replace('_', " ")
}

/// Accumulated effect of every swap that has fired for one observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapState<'a> {
    pub offset_s: i64,
    pub last_fired: Option<&'a SwapEvent>,
    pub fired: usize,
}

impl<'a> SwapState<'a> {
    fn apply(self, event: &'a SwapEvent) -> Option<Self> {
        Some(Self {
            offset_s: self.offset_s.checked_add(event.duration_s)?,
            last_fired: Some(event),
            fired: self.fired + 1,
        })
    }

    pub fn label(&self) -> Option<&'a Arc<str>> {
        self.last_fired.map(|event| &event.label)
    }
}

/// Operator supplied swaps, in the order given. Callers sort by trigger; nothing here
/// reorders or validates the sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwapSchedule(Vec<SwapEvent>);

impl SwapSchedule {
    pub fn new(events: Vec<SwapEvent>) -> Self {
        Self(events)
    }

    pub fn events(&self) -> &[SwapEvent] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Folds every fired event in schedule order: durations add up and the last fired
    /// event's label wins. `None` when the summed durations overflow an `i64`.
    pub fn state_at(
        &self,
        policy: TriggerPolicy,
        position: TimelinePosition,
    ) -> Option<SwapState<'_>> {
        self.0
            .iter()
            .filter(|event| policy.fires(event.trigger, position))
            .try_fold(SwapState::default(), SwapState::apply)
    }
}

impl From<Vec<SwapEvent>> for SwapSchedule {
    fn from(events: Vec<SwapEvent>) -> Self {
        Self::new(events)
    }
}

impl FromIterator<SwapEvent> for SwapSchedule {
    fn from_iter<I: IntoIterator<Item = SwapEvent>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(cycle_index: u32, logical_time_s: i64) -> TimelinePosition {
        TimelinePosition {
            cycle_index,
            logical_time_s,
        }
    }

    #[test]
    fn at_or_after_includes_the_trigger_cycle() {
        let policy = TriggerPolicy::new(TriggerUnit::Cycle, TriggerComparison::AtOrAfter);
        assert!(!policy.fires(2, at(1, 999)));
        assert!(policy.fires(2, at(2, 0)));
        assert!(policy.fires(2, at(3, 0)));
    }

    #[test]
    fn after_excludes_the_trigger_second() {
        let policy = TriggerPolicy::new(TriggerUnit::Seconds, TriggerComparison::After);
        assert!(!policy.fires(60, at(50, 60)));
        assert!(policy.fires(60, at(0, 61)));
    }

    #[test]
    fn layout_defaults() {
        assert_eq!(
            TriggerPolicy::for_layout(PlateLayout::DenseGrid),
            TriggerPolicy::new(TriggerUnit::Cycle, TriggerComparison::AtOrAfter)
        );
        assert_eq!(
            TriggerPolicy::for_layout(PlateLayout::KeyValueLog),
            TriggerPolicy::new(TriggerUnit::Seconds, TriggerComparison::After)
        );
    }

    #[test]
    fn state_sums_durations_and_keeps_last_label() {
        let schedule = SwapSchedule::new(vec![
            SwapEvent::new(1, 10, "Drug added"),
            SwapEvent::new(3, 25, "Washout"),
            SwapEvent::new(8, 100, "Never reached"),
        ]);
        let policy = TriggerPolicy::for_layout(PlateLayout::DenseGrid);

        let state = schedule.state_at(policy, at(5, 20)).expect("no overflow");
        assert_eq!(state.offset_s, 35);
        assert_eq!(state.fired, 2);
        assert_eq!(state.label().map(|l| l.as_ref()), Some("Washout"));

        let before = schedule.state_at(policy, at(0, 0)).expect("no overflow");
        assert_eq!(before, SwapState::default());
        assert!(before.label().is_none());
    }

    #[test]
    fn overflowing_offsets_have_no_state() {
        let schedule = SwapSchedule::new(vec![
            SwapEvent::new(0, i64::MAX, "Long soak"),
            SwapEvent::new(0, 1, "Read"),
        ]);
        let policy = TriggerPolicy::for_layout(PlateLayout::DenseGrid);
        assert_eq!(schedule.state_at(policy, at(0, 0)), None);

        let first_only = SwapSchedule::new(vec![SwapEvent::new(0, i64::MAX, "Long soak")]);
        let state = first_only.state_at(policy, at(0, 0)).expect("fits");
        assert_eq!(state.offset_s, i64::MAX);
    }

    #[test]
    fn parses_operator_shorthand() {
        let event: SwapEvent = " 12, 300 ,Post swap, round 2".parse().unwrap();
        assert_eq!(event, SwapEvent::new(12, 300, "Post swap, round 2"));
    }

    #[test]
    fn rejects_bad_shorthand() {
        assert!(matches!(
            "12,300".parse::<SwapEvent>(),
            Err(SwapParseError::MissingField { .. })
        ));
        assert!(matches!(
            "x,300,label".parse::<SwapEvent>(),
            Err(SwapParseError::InvalidNumber { field: "trigger", .. })
        ));
        assert!(matches!(
            "1,-5,label".parse::<SwapEvent>(),
            Err(SwapParseError::NegativeDuration { duration_s: -5, .. })
        ));
        assert!(matches!(
            "1,5, ".parse::<SwapEvent>(),
            Err(SwapParseError::EmptyLabel { .. })
        ));
    }

    #[test]
    fn normalize_label_replaces_underscores() {
        assert_eq!(normalize_label("Post_swap_2"), "Post swap 2");
        assert_eq!(normalize_label("plain"), "plain");
    }
}
