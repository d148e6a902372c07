use plateflux_core::config::{LayoutChoice, RunConfig, TriggerSettings};
use plateflux_core::swap::{SwapEvent, TriggerComparison, TriggerUnit};
use plateflux_core::{process_plate, ConditionsKey, PipelineError, TimeSource, TimelineError};
use plateflux_parser::{ParserError, PlateLayout, WellRow};

fn fixture(name: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../plateflux-parser/tests/data")
        .join(name);
    std::fs::read_to_string(path).expect("read fixture")
}

fn full_key(rows: &str, columns: usize) -> ConditionsKey {
    rows.chars()
        .map(|letter| {
            let samples: Vec<String> = (1..=columns)
                .map(|col| format!("{letter}-sample{col}"))
                .collect();
            (WellRow::new(letter).expect("row"), samples)
        })
        .collect()
}

#[test]
fn grid_run_applies_cycle_swaps() {
    let content = fixture("three_row_plate.csv");
    let key = full_key("ABC", 4);
    let config = RunConfig {
        sampling_interval_s: Some(30),
        swaps: vec![SwapEvent::new(2, 600, "Substrate added")],
        ..RunConfig::default()
    };

    let processed = process_plate(&content, &key, &config).expect("process");

    assert_eq!(processed.layout, PlateLayout::DenseGrid);
    assert_eq!(
        processed.time_source,
        TimeSource::CycleInterval {
            sampling_interval_s: 30
        }
    );
    assert_eq!(processed.unread_count, 3);
    assert_eq!(processed.records.len(), 33);

    let cycle_times: Vec<i64> = processed
        .records
        .iter()
        .map(|r| r.adjusted_time_s)
        .collect();
    assert_eq!(cycle_times.first(), Some(&0));
    assert!(cycle_times.contains(&30));
    assert_eq!(cycle_times.last(), Some(&660));

    let last = processed.records.last().expect("records");
    assert_eq!(last.plate_label.as_ref(), "Substrate added");
    assert_eq!(last.condition.as_ref(), "C-sample4");
}

#[test]
fn log_run_uses_instrument_time_and_seconds_trigger() {
    let content = fixture("kinetic_log.txt");
    let key = full_key("AB", 2);
    let config = RunConfig {
        swaps: vec![SwapEvent::new(120, 45, "Reinserted")],
        ..RunConfig::default()
    };

    let processed = process_plate(&content, &key, &config).expect("process");

    assert_eq!(processed.layout, PlateLayout::KeyValueLog);
    assert_eq!(processed.policy.unit, TriggerUnit::Seconds);
    let times: Vec<(i64, &str)> = processed
        .records
        .iter()
        .map(|r| (r.adjusted_time_s, r.plate_label.as_ref()))
        .collect();
    assert_eq!(times[0], (0, "Equilibration"));
    assert_eq!(times[3], (62, "Equilibration"));
    assert_eq!(times[10], (950, "Reinserted"));
}

#[test]
fn trigger_settings_override_layout_defaults() {
    let content = fixture("kinetic_log.txt");
    let key = full_key("AB", 2);
    let config = RunConfig {
        trigger: TriggerSettings {
            unit: Some(TriggerUnit::Cycle),
            comparison: Some(TriggerComparison::AtOrAfter),
        },
        swaps: vec![SwapEvent::new(1, 100, "Cycle swap")],
        ..RunConfig::default()
    };

    let processed = process_plate(&content, &key, &config).expect("process");
    let cycle1_first = &processed.records[3];
    assert_eq!(cycle1_first.adjusted_time_s, 162);
    assert_eq!(cycle1_first.plate_label.as_ref(), "Cycle swap");
}

#[test]
fn forced_layout_skips_detection() {
    let content = fixture("kinetic_log.txt");
    let key = full_key("AB", 2);
    let config = RunConfig {
        layout: LayoutChoice::Grid,
        ..RunConfig::default()
    };

    let err = process_plate(&content, &key, &config).expect_err("log is not a grid");
    assert!(matches!(
        err,
        PipelineError::Parser(ParserError::FormatMismatch { .. })
    ));
}

#[test]
fn missing_condition_aborts_the_run() {
    let content = fixture("three_row_plate.csv");
    let key = full_key("AB", 4);

    let err = process_plate(&content, &key, &RunConfig::default()).expect_err("row C missing");
    match err {
        PipelineError::Timeline(TimelineError::Lookup(lookup)) => {
            assert_eq!(lookup.well.to_string(), "C1")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn parse_errors_surface_before_reconstruction() {
    let content = fixture("malformed_reading.csv");
    let key = full_key("AB", 2);

    let err = process_plate(&content, &key, &RunConfig::default()).expect_err("malformed");
    match err {
        PipelineError::Parser(parser_err) => assert_eq!(parser_err.line_index(), Some(2)),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_sampling_interval_is_rejected() {
    let content = fixture("two_cycle_single_row.csv");
    let key = full_key("A", 2);
    let config = RunConfig {
        sampling_interval_s: Some(0),
        ..RunConfig::default()
    };

    let err = process_plate(&content, &key, &config).expect_err("zero interval");
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn oversized_sampling_interval_fails_instead_of_wrapping() {
    let key = full_key("A", 1);
    let config = RunConfig {
        sampling_interval_s: Some(i64::MAX / 2 + 1),
        ..RunConfig::default()
    };

    let err = process_plate("1\n\n2\n\n3\n", &key, &config).expect_err("overflow");
    assert!(matches!(
        err,
        PipelineError::Timeline(TimelineError::TimeOverflow { cycle_index: 2, .. })
    ));
}
