//! End-to-end pipeline tests.
//!
//! These tests verify:
//! 1. CSV round trips with deterministic derived-column naming
//! 2. Group isolation (no statistic crosses a group boundary)
//! 3. Row-count conservation across warm-up and first-period filtering
//! 4. Parallel and sequential runs produce identical tables
//! 5. Fail-fast behavior for configuration and data errors

use std::collections::HashMap;
use tempfile::TempDir;
use trip_feature_extractor::prelude::*;

// ============================================================================
// Fixtures
// ============================================================================

fn single_window_config() -> PipelineConfig {
    PipelineConfig::default().with_features(
        FeatureConfig::default()
            .with_windows(1, 600)
            .with_drop_first_period(false),
    )
}

fn table(csv: &str) -> TripTable {
    TripTable::from_csv_reader(csv.as_bytes()).unwrap()
}

/// Deterministic pseudo-random generator for larger fixtures.
fn lcg(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state >> 33
}

/// Synthetic multi-group, multi-day trip table.
fn synthetic_table(groups: usize, rows_per_group: usize) -> TripTable {
    let day = 5760i64;
    let mut state = 7u64;
    let mut rows = Vec::new();
    for g in 0..groups {
        for _ in 0..rows_per_group {
            let t = (lcg(&mut state) % (3 * day as u64)) as i64;
            let v = (lcg(&mut state) % 600) as f64 + 30.0;
            rows.push(vec![
                format!("{g}_{}", g + 1),
                t.to_string(),
                (t / day).to_string(),
                v.to_string(),
            ]);
        }
    }
    TripTable::new(
        vec![
            "OD_Dig_2".to_string(),
            "In Time".to_string(),
            "Date".to_string(),
            "Travel Time".to_string(),
        ],
        rows,
    )
    .unwrap()
}

/// Comparable row image (cells plus feature bit patterns), sorted.
fn row_images(table: &AggregatedTable) -> Vec<(Vec<String>, Vec<u64>)> {
    let mut images: Vec<(Vec<String>, Vec<u64>)> = table
        .rows()
        .iter()
        .map(|row| {
            let bits = row.features.iter().map(|f| f.to_bits()).collect();
            (row.cells.clone(), bits)
        })
        .collect();
    images.sort();
    images
}

// ============================================================================
// CSV Round Trip
// ============================================================================

#[test]
fn csv_round_trip_appends_named_feature_columns() {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("trips.csv");
    let output_path = dir.path().join("features.csv");

    std::fs::write(
        &input_path,
        "OD_Dig_2,In Time,Date,Travel Time\n\
         3_7,0,0,10\n3_7,600,0,20\n3_7,1200,0,30\n",
    )
    .unwrap();

    let pipeline = Pipeline::from_config(single_window_config()).unwrap();
    let output = pipeline.process_to(&input_path, &output_path).unwrap();
    assert_eq!(output.rows_emitted, 2);

    let mut reader = csv::Reader::from_path(&output_path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        headers,
        vec![
            "OD_Dig_2",
            "In Time",
            "Date",
            "Travel Time",
            "mean_TravelTime_before_1",
            "std_TravelTime_before_1",
        ]
    );

    let records: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    assert_eq!(records.len(), 2);

    // Row at 600: mean of [0, 600) is 10; single point, std missing.
    assert_eq!(records[0][1], "600");
    assert_eq!(records[0][4], "10");
    assert_eq!(records[0][5], "");
    // Row at 1200: mean of [600, 1200) is 20.
    assert_eq!(records[1][4], "20");
}

#[test]
fn multi_target_multi_window_column_order() {
    let config = PipelineConfig::default().with_features(
        FeatureConfig::default()
            .with_windows(2, 600)
            .with_targets(["Travel Time", "Delay"])
            .with_drop_first_period(false),
    );
    let pipeline = Pipeline::from_config(config).unwrap();

    let input = table(
        "OD_Dig_2,In Time,Date,Travel Time,Delay\n\
         3_7,0,0,10,1\n3_7,600,0,20,2\n3_7,1200,0,30,3\n3_7,1800,0,40,4\n",
    );
    let output = pipeline.run(&input).unwrap();

    let expected_tail = [
        "mean_TravelTime_before_1",
        "std_TravelTime_before_1",
        "mean_TravelTime_before_2",
        "std_TravelTime_before_2",
        "mean_Delay_before_1",
        "std_Delay_before_1",
        "mean_Delay_before_2",
        "std_Delay_before_2",
    ];
    assert_eq!(&output.table.headers()[5..], &expected_tail);

    // Record at 1800: window 1 = [1200, 1800) → 30, window 2 = [600, 1200) → 20.
    let last = output
        .table
        .rows()
        .iter()
        .position(|r| r.in_time == 1800)
        .unwrap();
    assert_eq!(
        output.table.feature(last, "mean_TravelTime_before_1"),
        Some(30.0)
    );
    assert_eq!(
        output.table.feature(last, "mean_TravelTime_before_2"),
        Some(20.0)
    );
    assert_eq!(output.table.feature(last, "mean_Delay_before_1"), Some(3.0));
}

// ============================================================================
// Group Isolation
// ============================================================================

#[test]
fn statistics_never_cross_group_boundaries() {
    // Two groups share identical timestamps but carry values two orders of
    // magnitude apart; any leakage would drag a mean across groups.
    let input = table(
        "OD_Dig_2,In Time,Date,Travel Time\n\
         a_1,0,0,10\na_1,600,0,12\na_1,1200,0,14\n\
         b_2,0,0,1000\nb_2,600,0,1200\nb_2,1200,0,1400\n",
    );
    let pipeline = Pipeline::from_config(single_window_config()).unwrap();
    let output = pipeline.run(&input).unwrap();
    assert_eq!(output.rows_emitted, 4);

    for (i, row) in output.table.rows().iter().enumerate() {
        let mean = output.table.feature(i, "mean_TravelTime_before_1").unwrap();
        match row.cells[0].as_str() {
            "a_1" => assert!(mean < 100.0, "group a_1 leaked: {mean}"),
            "b_2" => assert!(mean >= 1000.0, "group b_2 leaked: {mean}"),
            other => panic!("unexpected group {other}"),
        }
    }
}

// ============================================================================
// Row Accounting
// ============================================================================

#[test]
fn row_count_conservation() {
    let input = synthetic_table(4, 150);
    let config = PipelineConfig::default().with_features(
        FeatureConfig::default()
            .with_windows(3, 120)
            .with_backtracking(5760, 2),
    );
    let pipeline = Pipeline::from_config(config).unwrap();
    let output = pipeline.run(&input).unwrap();

    assert_eq!(
        output.rows_read,
        output.rows_emitted + output.warmup_rows_dropped + output.first_period_rows_dropped
    );
    assert_eq!(output.rows_read, 600);
    assert!(output.rows_emitted > 0);
}

#[test]
fn drop_first_period_uses_minimum_observed_date() {
    // Dates start at 5, not 0: the filter must drop date 5, keep date 6.
    let input = table(
        "OD_Dig_2,In Time,Date,Travel Time\n\
         3_7,0,5,10\n3_7,600,5,20\n3_7,1200,6,30\n3_7,1800,6,40\n",
    );
    let config =
        PipelineConfig::default().with_features(FeatureConfig::default().with_windows(1, 600));
    let pipeline = Pipeline::from_config(config).unwrap();
    let output = pipeline.run(&input).unwrap();

    // Warm-up removes the row at 0; the filter removes the date-5 row at 600.
    assert_eq!(output.warmup_rows_dropped, 1);
    assert_eq!(output.first_period_rows_dropped, 1);
    assert_eq!(output.rows_emitted, 2);
    assert!(output.table.rows().iter().all(|r| r.date == 6));
}

#[test]
fn first_period_filter_disabled_keeps_all_survivors() {
    let input = table(
        "OD_Dig_2,In Time,Date,Travel Time\n\
         3_7,0,0,10\n3_7,600,0,20\n3_7,1200,1,30\n",
    );
    let pipeline = Pipeline::from_config(single_window_config()).unwrap();
    let output = pipeline.run(&input).unwrap();
    assert_eq!(output.first_period_rows_dropped, 0);
    assert_eq!(output.rows_emitted, 2);
}

#[test]
fn empty_input_produces_empty_output() {
    let input = table("OD_Dig_2,In Time,Date,Travel Time\n");
    let pipeline = Pipeline::from_config(single_window_config()).unwrap();
    let output = pipeline.run(&input).unwrap();
    assert_eq!(output.rows_read, 0);
    assert_eq!(output.rows_emitted, 0);
    assert_eq!(output.groups_processed, 0);
    assert_eq!(output.table.headers().len(), 6);
}

// ============================================================================
// Parallel Consistency
// ============================================================================

#[test]
fn parallel_and_sequential_runs_are_identical() {
    let input = synthetic_table(6, 120);
    let features = FeatureConfig::default()
        .with_windows(3, 120)
        .with_backtracking(5760, 2);

    let sequential = Pipeline::from_config(
        PipelineConfig::default()
            .with_features(features.clone())
            .with_runner(RunnerConfig::new().with_threads(1)),
    )
    .unwrap();
    let parallel = Pipeline::from_config(
        PipelineConfig::default()
            .with_features(features)
            .with_runner(RunnerConfig::new().with_threads(4)),
    )
    .unwrap();

    let a = sequential.run(&input).unwrap();
    let b = parallel.run(&input).unwrap();

    assert_eq!(a.rows_emitted, b.rows_emitted);
    assert_eq!(row_images(&a.table), row_images(&b.table));
}

#[test]
fn rows_within_a_group_stay_in_timestamp_order() {
    let input = synthetic_table(3, 80);
    let pipeline = Pipeline::from_config(single_window_config()).unwrap();
    let output = pipeline.run(&input).unwrap();

    let mut last_seen: HashMap<String, i64> = HashMap::new();
    for row in output.table.rows() {
        let group = row.cells[0].clone();
        if let Some(&prev) = last_seen.get(&group) {
            assert!(prev <= row.in_time, "group {group} out of order");
        }
        last_seen.insert(group, row.in_time);
    }
}

// ============================================================================
// Failure Modes
// ============================================================================

#[test]
fn missing_required_column_fails_before_processing() {
    let input = table("OD_Dig_2,In Time,Travel Time\n3_7,0,10\n");
    let pipeline = Pipeline::from_config(single_window_config()).unwrap();
    let err = pipeline.run(&input).unwrap_err();
    assert!(matches!(err, FeatureError::MissingColumn(c) if c == "Date"));
}

#[test]
fn malformed_target_value_aborts_the_run() {
    let input = table(
        "OD_Dig_2,In Time,Date,Travel Time\n\
         3_7,0,0,10\n3_7,600,0,not-a-number\n3_7,1200,0,30\n",
    );
    let pipeline = Pipeline::from_config(single_window_config()).unwrap();
    let err = pipeline.run(&input).unwrap_err();
    match err {
        FeatureError::Group { group, message } => {
            assert_eq!(group, "3_7");
            assert!(message.contains("Travel Time"));
        }
        other => panic!("expected group error, got {other:?}"),
    }
}

#[test]
fn invalid_configuration_is_rejected_before_io() {
    let config = PipelineConfig::default()
        .with_features(FeatureConfig::default().with_targets(Vec::<String>::new()));
    assert!(matches!(
        Pipeline::from_config(config),
        Err(FeatureError::Config(_))
    ));
}

// ============================================================================
// Composite Group Keys
// ============================================================================

#[test]
fn composite_group_keys_partition_jointly() {
    // Origin and destination buckets as separate key columns: (1, 2) and
    // (1, 3) are distinct groups even though they share an origin.
    let config = PipelineConfig::default().with_features(
        FeatureConfig::default()
            .with_windows(1, 600)
            .with_group_keys(["O_Dig", "D_Dig"])
            .with_drop_first_period(false),
    );
    let pipeline = Pipeline::from_config(config).unwrap();

    let input = table(
        "O_Dig,D_Dig,In Time,Date,Travel Time\n\
         1,2,0,0,10\n1,2,600,0,20\n\
         1,3,0,0,500\n1,3,600,0,700\n",
    );
    let output = pipeline.run(&input).unwrap();

    assert_eq!(output.groups_processed, 2);
    assert_eq!(output.rows_emitted, 2);
    for (i, row) in output.table.rows().iter().enumerate() {
        let mean = output.table.feature(i, "mean_TravelTime_before_1").unwrap();
        match row.cells[1].as_str() {
            "2" => assert_eq!(mean, 10.0),
            "3" => assert_eq!(mean, 500.0),
            other => panic!("unexpected destination {other}"),
        }
    }
}
