//! Integration tests for the preprocessing step on realistic raw CSVs.

use cancelml::config::{DataProcessingConfig, ForestConfig};
use cancelml::io::read_raw_csv;
use cancelml::preprocessing::preprocess;

fn config(skew_threshold: f64) -> DataProcessingConfig {
    DataProcessingConfig {
        drop_columns: vec!["Unnamed: 0".into(), "Booking_ID".into()],
        categorical_columns: vec![
            "type_of_meal_plan".into(),
            "market_segment_type".into(),
            "booking_status".into(),
        ],
        numerical_columns: vec!["lead_time".into(), "avg_price_per_room".into()],
        skewness_threshold: skew_threshold,
        no_of_features: 2,
        label_column: "booking_status".into(),
        forest: ForestConfig::default(),
        seed: 42,
    }
}

fn write_fixture(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("raw.csv");
    // Two exact duplicate rows (INN002) and one long-tail lead_time value.
    let csv = "\
Booking_ID,lead_time,type_of_meal_plan,market_segment_type,avg_price_per_room,booking_status
INN001,12,Meal Plan 1,Online,100.5,Not_Canceled
INN002,3,Meal Plan 2,Offline,80.0,Canceled
INN002,3,Meal Plan 2,Offline,80.0,Canceled
INN003,45,Not Selected,Online,120.0,Not_Canceled
INN004,7,Meal Plan 1,Corporate,95.0,Canceled
INN005,400,Meal Plan 1,Online,110.0,Canceled
INN006,2,Meal Plan 2,Online,60.0,Not_Canceled
INN007,9,Meal Plan 1,Offline,75.5,Not_Canceled
";
    std::fs::write(&path, csv).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

#[test]
fn duplicates_and_id_columns_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let frame = read_raw_csv(write_fixture(&dir)).unwrap();

    let (table, _) = preprocess(frame, &config(100.0)).unwrap();

    // 8 raw rows, one exact duplicate.
    assert_eq!(table.nrows(), 7);
    assert!(table.col_index("Booking_ID").is_none());
    assert_eq!(table.ncols(), 5);
}

#[test]
fn categorical_columns_become_small_non_negative_codes() {
    let dir = tempfile::tempdir().unwrap();
    let frame = read_raw_csv(write_fixture(&dir)).unwrap();

    let (table, encodings) = preprocess(frame, &config(100.0)).unwrap();

    for col in ["type_of_meal_plan", "market_segment_type", "booking_status"] {
        let idx = table.col_index(col).unwrap();
        let n_classes = encodings[col].len() as f64;
        for &v in table.column(idx) {
            assert!(v >= 0.0 && v < n_classes, "{} has code {}", col, v);
            assert_eq!(v.fract(), 0.0);
        }
    }

    // Sorted-unique assignment: Canceled < Not_Canceled.
    assert_eq!(encodings["booking_status"]["Canceled"], 0);
    assert_eq!(encodings["booking_status"]["Not_Canceled"], 1);
}

// ---------------------------------------------------------------------------
// Skew handling
// ---------------------------------------------------------------------------

#[test]
fn skewed_column_is_log_transformed_others_untouched() {
    let dir = tempfile::tempdir().unwrap();

    let frame = read_raw_csv(write_fixture(&dir)).unwrap();
    let (untransformed, _) = preprocess(frame, &config(100.0)).unwrap();

    let frame = read_raw_csv(write_fixture(&dir)).unwrap();
    let (transformed, _) = preprocess(frame, &config(1.5)).unwrap();

    // lead_time is heavily right-skewed by the 400 outlier.
    let lead = untransformed.col_index("lead_time").unwrap();
    for (&orig, &now) in untransformed
        .column(lead)
        .iter()
        .zip(transformed.column(lead))
    {
        assert!((now - orig.ln_1p()).abs() < 1e-12);
        assert!(orig >= 0.0);
    }

    // avg_price_per_room stays below the threshold and is untouched.
    let price = untransformed.col_index("avg_price_per_room").unwrap();
    assert_eq!(
        untransformed.column(price).to_vec(),
        transformed.column(price).to_vec()
    );
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn missing_categorical_column_is_a_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.csv");
    std::fs::write(&path, "lead_time,booking_status\n5,Canceled\n").unwrap();
    let frame = read_raw_csv(&path).unwrap();

    let err = preprocess(frame, &config(100.0)).unwrap_err();
    assert!(err.to_string().contains("type_of_meal_plan"), "{err}");
}

#[test]
fn non_numeric_cell_in_numeric_column_is_a_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.csv");
    std::fs::write(
        &path,
        "lead_time,type_of_meal_plan,market_segment_type,avg_price_per_room,booking_status\n\
         oops,Meal Plan 1,Online,100.0,Canceled\n",
    )
    .unwrap();
    let frame = read_raw_csv(&path).unwrap();

    let err = preprocess(frame, &config(100.0)).unwrap_err();
    assert!(err.to_string().contains("lead_time"), "{err}");
}
