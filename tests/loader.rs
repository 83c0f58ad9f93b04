//! Integration tests for the survey loader (label derivation, projection).

mod common;

use segment_classifiers::config::LoaderConfig;
use segment_classifiers::data_handling::ColumnData;
use segment_classifiers::io::{read_survey, read_survey_csv};
use segment_classifiers::PipelineError;

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[test]
fn projects_configured_columns_in_order() {
    let csv = common::survey_csv(12);
    let data = read_survey(csv.as_bytes(), &LoaderConfig::default()).unwrap();

    assert_eq!(data.nrows(), 12);
    assert_eq!(
        data.column_names(),
        vec![
            "age",
            "income",
            "brand_affinity",
            "price_sensitivity",
            "visits",
            "gender",
            "region",
            "segment",
        ]
    );
    assert!(data.column("id").is_none());
    assert!(data.column("status").is_none());
    assert!(data.column("notes").is_none());
}

#[test]
fn derives_segment_labels_from_status_codes() {
    let csv = common::survey_csv(6);
    let data = read_survey(csv.as_bytes(), &LoaderConfig::default()).unwrap();
    let labels = data.labels("segment").unwrap();
    assert_eq!(
        labels,
        &["own", "shopping", "considering", "own", "shopping", "considering"]
    );
}

#[test]
fn casts_numeric_and_categorical_columns() {
    let csv = common::survey_csv(4);
    let data = read_survey(csv.as_bytes(), &LoaderConfig::default()).unwrap();

    match &data.column("income").unwrap().data {
        ColumnData::Numeric(v) => assert_eq!(v, &vec![40.0, 40.5, 41.0, 41.5]),
        other => panic!("income should be numeric, got {:?}", other),
    }
    assert!(data.column("gender").unwrap().is_categorical());
    assert_eq!(
        data.column("region").unwrap().as_categorical().unwrap(),
        &["north", "south", "north", "south"]
    );
}

#[test]
fn custom_label_mapping_and_delimiter() {
    let csv = "code;x;grp\n7;1.5;a\n8;2.5;b\n7;3.5;a\n";
    let config = LoaderConfig {
        label_source: "code".to_string(),
        label_name: "class".to_string(),
        label_codes: [(7, "yes".to_string()), (8, "no".to_string())]
            .into_iter()
            .collect(),
        numeric: vec!["x".to_string()],
        categorical: vec!["grp".to_string()],
        delimiter: b';',
    };
    let data = read_survey(csv.as_bytes(), &config).unwrap();
    assert_eq!(data.column_names(), vec!["x", "grp", "class"]);
    assert_eq!(data.labels("class").unwrap(), &["yes", "no", "yes"]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn unmapped_code_is_schema_error() {
    let mut csv = common::survey_csv(3);
    csv.push_str("3,north,2,50,male,60,1,1,1,x\n");
    let err = read_survey(csv.as_bytes(), &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Schema(_)), "got {:?}", err);
    assert!(err.to_string().contains("row 4"), "got {}", err);
}

#[test]
fn missing_expected_column_is_schema_error() {
    let csv = "id,status,age,gender,brand_affinity,price_sensitivity,visits,region\n\
               0,1,30,male,1,1,1,north\n";
    let err = read_survey(csv.as_bytes(), &LoaderConfig::default()).unwrap_err();
    match err {
        PipelineError::Schema(msg) => assert!(msg.contains("income"), "got {}", msg),
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn non_numeric_value_is_schema_error() {
    let csv = "status,age,income,brand_affinity,price_sensitivity,visits,gender,region\n\
               1,thirty,50,1,1,1,male,north\n";
    let err = read_survey(csv.as_bytes(), &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Schema(_)), "got {:?}", err);
}

#[test]
fn ragged_row_is_data_access_error() {
    let csv = "status,age,income,brand_affinity,price_sensitivity,visits,gender,region\n\
               1,30,50,1,1,1,male\n";
    let err = read_survey(csv.as_bytes(), &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::DataAccess(_)), "got {:?}", err);
}

#[test]
fn unreadable_path_is_data_access_error() {
    let path = std::env::temp_dir().join("segment_classifiers_no_such_dir/survey.csv");
    let err = read_survey_csv(&path, &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::DataAccess(_)), "got {:?}", err);
}

#[test]
fn reads_from_disk() {
    let path = std::env::temp_dir().join(format!(
        "segment_classifiers_loader_{}.csv",
        std::process::id()
    ));
    std::fs::write(&path, common::survey_csv(9)).unwrap();
    let data = read_survey_csv(&path, &LoaderConfig::default()).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(data.nrows(), 9);
    assert_eq!(common::count_label(&data, "segment", "own"), 3);
}

#[test]
fn whole_number_codes_written_as_decimals_are_accepted() {
    let csv = "status,age,income,brand_affinity,price_sensitivity,visits,gender,region\n\
               1.0,30,50,1,1,1,male,north\n\
               4,31,51,2,2,2,female,south\n";
    let data = read_survey(csv.as_bytes(), &LoaderConfig::default()).unwrap();
    assert_eq!(data.labels("segment").unwrap(), &["own", "considering"]);
}

#[test]
fn fractional_code_is_schema_error() {
    let csv = "status,age,income,brand_affinity,price_sensitivity,visits,gender,region\n\
               1.5,30,50,1,1,1,male,north\n";
    let err = read_survey(csv.as_bytes(), &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Schema(_)), "got {:?}", err);
}

#[test]
fn non_finite_numeric_is_schema_error() {
    for bad in ["NaN", "inf", "-inf"] {
        let csv = format!(
            "status,age,income,brand_affinity,price_sensitivity,visits,gender,region\n\
             1,30,{},1,1,1,male,north\n",
            bad
        );
        let err = read_survey(csv.as_bytes(), &LoaderConfig::default()).unwrap_err();
        match err {
            PipelineError::Schema(msg) => {
                assert!(msg.contains("row 1"), "got {}", msg);
                assert!(msg.contains("income"), "got {}", msg);
            }
            other => panic!("{}: expected schema error, got {:?}", bad, other),
        }
    }
}
