//! Integration tests for reading and imputing the risk-factor table.

use std::io::Write;

use oncorisk_classifiers::data_handling::Diagnosis;
use oncorisk_classifiers::error::ClassifierError;
use oncorisk_classifiers::io::{load_dataset, read_dataset, LoaderConfig};

fn read(text: &str) -> Result<oncorisk_classifiers::data_handling::Frame, ClassifierError> {
    read_dataset(text.as_bytes(), &LoaderConfig::default())
}

// ---------------------------------------------------------------------------
// Imputation
// ---------------------------------------------------------------------------

#[test]
fn missing_cells_take_the_column_median() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("risk_factors.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "Age,Smokes,Dx:Cancer,Dx").unwrap();
    writeln!(file, "20,0,0,0").unwrap();
    writeln!(file, "?,1,1,1").unwrap();
    writeln!(file, "40,,0,0").unwrap();
    writeln!(file, "30,1,0,0").unwrap();
    drop(file);

    let frame = load_dataset(&path).unwrap();
    assert_eq!(frame.feature_names, vec!["Age", "Smokes"]);
    assert_eq!(frame.nrows(), 4);
    // Age observed {20, 40, 30}, Smokes observed {0, 1, 1}
    assert_eq!(frame.x[(1, 0)], 30.0);
    assert_eq!(frame.x[(2, 1)], 1.0);
    assert!(frame.x.as_slice().iter().all(|v| v.is_finite()));
    assert_eq!(
        frame.y,
        vec![
            Diagnosis::NoCancer,
            Diagnosis::Cancer,
            Diagnosis::NoCancer,
            Diagnosis::NoCancer
        ]
    );
    assert_eq!(frame.record_ids(), vec![0, 1, 2, 3]);
}

#[test]
fn missing_target_is_imputed_before_relabelling() {
    let frame = read("Age,Dx\n10,0\n20,?\n30,0\n40,1\n").unwrap();
    // observed targets {0, 0, 1} -> median 0
    assert_eq!(frame.y[1], Diagnosis::NoCancer);
}

#[test]
fn custom_marker_and_delimiter() {
    let config = LoaderConfig {
        missing_marker: "NA".to_string(),
        delimiter: ';',
        drop_columns: Vec::new(),
        ..LoaderConfig::default()
    };
    let frame = read_dataset("Age;Dx\nNA;1\n4;0\n6;1\n".as_bytes(), &config).unwrap();
    assert_eq!(frame.x[(0, 0)], 5.0);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn non_numeric_cell_is_a_schema_error() {
    match read("Age,Dx\n20,0\nabc,1\n") {
        Err(ClassifierError::Schema { column, row, value }) => {
            assert_eq!(column, "Age");
            assert_eq!(row, 2);
            assert_eq!(value, "abc");
        }
        other => panic!("expected a schema error, got {:?}", other),
    }
}

#[test]
fn absent_target_column_is_a_data_error() {
    assert!(matches!(read("Age,Smokes\n1,0\n"), Err(ClassifierError::Data(_))));
}

#[test]
fn entirely_missing_target_is_a_data_error() {
    assert!(matches!(read("Age,Dx\n1,?\n2,?\n"), Err(ClassifierError::Data(_))));
}

#[test]
fn attribute_without_observations_is_a_data_error() {
    assert!(matches!(read("Age,Dx\n?,0\n?,1\n"), Err(ClassifierError::Data(_))));
}

#[test]
fn non_binary_target_is_a_data_error() {
    assert!(matches!(read("Age,Dx\n1,0\n2,2\n"), Err(ClassifierError::Data(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        load_dataset("/nonexistent/risk_factors.csv"),
        Err(ClassifierError::Io(_))
    ));
}
