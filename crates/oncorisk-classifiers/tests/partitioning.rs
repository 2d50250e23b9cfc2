//! Integration tests for the stratified split and cross-validation folds.

use std::collections::BTreeSet;

use oncorisk_classifiers::cross_validation::{cross_validate, cv_accuracy, fold_assignments};
use oncorisk_classifiers::data_handling::{Diagnosis, Frame};
use oncorisk_classifiers::error::{ClassifierError, Result};
use oncorisk_classifiers::math::Array2;
use oncorisk_classifiers::models::classifier_trait::{ClassifierModel, Prediction};
use oncorisk_classifiers::preprocessing::Standardization;
use oncorisk_classifiers::split::{stratified_indices, stratified_split};

use Diagnosis::{Cancer, NoCancer};

/// Ten records, seven without and three with a diagnosis.
fn toy_frame() -> Frame {
    let y = vec![
        NoCancer, NoCancer, Cancer, NoCancer, NoCancer, Cancer, NoCancer, NoCancer, Cancer, NoCancer,
    ];
    let values: Vec<f64> = (0..10).flat_map(|i| [i as f64, (i * i) as f64]).collect();
    let x = Array2::from_shape_vec((10, 2), values).unwrap();
    Frame::new(vec!["Age".to_string(), "Num of pregnancies".to_string()], x, y).unwrap()
}

struct AlwaysNoCancer;

impl ClassifierModel for AlwaysNoCancer {
    fn fit_predict(&self, _train: &Frame, test: &Frame) -> Result<Prediction> {
        Ok(Prediction::from_scores(vec![0.0; test.nrows()]))
    }

    fn name(&self) -> &str {
        "AlwaysNoCancer"
    }
}

/// Always answers with a single score, whatever the test size.
struct OneScore;

impl ClassifierModel for OneScore {
    fn fit_predict(&self, _train: &Frame, _test: &Frame) -> Result<Prediction> {
        Ok(Prediction::from_scores(vec![0.0]))
    }
}

// ---------------------------------------------------------------------------
// Split
// ---------------------------------------------------------------------------

#[test]
fn toy_split_sizes_per_class() {
    let split = stratified_split(&toy_frame(), 0.7, 1, Standardization::SelfStats).unwrap();
    let train = &split.train.frame;
    let test = &split.test.frame;
    assert_eq!((train.count(NoCancer), train.count(Cancer)), (5, 2));
    assert_eq!((test.count(NoCancer), test.count(Cancer)), (2, 1));
}

#[test]
fn split_partitions_the_records() {
    let split = stratified_split(&toy_frame(), 0.7, 1, Standardization::SelfStats).unwrap();
    let train: BTreeSet<usize> = split.train.frame.record_ids().into_iter().collect();
    let test: BTreeSet<usize> = split.test.frame.record_ids().into_iter().collect();
    assert!(train.is_disjoint(&test));
    assert_eq!(train.union(&test).count(), 10);
}

#[test]
fn split_is_deterministic_for_a_seed() {
    let frame = toy_frame();
    let a = stratified_indices(&frame.y, 0.7, 42).unwrap();
    let b = stratified_indices(&frame.y, 0.7, 42).unwrap();
    assert_eq!(a, b);
}

#[test]
fn split_rejects_out_of_range_fraction() {
    let frame = toy_frame();
    assert!(matches!(
        stratified_indices(&frame.y, 1.0, 1),
        Err(ClassifierError::InvalidParameter(_))
    ));
}

#[test]
fn split_without_room_for_a_class_is_a_data_error() {
    let frame = toy_frame();
    // round(0.1 * 3) = 0 Cancer records for training
    assert!(matches!(
        stratified_indices(&frame.y, 0.1, 1),
        Err(ClassifierError::Data(_))
    ));
}

#[test]
fn self_stats_centre_each_partition() {
    let split = stratified_split(&toy_frame(), 0.7, 1, Standardization::SelfStats).unwrap();
    for partition in [&split.train, &split.test] {
        let column = partition.frame.x.column(0);
        let mean = column.iter().sum::<f64>() / column.len() as f64;
        assert!(mean.abs() < 1e-9, "partition mean {}", mean);
    }
}

#[test]
fn reference_stats_reuse_training_scaler() {
    let split = stratified_split(&toy_frame(), 0.7, 1, Standardization::ReferenceStats).unwrap();
    assert_eq!(split.test.scaler, split.train.scaler);
}

// ---------------------------------------------------------------------------
// Cross-validation
// ---------------------------------------------------------------------------

#[test]
fn toy_folds_hold_one_no_cancer_record_each() {
    let split = stratified_split(&toy_frame(), 0.7, 1, Standardization::SelfStats).unwrap();
    let train = &split.train.frame;
    let folds = fold_assignments(&train.y, 5, 1, 1).unwrap();
    assert_eq!(folds.len(), 5);

    let mut folds_with_cancer = 0;
    for fold in &folds {
        let no_cancer = fold.held_out.iter().filter(|&&i| train.y[i] == NoCancer).count();
        assert_eq!(no_cancer, 1, "fold {} holds {} No Cancer rows", fold.fold, no_cancer);
        if fold.held_out.iter().any(|&i| train.y[i] == Cancer) {
            folds_with_cancer += 1;
        }
    }
    assert_eq!(folds_with_cancer, 2);
}

#[test]
fn every_row_is_held_out_once_per_repeat() {
    let frame = toy_frame();
    let folds = fold_assignments(&frame.y, 3, 4, 9).unwrap();
    for repeat in 0..4 {
        let mut seen = vec![0usize; frame.nrows()];
        for fold in folds.iter().filter(|f| f.repeat == repeat) {
            for &i in &fold.held_out {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1), "repeat {}: {:?}", repeat, seen);
    }
}

#[test]
fn folds_are_deterministic_for_a_seed() {
    let frame = toy_frame();
    assert_eq!(
        fold_assignments(&frame.y, 5, 2, 3).unwrap(),
        fold_assignments(&frame.y, 5, 2, 3).unwrap()
    );
}

#[test]
fn fold_parameters_are_validated() {
    let frame = toy_frame();
    assert!(fold_assignments(&frame.y, 1, 1, 1).is_err());
    assert!(fold_assignments(&frame.y, 5, 0, 1).is_err());
    assert!(fold_assignments(&frame.y, 11, 1, 1).is_err());
}

#[test]
fn cross_validate_scores_every_fold() {
    let frame = toy_frame();
    let report = cross_validate(&AlwaysNoCancer, &frame, 5, 2, 1).unwrap();
    assert_eq!(report.folds.len(), 10);
    assert_eq!(report.model, "AlwaysNoCancer");
    // 7 of 10 rows are No Cancer in every repeat; each fold holds two rows
    let held: usize = report.folds.iter().map(|f| f.held_out).sum();
    assert_eq!(held, 20);
    assert!((report.mean_accuracy() - 0.7).abs() < 1e-12);
    assert_eq!(cv_accuracy(&AlwaysNoCancer, &frame, 5, 2, 1).unwrap(), report.mean_accuracy());
}

#[test]
fn misaligned_fold_prediction_is_a_data_error() {
    assert!(matches!(
        cross_validate(&OneScore, &toy_frame(), 5, 1, 1),
        Err(ClassifierError::Data(_))
    ));
}
