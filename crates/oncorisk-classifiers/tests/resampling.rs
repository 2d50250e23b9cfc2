//! Integration tests for ADASYN rebalancing.

use oncorisk_classifiers::data_handling::{Diagnosis, Frame, Origin};
use oncorisk_classifiers::error::ClassifierError;
use oncorisk_classifiers::math::Array2;
use oncorisk_classifiers::resampling::{balance, Adasyn};

use Diagnosis::{Cancer, NoCancer};

fn frame(rows: &[(f64, f64, Diagnosis)]) -> Frame {
    let values: Vec<f64> = rows.iter().flat_map(|&(a, b, _)| [a, b]).collect();
    let x = Array2::from_shape_vec((rows.len(), 2), values).unwrap();
    let y = rows.iter().map(|&(_, _, d)| d).collect();
    Frame::new(vec!["Age".to_string(), "Smokes".to_string()], x, y).unwrap()
}

/// Five No Cancer and two Cancer training rows.
fn toy_train() -> Frame {
    frame(&[
        (0.0, 0.0, NoCancer),
        (0.5, 0.2, NoCancer),
        (1.0, 0.1, NoCancer),
        (0.2, 0.9, NoCancer),
        (0.8, 0.7, NoCancer),
        (3.0, 3.0, Cancer),
        (4.0, 2.0, Cancer),
    ])
}

fn wider_train() -> Frame {
    let mut rows = Vec::new();
    for i in 0..12 {
        let v = i as f64;
        rows.push((v, (v * 0.7).sin(), NoCancer));
    }
    for i in 0..5 {
        let v = i as f64;
        rows.push((6.0 + v, 1.0 + v * 0.3, Cancer));
    }
    frame(&rows)
}

#[test]
fn toy_scenario_creates_exactly_the_gap() {
    let train = toy_train();
    let resampled = Adasyn::default()
        .with_beta(1.0)
        .with_k_neighbors(2)
        .with_seed(1)
        .balance(&train)
        .unwrap();

    assert_eq!(resampled.synthetic_count, 3);
    assert_eq!(resampled.frame.count(Cancer), 5);
    assert_eq!(resampled.frame.count(NoCancer), 5);
    assert_eq!(resampled.frame.synthetic_count(), 3);

    // each Cancer row has a single same-class neighbour
    assert_eq!(resampled.degraded.len(), 2);
    for entry in &resampled.degraded {
        match entry {
            ClassifierError::InsufficientNeighbors {
                available,
                requested,
                ..
            } => {
                assert_eq!(*available, 1);
                assert_eq!(*requested, 2);
            }
            other => panic!("unexpected degradation entry {:?}", other),
        }
    }
}

#[test]
fn originals_come_first_and_are_untouched() {
    let train = toy_train();
    let resampled = balance(&train, 1.0, 2, 5).unwrap();
    let n = train.nrows();
    assert_eq!(resampled.frame.x.select_rows(&(0..n).collect::<Vec<_>>()), train.x);
    assert_eq!(&resampled.frame.y[..n], &train.y[..]);
    assert!(resampled.frame.origin[n..].iter().all(Origin::is_synthetic));
}

#[test]
fn synthetic_rows_lie_between_their_parents() {
    let train = wider_train();
    let resampled = balance(&train, 1.0, 3, 11).unwrap();
    let out = &resampled.frame;
    assert!(resampled.synthetic_count > 0);

    for (i, origin) in out.origin.iter().enumerate() {
        if let Origin::Synthetic { source, neighbor } = *origin {
            assert_eq!(out.y[i], Cancer);
            assert_eq!(train.y[source], Cancer);
            assert_eq!(train.y[neighbor], Cancer);
            for c in 0..out.ncols() {
                let (a, b) = (train.x[(source, c)], train.x[(neighbor, c)]);
                let v = out.x[(i, c)];
                assert!(
                    v >= a.min(b) - 1e-12 && v <= a.max(b) + 1e-12,
                    "row {} column {}: {} outside [{}, {}]",
                    i,
                    c,
                    v,
                    a,
                    b
                );
            }
        }
    }
}

#[test]
fn beta_one_balances_the_classes() {
    let resampled = balance(&wider_train(), 1.0, 3, 2).unwrap();
    assert_eq!(resampled.synthetic_count, 7);
    assert_eq!(resampled.frame.count(Cancer), resampled.frame.count(NoCancer));
    assert!(resampled.degraded.is_empty());
}

#[test]
fn partial_beta_rounds_the_target() {
    // round(0.5 * 7) = 4
    let resampled = balance(&wider_train(), 0.5, 3, 2).unwrap();
    assert_eq!(resampled.synthetic_count, 4);
    assert_eq!(resampled.frame.count(Cancer), 9);
}

#[test]
fn beta_zero_leaves_the_training_set_unchanged() {
    let train = toy_train();
    let resampled = balance(&train, 0.0, 5, 1).unwrap();
    assert_eq!(resampled.synthetic_count, 0);
    assert_eq!(resampled.frame.x, train.x);
    assert_eq!(resampled.frame.y, train.y);
}

#[test]
fn resampling_is_deterministic_for_a_seed() {
    let train = wider_train();
    let a = balance(&train, 1.0, 3, 8).unwrap();
    let b = balance(&train, 1.0, 3, 8).unwrap();
    assert_eq!(a.frame.x, b.frame.x);
    assert_eq!(a.frame.origin, b.frame.origin);
}

#[test]
fn lone_minority_row_is_copied() {
    let train = frame(&[
        (0.0, 0.0, NoCancer),
        (1.0, 0.0, NoCancer),
        (2.0, 0.0, NoCancer),
        (5.0, 5.0, Cancer),
    ]);
    let resampled = balance(&train, 1.0, 2, 1).unwrap();
    assert_eq!(resampled.synthetic_count, 2);
    for i in 4..6 {
        assert_eq!(resampled.frame.x.row(i), train.x.row(3));
    }
    assert_eq!(resampled.degraded.len(), 1);
}

#[test]
fn single_class_training_set_is_rejected() {
    let train = frame(&[(0.0, 0.0, NoCancer), (1.0, 1.0, NoCancer)]);
    assert!(matches!(balance(&train, 1.0, 5, 1), Err(ClassifierError::Data(_))));
}

#[test]
fn zero_neighbours_is_rejected() {
    assert!(matches!(
        balance(&toy_train(), 1.0, 0, 1),
        Err(ClassifierError::InvalidParameter(_))
    ));
}

#[test]
fn isolated_minority_spreads_synthetic_rows_evenly() {
    let mut rows: Vec<(f64, f64, Diagnosis)> = (0..9)
        .map(|i| ((i % 3) as f64, (i / 3) as f64, NoCancer))
        .collect();
    // far from every No Cancer row, so each one's neighbours are all Cancer
    rows.extend([(10.0, 10.0, Cancer), (10.0, 11.0, Cancer), (11.0, 10.0, Cancer)]);
    let train = frame(&rows);

    let resampled = balance(&train, 1.0, 2, 4).unwrap();
    assert_eq!(resampled.synthetic_count, 6);
    for parent in 9..12 {
        let children = resampled
            .frame
            .origin
            .iter()
            .filter(|o| matches!(o, Origin::Synthetic { source, .. } if *source == parent))
            .count();
        assert_eq!(children, 2, "row {} produced {} synthetic rows", parent, children);
    }
}
