//! Stratified train/test partitioning.
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::data_handling::{Diagnosis, Frame};
use crate::error::{ClassifierError, Result};
use crate::preprocessing::{standardize, Scaler, Standardization};

/// A standardized partition and the statistics it was scaled with.
#[derive(Debug, Clone)]
pub struct Partition {
    pub frame: Frame,
    pub scaler: Scaler,
}

#[derive(Debug, Clone)]
pub struct Split {
    pub train: Partition,
    pub test: Partition,
}

/// Row positions of the training and test partitions.
///
/// Within each class (in `Diagnosis::ALL` order) the rows are shuffled and
/// the first `round(train_fraction * n_class)` go to training. Both lists
/// come back in ascending row order.
pub fn stratified_indices(
    y: &[Diagnosis],
    train_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(ClassifierError::InvalidParameter(format!(
            "train_fraction must lie in (0, 1), got {}",
            train_fraction
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in Diagnosis::ALL {
        let mut rows: Vec<usize> = y
            .iter()
            .enumerate()
            .filter_map(|(i, &label)| if label == class { Some(i) } else { None })
            .collect();
        let n_train = (rows.len() as f64 * train_fraction).round() as usize;
        if n_train == 0 || n_train == rows.len() {
            return Err(ClassifierError::Data(format!(
                "stratified split leaves a partition without '{}' records ({} available)",
                class,
                rows.len()
            )));
        }
        rows.shuffle(&mut rng);
        train.extend_from_slice(&rows[..n_train]);
        test.extend_from_slice(&rows[n_train..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Partition `frame` by class and standardize both partitions.
pub fn stratified_split(
    frame: &Frame,
    train_fraction: f64,
    seed: u64,
    standardization: Standardization,
) -> Result<Split> {
    let (train_rows, test_rows) = stratified_indices(&frame.y, train_fraction, seed)?;

    let mut train = frame.select(&train_rows);
    let mut test = frame.select(&test_rows);

    let (train_x, train_scaler) = standardize(&train.x, Standardization::SelfStats, None)?;
    let (test_x, test_scaler) = standardize(&test.x, standardization, Some(&train_scaler))?;
    train.x = train_x;
    test.x = test_x;

    train.log_summary("Training partition");
    test.log_summary("Test partition");

    Ok(Split {
        train: Partition {
            frame: train,
            scaler: train_scaler,
        },
        test: Partition {
            frame: test,
            scaler: test_scaler,
        },
    })
}
