//! Repeated stratified k-fold cross-validation.
//!
//! Fold membership depends only on the labels, the fold/repeat counts and
//! the seed, so two models compared under the same seed see the same folds.
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::data_handling::{Diagnosis, Frame};
use crate::error::{ClassifierError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::stats::accuracy;

/// Held-out rows of one fold of one repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldAssignment {
    pub repeat: usize,
    pub fold: usize,
    /// Row positions, ascending
    pub held_out: Vec<usize>,
}

/// Accuracy of one fold.
#[derive(Debug, Clone, Serialize)]
pub struct FoldScore {
    pub repeat: usize,
    pub fold: usize,
    pub held_out: usize,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CvReport {
    pub model: String,
    pub folds: Vec<FoldScore>,
}

impl CvReport {
    /// Arithmetic mean of the per-fold accuracies.
    pub fn mean_accuracy(&self) -> f64 {
        if self.folds.is_empty() {
            return 0.0;
        }
        self.folds.iter().map(|f| f.accuracy).sum::<f64>() / self.folds.len() as f64
    }
}

/// Generate `folds x repeats` stratified held-out sets.
///
/// Each repeat shuffles every class and deals its rows round-robin over the
/// folds; the dealing position carries over from one class to the next so
/// fold sizes differ by at most one. A class with fewer rows than folds ends
/// up in only some of the folds.
pub fn fold_assignments(
    y: &[Diagnosis],
    folds: usize,
    repeats: usize,
    seed: u64,
) -> Result<Vec<FoldAssignment>> {
    if folds < 2 {
        return Err(ClassifierError::InvalidParameter(format!(
            "at least 2 folds are required, got {}",
            folds
        )));
    }
    if repeats == 0 {
        return Err(ClassifierError::InvalidParameter(
            "at least 1 repeat is required".to_string(),
        ));
    }
    if y.len() < folds {
        return Err(ClassifierError::InvalidParameter(format!(
            "{} records cannot fill {} folds",
            y.len(),
            folds
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut assignments = Vec::with_capacity(folds * repeats);

    for repeat in 0..repeats {
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); folds];
        let mut offset = 0;
        for class in Diagnosis::ALL {
            let mut rows: Vec<usize> = y
                .iter()
                .enumerate()
                .filter_map(|(i, &label)| if label == class { Some(i) } else { None })
                .collect();
            rows.shuffle(&mut rng);
            let n = rows.len();
            for (i, row) in rows.into_iter().enumerate() {
                buckets[(offset + i) % folds].push(row);
            }
            offset = (offset + n) % folds;
        }

        for (fold, mut held_out) in buckets.into_iter().enumerate() {
            held_out.sort_unstable();
            log::trace!(
                "Repeat {} fold {}: holding out {} records",
                repeat,
                fold,
                held_out.len()
            );
            assignments.push(FoldAssignment {
                repeat,
                fold,
                held_out,
            });
        }
    }

    Ok(assignments)
}

/// Fit `model` on each fold's complement and score it on the held-out rows.
///
/// Folds run in parallel; scores come back in assignment order.
pub fn cross_validate(
    model: &dyn ClassifierModel,
    train: &Frame,
    folds: usize,
    repeats: usize,
    seed: u64,
) -> Result<CvReport> {
    let assignments = fold_assignments(&train.y, folds, repeats, seed)?;
    log::info!(
        "Cross-validating {} over {} folds x {} repeats",
        model.name(),
        folds,
        repeats
    );

    let scores = assignments
        .par_iter()
        .map(|assignment| {
            let fit_rows = train.complement(&assignment.held_out);
            let fit_frame = train.select(&fit_rows);
            let held_frame = train.select(&assignment.held_out);

            let prediction = model.fit_predict(&fit_frame, &held_frame)?;
            prediction.check_aligned(held_frame.nrows())?;
            let fold_accuracy = accuracy(&prediction.labels, &held_frame.y);
            log::debug!(
                "{} repeat {} fold {}: accuracy {:.4} on {} records",
                model.name(),
                assignment.repeat,
                assignment.fold,
                fold_accuracy,
                held_frame.nrows()
            );

            Ok(FoldScore {
                repeat: assignment.repeat,
                fold: assignment.fold,
                held_out: held_frame.nrows(),
                accuracy: fold_accuracy,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CvReport {
        model: model.name().to_string(),
        folds: scores,
    })
}

/// Mean held-out accuracy over all folds and repeats.
pub fn cv_accuracy(
    model: &dyn ClassifierModel,
    train: &Frame,
    folds: usize,
    repeats: usize,
    seed: u64,
) -> Result<f64> {
    Ok(cross_validate(model, train, folds, repeats, seed)?.mean_accuracy())
}
