//! Classification metrics: accuracy, confusion matrix and ROC curves.
use serde::Serialize;

use crate::data_handling::Diagnosis;

/// Share of positions where `predicted` matches `truth`.
///
/// Returns 0 for empty input.
pub fn accuracy(predicted: &[Diagnosis], truth: &[Diagnosis]) -> f64 {
    assert_eq!(
        predicted.len(),
        truth.len(),
        "predictions and labels must have equal lengths"
    );
    if truth.is_empty() {
        return 0.0;
    }
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    correct as f64 / truth.len() as f64
}

/// Two-class confusion matrix with `Cancer` as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(predicted: &[Diagnosis], truth: &[Diagnosis]) -> Self {
        assert_eq!(
            predicted.len(),
            truth.len(),
            "predictions and labels must have equal lengths"
        );
        let mut cm = ConfusionMatrix::default();
        for (&p, &t) in predicted.iter().zip(truth) {
            match (p.is_cancer(), t.is_cancer()) {
                (true, true) => cm.true_positive += 1,
                (true, false) => cm.false_positive += 1,
                (false, false) => cm.true_negative += 1,
                (false, true) => cm.false_negative += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// One operating point of a ROC curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocPoint {
    /// Records scoring at or above this value are called `Cancer`.
    pub threshold: f64,
    pub false_positive_rate: f64,
    pub true_positive_rate: f64,
}

/// ROC curve over every distinct score, highest threshold first.
///
/// The curve starts at (0, 0) with an infinite threshold and ends at (1, 1)
/// once the lowest score is reached. A rate whose denominator is empty (no
/// positives or no negatives) stays at 0.
pub fn roc_curve(scores: &[f64], truth: &[Diagnosis]) -> Vec<RocPoint> {
    assert_eq!(
        scores.len(),
        truth.len(),
        "scores and labels must have equal lengths"
    );
    let positives = truth.iter().filter(|t| t.is_cancer()).count();
    let negatives = truth.len() - positives;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut curve = vec![RocPoint {
        threshold: f64::INFINITY,
        false_positive_rate: 0.0,
        true_positive_rate: 0.0,
    }];

    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < order.len() {
        let threshold = scores[order[i]];
        // the first record always joins, so a NaN score still advances
        loop {
            if truth[order[i]].is_cancer() {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
            if i == order.len() || scores[order[i]] != threshold {
                break;
            }
        }
        curve.push(RocPoint {
            threshold,
            false_positive_rate: ratio(fp, negatives),
            true_positive_rate: ratio(tp, positives),
        });
    }

    curve
}

/// Area under a ROC curve by the trapezoidal rule.
pub fn auc(curve: &[RocPoint]) -> f64 {
    curve
        .windows(2)
        .map(|w| {
            let dx = w[1].false_positive_rate - w[0].false_positive_rate;
            dx * (w[1].true_positive_rate + w[0].true_positive_rate) / 2.0
        })
        .sum()
}
