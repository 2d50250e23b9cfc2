use crate::data_handling::{Diagnosis, Frame};
use crate::error::{ClassifierError, Result};

/// Labels and scores for the rows of a test frame, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub labels: Vec<Diagnosis>,
    /// Estimated probability of `Cancer`, used for ROC curves.
    pub scores: Vec<f64>,
}

impl Prediction {
    /// Call `Cancer` wherever the score exceeds 0.5.
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let labels = scores
            .iter()
            .map(|&s| {
                if s > 0.5 {
                    Diagnosis::Cancer
                } else {
                    Diagnosis::NoCancer
                }
            })
            .collect();
        Prediction { labels, scores }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Fail unless there is one finite score and one label per record.
    pub fn check_aligned(&self, records: usize) -> Result<()> {
        if self.labels.len() != records || self.scores.len() != records {
            return Err(ClassifierError::Data(format!(
                "{} labels and {} scores for {} records",
                self.labels.len(),
                self.scores.len(),
                records
            )));
        }
        if let Some(pos) = self.scores.iter().position(|s| !s.is_finite()) {
            return Err(ClassifierError::Data(format!(
                "non-finite score {} for record {}",
                self.scores[pos], pos
            )));
        }
        Ok(())
    }
}

/// The single contract shared by every model variant.
///
/// `fit_predict` fits a fresh model on `train` and predicts `test`; nothing
/// is kept between calls, so one instance can serve many folds at once.
pub trait ClassifierModel: Send + Sync {
    fn fit_predict(&self, train: &Frame, test: &Frame) -> Result<Prediction>;

    /// Human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Constant prediction used when the training rows hold a single class.
pub(crate) fn single_class_prediction(train: &Frame, test: &Frame) -> Option<Prediction> {
    let first = *train.y.first()?;
    if train.y.iter().any(|&label| label != first) {
        return None;
    }
    log::debug!(
        "Training rows hold only '{}'; predicting it for all {} test records",
        first,
        test.nrows()
    );
    Some(Prediction {
        labels: vec![first; test.nrows()],
        scores: vec![first.code(); test.nrows()],
    })
}
