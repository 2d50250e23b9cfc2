use serde::Serialize;

use crate::data_handling::{Diagnosis, Frame};
use crate::error::Result;
use crate::models::classifier_trait::{ClassifierModel, Prediction};
use crate::stats::{auc, roc_curve, ConfusionMatrix, RocPoint};

/// Held-out metrics of one fitted model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelMetrics {
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub roc: Vec<RocPoint>,
    pub auc: f64,
}

#[derive(Debug)]
pub struct ModelEvaluation {
    pub model: String,
    /// A failed fit is kept here instead of aborting the other models.
    pub outcome: Result<ModelMetrics>,
}

#[derive(Debug, Default)]
pub struct EvaluationReport {
    pub entries: Vec<ModelEvaluation>,
}

impl EvaluationReport {
    pub fn get(&self, model: &str) -> Option<&ModelEvaluation> {
        self.entries.iter().find(|e| e.model == model)
    }
}

/// Score a prediction against the true labels, `Cancer` being positive.
pub fn score_prediction(prediction: &Prediction, truth: &[Diagnosis]) -> Result<ModelMetrics> {
    prediction.check_aligned(truth.len())?;
    let confusion = ConfusionMatrix::from_labels(&prediction.labels, truth);
    let roc = roc_curve(&prediction.scores, truth);
    Ok(ModelMetrics {
        confusion,
        accuracy: confusion.accuracy(),
        precision: confusion.precision(),
        recall: confusion.recall(),
        f1: confusion.f1(),
        auc: auc(&roc),
        roc,
    })
}

/// Fit every model on `train` and score it on `test`.
pub fn evaluate(models: &[Box<dyn ClassifierModel>], train: &Frame, test: &Frame) -> EvaluationReport {
    let entries = models
        .iter()
        .map(|model| {
            log::info!("Evaluating {} on {} test records", model.name(), test.nrows());
            let outcome = model
                .fit_predict(train, test)
                .and_then(|prediction| score_prediction(&prediction, &test.y));
            match &outcome {
                Ok(m) => log::info!(
                    "{}: accuracy {:.4}, precision {:.4}, recall {:.4}, F1 {:.4}, AUC {:.4}",
                    model.name(),
                    m.accuracy,
                    m.precision,
                    m.recall,
                    m.f1,
                    m.auc
                ),
                Err(e) => log::error!("{} failed: {}", model.name(), e),
            }
            ModelEvaluation {
                model: model.name().to_string(),
                outcome,
            }
        })
        .collect();

    EvaluationReport { entries }
}
