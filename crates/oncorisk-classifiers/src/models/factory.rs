use crate::config::{ModelConfig, ModelType};
use crate::models::boosting::BoostingClassifier;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::logistic::LogisticClassifier;
use crate::models::random_forest::RandomForestClassifier;

/// Build a boxed classifier model from a `ModelConfig`.
pub fn build_model(params: &ModelConfig) -> Box<dyn ClassifierModel> {
    match params.model_type {
        ModelType::Logistic { .. } => Box::new(LogisticClassifier::new(params.clone())),
        ModelType::RandomForest { .. } => Box::new(RandomForestClassifier::new(params.clone())),
        ModelType::Boosting { .. } => Box::new(BoostingClassifier::new(params.clone())),
    }
}

/// Build every configured model, in configuration order.
pub fn build_models(params: &[ModelConfig]) -> Vec<Box<dyn ClassifierModel>> {
    params.iter().map(build_model).collect()
}
