use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Central configuration for models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Seed for every random draw the model makes while fitting.
    pub seed: u64,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    Logistic {
        max_iter: usize,
        tolerance: f64,
        l2_penalty: f64,
    },
    RandomForest {
        n_trees: usize,
        /// Features sampled per split; `None` means floor(sqrt(p)).
        max_features: Option<usize>,
        max_depth: Option<usize>,
        min_samples_leaf: usize,
    },
    Boosting {
        n_rounds: usize,
        shrinkage: f64,
        interaction_depth: usize,
        bag_fraction: f64,
        min_obs_in_node: usize,
        /// Folds of the internal cross-validation that picks the round count.
        cv_folds: usize,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::default_boosting()
    }
}

impl ModelType {
    pub fn default_logistic() -> Self {
        ModelType::Logistic {
            max_iter: 25,
            tolerance: 1e-8,
            l2_penalty: 1e-6,
        }
    }

    pub fn default_random_forest() -> Self {
        ModelType::RandomForest {
            n_trees: 500,
            max_features: None,
            max_depth: None,
            min_samples_leaf: 1,
        }
    }

    pub fn default_boosting() -> Self {
        ModelType::Boosting {
            n_rounds: 5000,
            shrinkage: 0.01,
            interaction_depth: 1,
            bag_fraction: 0.5,
            min_obs_in_node: 10,
            cv_folds: 3,
        }
    }

    /// Display name used in logs and metric tables.
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::Logistic { .. } => "Logistic",
            ModelType::RandomForest { .. } => "RandomForest",
            ModelType::Boosting { .. } => "Boosting",
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logistic" | "glm" => Ok(ModelType::default_logistic()),
            "random_forest" | "randomforest" | "rf" => Ok(ModelType::default_random_forest()),
            "boosting" | "gbm" => Ok(ModelType::default_boosting()),
            _ => Err(format!(
                "Unknown model type: {}. Expected one of logistic, random_forest, boosting",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(seed: u64, model_type: ModelType) -> Self {
        Self { seed, model_type }
    }

    /// The three model variants with their default hyper-parameters.
    pub fn defaults(seed: u64) -> Vec<ModelConfig> {
        vec![
            ModelConfig::new(seed, ModelType::default_logistic()),
            ModelConfig::new(seed, ModelType::default_random_forest()),
            ModelConfig::new(seed, ModelType::default_boosting()),
        ]
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            model_type: ModelType::default(),
        }
    }
}
