use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use oncorisk_classifiers::config::{ModelConfig, ModelType};
use oncorisk_classifiers::io::LoaderConfig;
use oncorisk_classifiers::preprocessing::Standardization;
use oncorisk_classifiers::resampling::Adasyn;

/// Parameters for a full analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub loader: LoaderConfig,
    pub split: SplitConfig,
    pub cross_validation: CrossValidationConfig,
    pub resampling: ResamplingConfig,
    pub models: Vec<ModelConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train_fraction: f64,
    pub seed: u64,
    pub standardization: Standardization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossValidationConfig {
    pub folds: usize,
    pub repeats: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResamplingConfig {
    /// Skip ADASYN and evaluate on the original training partition.
    pub enabled: bool,
    pub beta: f64,
    pub k_neighbors: usize,
    pub seed: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            split: SplitConfig::default(),
            cross_validation: CrossValidationConfig::default(),
            resampling: ResamplingConfig::default(),
            models: ModelConfig::defaults(1),
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.7,
            seed: 1,
            standardization: Standardization::default(),
        }
    }
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        Self {
            folds: 5,
            repeats: 5,
            seed: 1,
        }
    }
}

impl Default for ResamplingConfig {
    fn default() -> Self {
        let adasyn = Adasyn::default();
        Self {
            enabled: true,
            beta: adasyn.beta,
            k_neighbors: adasyn.k_neighbors,
            seed: adasyn.seed,
        }
    }
}

impl ResamplingConfig {
    pub fn adasyn(&self) -> Adasyn {
        Adasyn {
            beta: self.beta,
            k_neighbors: self.k_neighbors,
            seed: self.seed,
        }
    }
}

impl AnalysisConfig {
    /// Use one seed for the split, the folds, the resampler and every model.
    pub fn set_seed(&mut self, seed: u64) {
        self.split.seed = seed;
        self.cross_validation.seed = seed;
        self.resampling.seed = seed;
        for model in &mut self.models {
            model.seed = seed;
        }
    }

    /// Keep only the models of `model_type`, or add it with its defaults
    /// when it is not configured.
    pub fn restrict_models(&mut self, model_type: ModelType) {
        let seed = self.split.seed;
        let name = model_type.name();
        self.models.retain(|m| m.model_type.name() == name);
        if self.models.is_empty() {
            self.models.push(ModelConfig::new(seed, model_type));
        }
    }
}

/// Load an analysis configuration from a JSON file.
pub fn load_analysis_config<P: AsRef<Path>>(path: P) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: AnalysisConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}
