//! End-to-end analysis: load, split, cross-validate, rebalance, evaluate.
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use oncorisk_classifiers::cross_validation::cross_validate;
use oncorisk_classifiers::data_handling::Frame;
use oncorisk_classifiers::evaluation::{evaluate, ModelMetrics};
use oncorisk_classifiers::io::load_dataset_with_config;
use oncorisk_classifiers::models::factory::build_models;
use oncorisk_classifiers::split::stratified_split;

use crate::analysis::config::AnalysisConfig;

/// Outcome of one model across cross-validation and the held-out test.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub model: String,
    pub cv_accuracy: Option<f64>,
    pub cv_error: Option<String>,
    pub test: Option<ModelMetrics>,
    pub test_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub generated_at: String,
    pub source: String,
    pub records: usize,
    pub train_records: usize,
    pub test_records: usize,
    pub synthetic_records: usize,
    /// Minority records resampled with fewer neighbours than requested.
    pub degraded_records: usize,
    pub models: Vec<ModelSummary>,
}

/// Run the full analysis on a risk-factor CSV file.
pub fn run_analysis<P: AsRef<Path>>(data_path: P, config: &AnalysisConfig) -> Result<AnalysisSummary> {
    let frame = load_dataset_with_config(&data_path, &config.loader).with_context(|| {
        format!(
            "Failed to load risk-factor table: {}",
            data_path.as_ref().display()
        )
    })?;
    run_on_frame(&frame, config, &data_path.as_ref().display().to_string())
}

/// Run the analysis on an already loaded table.
///
/// A model that fails during cross-validation or evaluation is reported in
/// its summary row; only split and resampling failures abort the run.
pub fn run_on_frame(frame: &Frame, config: &AnalysisConfig, source: &str) -> Result<AnalysisSummary> {
    if config.models.is_empty() {
        anyhow::bail!("No models configured");
    }

    let split = stratified_split(
        frame,
        config.split.train_fraction,
        config.split.seed,
        config.split.standardization,
    )
    .context("Failed to split the dataset")?;
    let train = &split.train.frame;
    let test = &split.test.frame;

    let models = build_models(&config.models);
    let cv = &config.cross_validation;
    let cv_results: Vec<_> = models
        .iter()
        .map(|model| {
            let report = cross_validate(model.as_ref(), train, cv.folds, cv.repeats, cv.seed);
            match &report {
                Ok(r) => log::info!(
                    "{}: mean CV accuracy {:.4} over {} folds",
                    r.model,
                    r.mean_accuracy(),
                    r.folds.len()
                ),
                Err(e) => log::error!("{} cross-validation failed: {}", model.name(), e),
            }
            report
        })
        .collect();

    let (fit_frame, synthetic_records, degraded_records) = if config.resampling.enabled {
        let resampled = config
            .resampling
            .adasyn()
            .balance(train)
            .context("Failed to rebalance the training partition")?;
        resampled.frame.log_summary("Resampled training partition");
        (resampled.frame, resampled.synthetic_count, resampled.degraded.len())
    } else {
        log::info!("Resampling disabled; evaluating on the original training partition");
        (train.clone(), 0, 0)
    };

    let report = evaluate(&models, &fit_frame, test);

    let summaries = models
        .iter()
        .zip(cv_results)
        .zip(report.entries)
        .map(|((model, cv_result), evaluation)| {
            let (cv_accuracy, cv_error) = match cv_result {
                Ok(r) => (Some(r.mean_accuracy()), None),
                Err(e) => (None, Some(e.to_string())),
            };
            let (test, test_error) = match evaluation.outcome {
                Ok(m) => (Some(m), None),
                Err(e) => (None, Some(e.to_string())),
            };
            ModelSummary {
                model: model.name().to_string(),
                cv_accuracy,
                cv_error,
                test,
                test_error,
            }
        })
        .collect();

    Ok(AnalysisSummary {
        generated_at: chrono::Local::now().to_rfc3339(),
        source: source.to_string(),
        records: frame.nrows(),
        train_records: train.nrows(),
        test_records: test.nrows(),
        synthetic_records,
        degraded_records,
        models: summaries,
    })
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

/// Plain-text metrics table, one line per model.
pub fn render_table(summary: &AnalysisSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
        "Model", "CV acc", "Test acc", "Precision", "Recall", "F1", "AUC"
    );
    for m in &summary.models {
        let t = m.test.as_ref();
        let _ = write!(
            out,
            "{:<14} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
            m.model,
            cell(m.cv_accuracy),
            cell(t.map(|t| t.accuracy)),
            cell(t.map(|t| t.precision)),
            cell(t.map(|t| t.recall)),
            cell(t.map(|t| t.f1)),
            cell(t.map(|t| t.auc)),
        );
        if let Some(e) = m.cv_error.as_ref().or(m.test_error.as_ref()) {
            let _ = write!(out, "  ({})", e);
        }
        out.push('\n');
    }
    out
}

/// Write the summary, ROC points included, as pretty JSON.
pub fn write_summary<P: AsRef<Path>>(summary: &AnalysisSummary, path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write summary: {}", path.as_ref().display()))?;
    log::info!("Summary written to {}", path.as_ref().display());
    Ok(())
}
