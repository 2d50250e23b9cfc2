//! Standardization and median imputation helpers.
//!
//! `Scaler` holds per-column mean / standard deviation. How a partition gets
//! its scaler is a `Standardization` strategy: each partition's own
//! statistics, or the statistics of a reference partition.

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

use crate::error::{ClassifierError, Result};
use crate::math::Array2;

/// Where a partition takes its standardization statistics from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standardization {
    /// Every partition is scaled by its own mean and standard deviation.
    #[default]
    SelfStats,
    /// Every partition is scaled by the training partition's statistics.
    ReferenceStats,
}

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Minimum stddev to avoid division by zero when transforming.
    pub const MIN_STD: f64 = 1e-6;
}

/// Fit a `Scaler` where rows are records and columns are attributes.
///
/// The deviation is the sample (n - 1) standard deviation; columns that are
/// constant, or partitions with a single row, fall back to `MIN_STD`.
pub fn fit_scaler(x: &Array2<f64>) -> Result<Scaler> {
    if x.nrows() == 0 {
        return Err(ClassifierError::InvalidParameter(
            "cannot fit a scaler on an empty table".to_string(),
        ));
    }

    let mut mean = Vec::with_capacity(x.ncols());
    let mut std = Vec::with_capacity(x.ncols());
    for c in 0..x.ncols() {
        let column = x.column(c);
        mean.push(column.iter().mean());
        // NaN (single row) also falls through to the floor
        std.push(column.iter().std_dev().max(Scaler::MIN_STD));
    }

    Ok(Scaler { mean, std })
}

/// Transform all rows using the provided `Scaler` and return a new table.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Array2<f64> {
    let mut out = x.clone();
    for r in 0..out.nrows() {
        for (c, v) in out.row_mut(r).iter_mut().enumerate() {
            *v = (*v - sc.mean[c]) / sc.std[c];
        }
    }
    out
}

/// Standardize a partition according to `strategy`.
///
/// `reference` is the scaler of the training partition; it is required for
/// `ReferenceStats` and ignored for `SelfStats`. Returns the transformed
/// table and the scaler that was applied.
pub fn standardize(
    x: &Array2<f64>,
    strategy: Standardization,
    reference: Option<&Scaler>,
) -> Result<(Array2<f64>, Scaler)> {
    let scaler = match (strategy, reference) {
        (Standardization::SelfStats, _) => fit_scaler(x)?,
        (Standardization::ReferenceStats, Some(sc)) => sc.clone(),
        (Standardization::ReferenceStats, None) => fit_scaler(x)?,
    };
    Ok((transform_all(x, &scaler), scaler))
}

/// Median of the observed values, `None` when there are none.
pub fn median(values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(Data::new(values).median())
}
