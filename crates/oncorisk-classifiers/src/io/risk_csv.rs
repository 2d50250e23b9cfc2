//! Risk-factor CSV reader.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::data_handling::{Diagnosis, Frame};
use crate::error::{ClassifierError, Result};
use crate::math::Array2;
use crate::preprocessing::median;

/// Configuration for reading the risk-factor table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Column holding the 0 / 1 diagnosis code.
    pub target_column: String,
    /// Cell text marking a missing value. Empty cells are missing as well.
    pub missing_marker: String,
    /// Columns removed before anything else, e.g. duplicates of the target.
    pub drop_columns: Vec<String>,
    pub delimiter: char,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            target_column: "Dx".to_string(),
            missing_marker: "?".to_string(),
            drop_columns: vec!["Dx:Cancer".to_string()],
            delimiter: ',',
        }
    }
}

/// Read and impute a risk-factor CSV file with the default configuration.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Frame> {
    load_dataset_with_config(path, &LoaderConfig::default())
}

pub fn load_dataset_with_config<P: AsRef<Path>>(path: P, config: &LoaderConfig) -> Result<Frame> {
    log::debug!("Reading risk-factor table from {}", path.as_ref().display());
    let file = File::open(&path)?;
    read_dataset(file, config)
}

/// Read a risk-factor table from any reader.
///
/// Every cell is coerced to a number, missing cells are replaced by the
/// median of the observed values of their column, the configured drop
/// columns are removed and the target column becomes a `Diagnosis`.
pub fn read_dataset<R: Read>(source: R, config: &LoaderConfig) -> Result<Frame> {
    if !config.delimiter.is_ascii() {
        return Err(ClassifierError::InvalidParameter(format!(
            "delimiter '{}' is not a single-byte character",
            config.delimiter
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter as u8)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();

    let kept: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !config.drop_columns.iter().any(|d| d == name))
        .map(|(i, _)| i)
        .collect();
    for dropped in &config.drop_columns {
        if find_column(&headers, dropped).is_none() {
            log::debug!("Drop column '{}' not present in header", dropped);
        }
    }

    let target_idx = find_column(&headers, &config.target_column)
        .filter(|idx| kept.contains(idx))
        .ok_or_else(|| {
            ClassifierError::Data(format!("missing target column '{}'", config.target_column))
        })?;

    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); kept.len()];
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        for (slot, &col) in kept.iter().enumerate() {
            let raw = record.get(col).unwrap_or("");
            let value = parse_cell(raw, &config.missing_marker).ok_or_else(|| {
                ClassifierError::Schema {
                    column: headers.get(col).unwrap_or("").to_string(),
                    row: row_idx + 1,
                    value: raw.to_string(),
                }
            })?;
            columns[slot].push(value);
        }
    }

    let n_records = columns.first().map(Vec::len).unwrap_or(0);
    if n_records == 0 {
        return Err(ClassifierError::Data("table has no records".to_string()));
    }

    let mut imputed_cells = 0usize;
    let mut filled: Vec<Vec<f64>> = Vec::with_capacity(kept.len());
    for (slot, &col) in kept.iter().enumerate() {
        let name = headers.get(col).unwrap_or("");
        let observed: Vec<f64> = columns[slot].iter().flatten().copied().collect();
        let fill = median(observed).ok_or_else(|| {
            if col == target_idx {
                ClassifierError::Data(format!("target column '{}' is entirely missing", name))
            } else {
                ClassifierError::Data(format!("column '{}' has no observed values", name))
            }
        })?;
        let missing = columns[slot].iter().filter(|v| v.is_none()).count();
        if missing > 0 {
            log::debug!("Imputed {} missing values of '{}' with median {}", missing, name, fill);
        }
        imputed_cells += missing;
        filled.push(columns[slot].iter().map(|v| v.unwrap_or(fill)).collect());
    }

    let target_slot = kept
        .iter()
        .position(|&c| c == target_idx)
        .ok_or_else(|| ClassifierError::Data("target column was dropped".to_string()))?;

    let y = filled[target_slot]
        .iter()
        .enumerate()
        .map(|(row, &code)| {
            Diagnosis::from_code(code).ok_or_else(|| {
                ClassifierError::Data(format!(
                    "target code {} at row {} is neither 0 nor 1",
                    code,
                    row + 1
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let feature_slots: Vec<usize> = (0..kept.len()).filter(|&s| s != target_slot).collect();
    if feature_slots.is_empty() {
        return Err(ClassifierError::Data("table has no attribute columns".to_string()));
    }
    let feature_names = feature_slots
        .iter()
        .map(|&s| headers.get(kept[s]).unwrap_or("").to_string())
        .collect();

    let mut values = Vec::with_capacity(n_records * feature_slots.len());
    for row in 0..n_records {
        for &s in &feature_slots {
            values.push(filled[s][row]);
        }
    }
    let x = Array2::from_shape_vec((n_records, feature_slots.len()), values)
        .map_err(|e| ClassifierError::Data(e.to_string()))?;

    let frame = Frame::new(feature_names, x, y)?;
    frame.log_summary("Loaded risk-factor table");
    log::info!("Imputed {} missing cells with column medians", imputed_cells);
    Ok(frame)
}

/// `Some(None)` for a missing cell, `Some(Some(v))` for a number and `None`
/// when the text is not numeric.
fn parse_cell(raw: &str, missing_marker: &str) -> Option<Option<f64>> {
    if raw.is_empty() || raw == missing_marker {
        return Some(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_nan() => Some(None),
        Ok(v) if v.is_finite() => Some(Some(v)),
        _ => None,
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cell_handles_markers() {
        assert_eq!(parse_cell("?", "?"), Some(None));
        assert_eq!(parse_cell("", "?"), Some(None));
        assert_eq!(parse_cell("2.5", "?"), Some(Some(2.5)));
        assert_eq!(parse_cell("yes", "?"), None);
        assert_eq!(parse_cell("inf", "?"), None);
    }

    #[test]
    fn target_column_cannot_be_dropped() {
        let config = LoaderConfig {
            drop_columns: vec!["Dx".to_string()],
            ..LoaderConfig::default()
        };
        let csv = "Age,Dx\n30,0\n40,1\n";
        let err = read_dataset(csv.as_bytes(), &config).unwrap_err();
        assert!(matches!(err, ClassifierError::Data(_)));
    }
}
