//! Records, labels and the `Frame` table shared by every pipeline stage.
//!
//! A `Frame` is the loaded dataset as well as any partition, fold or
//! resampled training set cut from it. Each row carries an `Origin` so record
//! identity survives splitting, and synthetic rows can be traced to the two
//! rows they were interpolated from.
use std::fmt;

use crate::error::{ClassifierError, Result};
use crate::math::Array2;

/// Binary diagnosis target. `Cancer` is the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Diagnosis {
    NoCancer,
    Cancer,
}

impl Diagnosis {
    /// Fixed class order used wherever rows are grouped by class.
    pub const ALL: [Diagnosis; 2] = [Diagnosis::NoCancer, Diagnosis::Cancer];

    /// Map the numeric target code (0 / 1) to a diagnosis.
    pub fn from_code(code: f64) -> Option<Self> {
        if code == 0.0 {
            Some(Diagnosis::NoCancer)
        } else if code == 1.0 {
            Some(Diagnosis::Cancer)
        } else {
            None
        }
    }

    pub fn code(self) -> f64 {
        match self {
            Diagnosis::NoCancer => 0.0,
            Diagnosis::Cancer => 1.0,
        }
    }

    pub fn is_cancer(self) -> bool {
        self == Diagnosis::Cancer
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnosis::NoCancer => write!(f, "No Cancer"),
            Diagnosis::Cancer => write!(f, "Cancer"),
        }
    }
}

/// Where a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// A record read from the input file; the id is its 0-based data row.
    Observed(usize),
    /// An interpolated record. `source` and `neighbor` are the row positions
    /// of its parents inside the frame that holds it.
    Synthetic { source: usize, neighbor: usize },
}

impl Origin {
    pub fn record_id(&self) -> Option<usize> {
        match self {
            Origin::Observed(id) => Some(*id),
            Origin::Synthetic { .. } => None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Origin::Synthetic { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    /// Attribute names, one per column of `x`
    pub feature_names: Vec<String>,
    pub x: Array2<f64>,
    pub y: Vec<Diagnosis>,
    pub origin: Vec<Origin>,
}

impl Frame {
    /// Build a frame of observed records numbered `0..n`.
    pub fn new(feature_names: Vec<String>, x: Array2<f64>, y: Vec<Diagnosis>) -> Result<Self> {
        let origin = (0..x.nrows()).map(Origin::Observed).collect();
        Self::with_origins(feature_names, x, y, origin)
    }

    pub fn with_origins(
        feature_names: Vec<String>,
        x: Array2<f64>,
        y: Vec<Diagnosis>,
        origin: Vec<Origin>,
    ) -> Result<Self> {
        if feature_names.len() != x.ncols() {
            return Err(ClassifierError::Data(format!(
                "{} feature names for {} columns",
                feature_names.len(),
                x.ncols()
            )));
        }
        if y.len() != x.nrows() || origin.len() != x.nrows() {
            return Err(ClassifierError::Data(format!(
                "{} rows but {} labels and {} origins",
                x.nrows(),
                y.len(),
                origin.len()
            )));
        }
        Ok(Frame {
            feature_names,
            x,
            y,
            origin,
        })
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }

    pub fn count(&self, class: Diagnosis) -> usize {
        self.y.iter().filter(|&&label| label == class).count()
    }

    /// Row positions holding `class`, in row order.
    pub fn class_rows(&self, class: Diagnosis) -> Vec<usize> {
        self.y
            .iter()
            .enumerate()
            .filter_map(|(i, &label)| if label == class { Some(i) } else { None })
            .collect()
    }

    /// The majority and minority class with their counts, or `None` when
    /// both classes are equally represented.
    pub fn majority_minority(&self) -> Option<((Diagnosis, usize), (Diagnosis, usize))> {
        let no_cancer = self.count(Diagnosis::NoCancer);
        let cancer = self.count(Diagnosis::Cancer);
        if no_cancer > cancer {
            Some(((Diagnosis::NoCancer, no_cancer), (Diagnosis::Cancer, cancer)))
        } else if cancer > no_cancer {
            Some(((Diagnosis::Cancer, cancer), (Diagnosis::NoCancer, no_cancer)))
        } else {
            None
        }
    }

    /// Record ids of the observed rows, in row order.
    pub fn record_ids(&self) -> Vec<usize> {
        self.origin.iter().filter_map(Origin::record_id).collect()
    }

    pub fn synthetic_count(&self) -> usize {
        self.origin.iter().filter(|o| o.is_synthetic()).count()
    }

    /// Cut the rows at `indices` (in the given order) into a new frame.
    ///
    /// Synthetic origins keep pointing at parent positions of the source
    /// frame, so cutting is meant for observed rows.
    pub fn select(&self, indices: &[usize]) -> Frame {
        Frame {
            feature_names: self.feature_names.clone(),
            x: self.x.select_rows(indices),
            y: indices.iter().map(|&i| self.y[i]).collect(),
            origin: indices.iter().map(|&i| self.origin[i]).collect(),
        }
    }

    /// Row positions not listed in `held_out`, in row order.
    pub fn complement(&self, held_out: &[usize]) -> Vec<usize> {
        let mut excluded = vec![false; self.nrows()];
        for &i in held_out {
            excluded[i] = true;
        }
        (0..self.nrows()).filter(|&i| !excluded[i]).collect()
    }

    pub fn log_summary(&self, name: &str) {
        log::info!(
            "{}: {} records ({} {} / {} {}), {} attributes",
            name,
            self.nrows(),
            self.count(Diagnosis::NoCancer),
            Diagnosis::NoCancer,
            self.count(Diagnosis::Cancer),
            Diagnosis::Cancer,
            self.ncols()
        );
    }
}
