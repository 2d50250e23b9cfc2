//! Dense row-major matrix used for feature tables.
//!
//! Records are rows and attributes are columns; the type stays small so
//! partitions, folds and resampled tables can be cut and appended cheaply.
pub mod matrix;

pub use matrix::{Array2, ShapeError};
