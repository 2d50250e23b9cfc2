use std::error::Error;
use std::fmt;

/// Errors raised while loading, splitting, resampling or fitting.
#[derive(Debug)]
pub enum ClassifierError {
    /// A cell could not be coerced to a number. `row` is the 1-based data row.
    Schema {
        column: String,
        row: usize,
        value: String,
    },
    /// The data cannot support the requested operation.
    Data(String),
    /// A minority record has fewer same-class neighbours than requested.
    InsufficientNeighbors {
        record: usize,
        available: usize,
        requested: usize,
    },
    /// A model failed to fit numerically.
    Fit { model: String, reason: String },
    InvalidParameter(String),
    Io(std::io::Error),
    Csv(csv::Error),
}

pub type Result<T> = std::result::Result<T, ClassifierError>;

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClassifierError::Schema { column, row, value } => write!(
                f,
                "Column '{}' holds non-numeric value '{}' at row {}",
                column, value, row
            ),
            ClassifierError::Data(msg) => write!(f, "Data error: {}", msg),
            ClassifierError::InsufficientNeighbors {
                record,
                available,
                requested,
            } => write!(
                f,
                "Record {} has {} same-class neighbours, {} requested",
                record, available, requested
            ),
            ClassifierError::Fit { model, reason } => {
                write!(f, "Failed to fit {}: {}", model, reason)
            }
            ClassifierError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            ClassifierError::Io(err) => write!(f, "I/O error: {}", err),
            ClassifierError::Csv(err) => write!(f, "CSV error: {}", err),
        }
    }
}

impl Error for ClassifierError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClassifierError::Io(err) => Some(err),
            ClassifierError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClassifierError {
    fn from(err: std::io::Error) -> Self {
        ClassifierError::Io(err)
    }
}

impl From<csv::Error> for ClassifierError {
    fn from(err: csv::Error) -> Self {
        ClassifierError::Csv(err)
    }
}
