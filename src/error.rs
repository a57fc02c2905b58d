//! Typed errors for loading and analysing the indicator dataset.

use thiserror::Error;

/// Errors raised while loading, analysing or rendering the dataset.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset has no `year` column")]
    MissingYearColumn,
    #[error("dataset contains no observations")]
    Empty,
    #[error("year {0} appears more than once")]
    DuplicateYear(i32),
    #[error("year {0} is not in the dataset")]
    YearNotFound(i32),
    #[error("unknown indicator: {0}")]
    UnknownIndicator(String),
    #[error("not enough data for {what}: need {needed}, got {got}")]
    InsufficientData {
        what: String,
        needed: usize,
        got: usize,
    },
    #[error("regression system is singular")]
    Singular,
    #[error("chart rendering failed: {0}")]
    Render(String),
}

impl DataError {
    pub fn insufficient(what: impl Into<String>, needed: usize, got: usize) -> Self {
        Self::InsufficientData {
            what: what.into(),
            needed,
            got,
        }
    }
}

pub type DataResult<T> = Result<T, DataError>;
