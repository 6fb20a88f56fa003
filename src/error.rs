use chrono::NaiveDate;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("invalid email address '{0}'")]
    InvalidEmail(String),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("client name must not be empty")]
    EmptyName,

    #[error("no client ids left")]
    IdsExhausted,

    #[error("date range ends ({end}) before it starts ({start})")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// Reason a single CSV row was skipped by the loader.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("unparseable field: {0}")]
    Parse(#[from] csv::Error),

    #[error("{0}")]
    OutOfRange(&'static str),
}
