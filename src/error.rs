use crate::reader::source::SourceError;
use thiserror::Error;

/// Crate-level error type.
///
/// Ingestion failures are fatal: no partial `FieldReader` is ever produced.
/// Recoverable conditions (duplicate locations, sentinel gaps, clamped query
/// times) are logged and handled in place rather than surfaced here.
#[derive(Error, Debug)]
pub enum FieldError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("source has no time dimension (tried {0:?})")]
    MissingTimeDimension(Vec<String>),

    #[error("source has no cell dimension (tried {0:?})")]
    MissingCellDimension(Vec<String>),

    #[error("unparseable time units: {0:?}")]
    BadTimeUnits(String),

    #[error("time axis not strictly ascending at index {0}")]
    NonAscendingTime(usize),

    #[error("time axis has no entries")]
    EmptyTimeAxis,

    #[error("unrecognized speed unit: {0:?}")]
    UnknownUnit(String),

    #[error("no variable found for {role} (aliases tried: {tried:?})")]
    MissingVariable { role: &'static str, tried: Vec<String> },

    #[error("fetch window invariant violated: low time {low} > high time {high}")]
    InvalidWindow { low: i64, high: i64 },

    #[error("payload decode error: {0}")]
    Payload(String),
}
