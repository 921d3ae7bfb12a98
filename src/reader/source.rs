//! The opaque data-source boundary the reader ingests through.
//!
//! A `GridSource` exposes dimensions, variables, and attributes the way a
//! self-describing gridded file does, without committing the reader to any
//! one container format.

use ndarray::Array2;
use thiserror::Error;

/// Errors raised by a concrete source backend.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("variable not found: {0}")]
    MissingVariable(String),

    #[error("dimension not found: {0}")]
    MissingDimension(String),

    #[error("attribute {attr} not found on variable {var}")]
    MissingAttribute { var: String, attr: String },

    #[error("cannot convert {var}: {detail}")]
    Conversion { var: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "netcdf")]
    #[error(transparent)]
    Netcdf(#[from] netcdf::Error),
}

/// A variable attribute value, as loosely typed as the formats that carry it.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl AttrValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Read access to one gridded dataset.
///
/// Data variables are laid out time-major: `read_2d` returns `time x cell`.
/// Coordinate and metadata variables are one-dimensional over cells.
pub trait GridSource {
    fn has_variable(&self, name: &str) -> bool;

    fn has_dimension(&self, name: &str) -> bool;

    fn dimension_len(&self, name: &str) -> Result<usize, SourceError>;

    fn read_1d(&self, var: &str) -> Result<Vec<f64>, SourceError>;

    fn read_2d(&self, var: &str) -> Result<Array2<f64>, SourceError>;

    /// `None` when the variable has no such attribute.
    fn variable_attr(&self, var: &str, attr: &str) -> Result<Option<AttrValue>, SourceError>;

    /// Human-readable identity for log lines.
    fn description(&self) -> String;
}
