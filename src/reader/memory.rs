//! In-memory `GridSource` backend.
//!
//! Used by decoded fetch payloads that have already been parsed into arrays,
//! and throughout the test suite.

use std::collections::HashMap;

use ndarray::Array2;

use crate::reader::source::{AttrValue, GridSource, SourceError};

#[derive(Debug, Clone)]
enum MemoryVar {
    OneD(Vec<f64>),
    TwoD(Array2<f64>),
}

/// A `GridSource` over arrays held in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    name: String,
    dimensions: HashMap<String, usize>,
    variables: HashMap<String, MemoryVar>,
    attrs: HashMap<(String, String), AttrValue>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_dimension(mut self, name: &str, len: usize) -> Self {
        self.dimensions.insert(name.to_string(), len);
        self
    }

    pub fn with_1d(mut self, name: &str, values: Vec<f64>) -> Self {
        self.variables.insert(name.to_string(), MemoryVar::OneD(values));
        self
    }

    /// Time-major series: `rows[t][cell]`. Rows must be equal length.
    pub fn with_2d(mut self, name: &str, rows: Vec<Vec<f64>>) -> Self {
        let ncells = rows.first().map_or(0, Vec::len);
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let arr = Array2::from_shape_vec((rows.len(), ncells), flat)
            .unwrap_or_else(|_| Array2::zeros((0, 0)));
        self.variables.insert(name.to_string(), MemoryVar::TwoD(arr));
        self
    }

    pub fn with_attr(mut self, var: &str, attr: &str, value: AttrValue) -> Self {
        self.attrs.insert((var.to_string(), attr.to_string()), value);
        self
    }
}

impl GridSource for MemorySource {
    fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    fn has_dimension(&self, name: &str) -> bool {
        self.dimensions.contains_key(name)
    }

    fn dimension_len(&self, name: &str) -> Result<usize, SourceError> {
        self.dimensions
            .get(name)
            .copied()
            .ok_or_else(|| SourceError::MissingDimension(name.to_string()))
    }

    fn read_1d(&self, var: &str) -> Result<Vec<f64>, SourceError> {
        match self.variables.get(var) {
            Some(MemoryVar::OneD(v)) => Ok(v.clone()),
            Some(MemoryVar::TwoD(_)) => Err(SourceError::Conversion {
                var: var.to_string(),
                detail: "variable is two-dimensional".into(),
            }),
            None => Err(SourceError::MissingVariable(var.to_string())),
        }
    }

    fn read_2d(&self, var: &str) -> Result<Array2<f64>, SourceError> {
        match self.variables.get(var) {
            Some(MemoryVar::TwoD(a)) => Ok(a.clone()),
            Some(MemoryVar::OneD(_)) => Err(SourceError::Conversion {
                var: var.to_string(),
                detail: "variable is one-dimensional".into(),
            }),
            None => Err(SourceError::MissingVariable(var.to_string())),
        }
    }

    fn variable_attr(&self, var: &str, attr: &str) -> Result<Option<AttrValue>, SourceError> {
        Ok(self.attrs.get(&(var.to_string(), attr.to_string())).cloned())
    }

    fn description(&self) -> String {
        format!("memory:{}", self.name)
    }
}
