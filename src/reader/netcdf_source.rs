//! NetCDF-backed `GridSource`, available behind the `netcdf` feature.

use std::path::Path;

use ndarray::Array2;

use crate::reader::source::{AttrValue, GridSource, SourceError};

/// A `GridSource` over an open NetCDF file.
pub struct NetcdfSource {
    file: netcdf::File,
    path: String,
}

impl NetcdfSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = netcdf::open(path)?;
        Ok(Self {
            file,
            path: path.display().to_string(),
        })
    }

    fn variable(&self, name: &str) -> Result<netcdf::Variable<'_>, SourceError> {
        self.file
            .variable(name)
            .ok_or_else(|| SourceError::MissingVariable(name.to_string()))
    }
}

impl GridSource for NetcdfSource {
    fn has_variable(&self, name: &str) -> bool {
        self.file.variable(name).is_some()
    }

    fn has_dimension(&self, name: &str) -> bool {
        self.file.dimension(name).is_some()
    }

    fn dimension_len(&self, name: &str) -> Result<usize, SourceError> {
        self.file
            .dimension(name)
            .map(|d| d.len())
            .ok_or_else(|| SourceError::MissingDimension(name.to_string()))
    }

    fn read_1d(&self, var: &str) -> Result<Vec<f64>, SourceError> {
        let v = self.variable(var)?;
        Ok(v.get_values::<f64, _>(..)?)
    }

    fn read_2d(&self, var: &str) -> Result<Array2<f64>, SourceError> {
        let v = self.variable(var)?;
        let dims = v.dimensions();
        if dims.len() != 2 {
            return Err(SourceError::Conversion {
                var: var.to_string(),
                detail: format!("expected 2 dimensions, found {}", dims.len()),
            });
        }
        let shape = (dims[0].len(), dims[1].len());
        let flat = v.get_values::<f64, _>(..)?;
        Array2::from_shape_vec(shape, flat).map_err(|e| SourceError::Conversion {
            var: var.to_string(),
            detail: e.to_string(),
        })
    }

    fn variable_attr(&self, var: &str, attr: &str) -> Result<Option<AttrValue>, SourceError> {
        let v = self.variable(var)?;
        let Some(a) = v.attribute(attr) else {
            return Ok(None);
        };
        let value = match a.value()? {
            netcdf::AttributeValue::Str(s) => AttrValue::Text(s),
            netcdf::AttributeValue::Double(x) => AttrValue::Float(x),
            netcdf::AttributeValue::Float(x) => AttrValue::Float(x as f64),
            netcdf::AttributeValue::Int(x) => AttrValue::Int(x as i64),
            netcdf::AttributeValue::Longlong(x) => AttrValue::Int(x),
            netcdf::AttributeValue::Short(x) => AttrValue::Int(x as i64),
            netcdf::AttributeValue::Uchar(x) => AttrValue::Int(x as i64),
            other => AttrValue::Text(format!("{other:?}")),
        };
        Ok(Some(value))
    }

    fn description(&self) -> String {
        format!("netcdf:{}", self.path)
    }
}
