//! netCDF files, the container Exodus II is written in, seen through the
//! [`Dataset`](crate::dataset::Dataset) trait.
//!
//! Reading goes through the `netcdf` crate, so classic, 64-bit offset,
//! 64-bit data and netCDF-4 (HDF5) files all open the same way. Without the
//! `netcdf` feature every open fails with [`DatasetError::Unavailable`].

#[cfg(feature = "netcdf")]
mod file;
#[cfg(not(feature = "netcdf"))]
mod unavailable;

#[cfg(feature = "netcdf")]
pub use file::NetcdfFile;
#[cfg(not(feature = "netcdf"))]
pub use unavailable::NetcdfFile;

use crate::dataset::DatasetError;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    /// Numeric attributes of any width, widened to `f64`.
    Numbers(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

/// Opens a dataset file read-only. The file is closed when the returned value
/// is dropped.
pub fn open(path: impl AsRef<Path>) -> Result<NetcdfFile, DatasetError> {
    NetcdfFile::open(path)
}
