//! Read-only view of a netCDF-style container: named dimensions and named,
//! typed, n-dimensional variables.
//!
//! The comparison engine only talks to the [`Dataset`] trait. The netCDF
//! adapter in [`crate::netcdf`] and the in-memory [`MemoryDataset`] both
//! implement it.

mod memory;

pub use memory::MemoryDataset;

use crate::domain::ExodiffError;

/// Element type of a variable, as far as the comparison cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Fixed-width character data; the trailing axis is the character axis.
    Text,
    /// Any integer or floating point type, widened to `f64` when read.
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub size: u64,
    pub is_unlimited: bool,
}

impl Dimension {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            is_unlimited: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    pub name: String,
    pub element_type: ElementType,
    pub shape: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Text(Vec<u8>),
    Numeric(Vec<f64>),
}

/// A variable read in full, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    shape: Vec<usize>,
    data: ArrayData,
}

impl Array {
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self, DatasetError> {
        let expected = element_count(&shape).ok_or_else(|| DatasetError::TooLarge {
            shape: shape.clone(),
        })?;
        let actual = match &data {
            ArrayData::Text(bytes) => bytes.len(),
            ArrayData::Numeric(values) => values.len(),
        };
        if expected != actual {
            return Err(DatasetError::ShapeMismatch {
                shape,
                expected,
                actual,
            });
        }
        Ok(Self { shape, data })
    }

    pub fn numeric(shape: Vec<usize>, values: Vec<f64>) -> Result<Self, DatasetError> {
        Self::new(shape, ArrayData::Numeric(values))
    }

    pub fn text(shape: Vec<usize>, bytes: Vec<u8>) -> Result<Self, DatasetError> {
        Self::new(shape, ArrayData::Text(bytes))
    }

    /// Builds an `(N, width)` character table from strings, NUL padded.
    pub fn text_rows<S: AsRef<str>>(rows: &[S], width: usize) -> Result<Self, DatasetError> {
        let mut bytes = vec![0u8; rows.len() * width];
        for (row_index, row) in rows.iter().enumerate() {
            let row = row.as_ref().as_bytes();
            if row.len() > width {
                return Err(DatasetError::TextTooWide {
                    text: String::from_utf8_lossy(row).into_owned(),
                    width,
                });
            }
            let start = row_index * width;
            bytes[start..start + row.len()].copy_from_slice(row);
        }
        Self::text(vec![rows.len(), width], bytes)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn element_type(&self) -> ElementType {
        match self.data {
            ArrayData::Text(_) => ElementType::Text,
            ArrayData::Numeric(_) => ElementType::Numeric,
        }
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match &self.data {
            ArrayData::Numeric(values) => Some(values),
            ArrayData::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&[u8]> {
        match &self.data {
            ArrayData::Text(bytes) => Some(bytes),
            ArrayData::Numeric(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ArrayData::Text(bytes) => bytes.len(),
            ArrayData::Numeric(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Number of elements in `shape`, or `None` when the product overflows.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape
        .iter()
        .try_fold(1usize, |count, &extent| count.checked_mul(extent))
}

/// Access to one opened container. Dropping the value releases the
/// underlying resources.
pub trait Dataset {
    /// Dimensions in declaration order.
    fn dimensions(&self) -> &[Dimension];

    /// Variable descriptions in declaration order.
    fn variables(&self) -> &[VariableInfo];

    /// Reads the whole variable into memory.
    fn read_array(&mut self, name: &str) -> Result<Array, DatasetError>;

    fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions()
            .iter()
            .find(|dimension| dimension.name == name)
    }

    fn variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variables().iter().find(|variable| variable.name == name)
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[cfg(feature = "netcdf")]
    #[error("failed to open dataset '{}': {source}", path.display())]
    Open {
        path: std::path::PathBuf,
        source: ::netcdf::error::Error,
    },
    #[cfg(feature = "netcdf")]
    #[error("failed to read variable '{variable}': {source}")]
    Read {
        variable: String,
        source: ::netcdf::error::Error,
    },
    #[cfg(feature = "netcdf")]
    #[error("failed to read attribute '{name}': {source}")]
    Attribute {
        name: String,
        source: ::netcdf::error::Error,
    },
    #[error("netCDF support was not compiled in (enable the `netcdf` feature)")]
    Unavailable,
    #[error("variable '{variable}' has type {type_name}, which cannot be compared")]
    UnsupportedType {
        variable: String,
        type_name: &'static str,
    },
    #[error("variable '{0}' not found")]
    VariableNotFound(String),
    #[error("shape {shape:?} has more elements than fit in memory")]
    TooLarge { shape: Vec<usize> },
    #[error("data of shape {shape:?} needs {expected} elements, found {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },
    #[error("text '{text}' does not fit in {width} characters")]
    TextTooWide { text: String, width: usize },
    #[error("invalid dataset definition: {0}")]
    InvalidDefinition(String),
}

impl From<DatasetError> for ExodiffError {
    fn from(error: DatasetError) -> Self {
        let message = error.to_string();
        match error {
            DatasetError::ShapeMismatch { .. }
            | DatasetError::TextTooWide { .. }
            | DatasetError::InvalidDefinition(_) => {
                ExodiffError::input_validation("INPUT.DATASET_DEFINITION", message)
            }
            _ => ExodiffError::io_system("IO.DATASET", message),
        }
    }
}
