use super::{Array, Dataset, DatasetError, Dimension, VariableInfo};

/// A dataset held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    dimensions: Vec<Dimension>,
    variables: Vec<VariableInfo>,
    arrays: Vec<Array>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or resizes a dimension.
    pub fn with_dimension(mut self, name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        match self.dimensions.iter_mut().find(|dim| dim.name == name) {
            Some(existing) => existing.size = size,
            None => self.dimensions.push(Dimension::new(name, size)),
        }
        self
    }

    /// Adds or replaces a variable.
    pub fn with_variable(mut self, name: impl Into<String>, array: Array) -> Self {
        let info = VariableInfo {
            name: name.into(),
            element_type: array.element_type(),
            shape: array.shape().to_vec(),
        };
        match self.variables.iter().position(|var| var.name == info.name) {
            Some(index) => {
                self.variables[index] = info;
                self.arrays[index] = array;
            }
            None => {
                self.variables.push(info);
                self.arrays.push(array);
            }
        }
        self
    }

    pub fn with_numeric(
        self,
        name: impl Into<String>,
        shape: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self, DatasetError> {
        Ok(self.with_variable(name, Array::numeric(shape, values)?))
    }

    pub fn with_names<S: AsRef<str>>(
        self,
        name: impl Into<String>,
        rows: &[S],
        width: usize,
    ) -> Result<Self, DatasetError> {
        Ok(self.with_variable(name, Array::text_rows(rows, width)?))
    }
}

impl Dataset for MemoryDataset {
    fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    fn read_array(&mut self, name: &str) -> Result<Array, DatasetError> {
        self.variables
            .iter()
            .position(|var| var.name == name)
            .map(|index| self.arrays[index].clone())
            .ok_or_else(|| DatasetError::VariableNotFound(name.to_string()))
    }
}
