use super::{Attribute, AttributeValue};
use crate::dataset::{
    Array, ArrayData, Dataset, DatasetError, Dimension, ElementType, VariableInfo, element_count,
};
use ::netcdf::types::{FloatType, IntType, NcVariableType};
use std::path::Path;
use tracing::{debug, warn};

/// An opened netCDF file. Only the root group is visible; Exodus II does not
/// use groups.
pub struct NetcdfFile {
    file: ::netcdf::File,
    dimensions: Vec<Dimension>,
    variables: Vec<VariableInfo>,
    type_names: Vec<&'static str>,
}

impl NetcdfFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = ::netcdf::open(path).map_err(|source| DatasetError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let dimensions: Vec<Dimension> = file
            .dimensions()
            .map(|dimension| Dimension {
                name: dimension.name().to_string(),
                size: dimension.len() as u64,
                is_unlimited: dimension.is_unlimited(),
            })
            .collect();

        let mut variables = Vec::new();
        let mut type_names = Vec::new();
        for variable in file.variables() {
            let vartype = variable.vartype();
            let name = variable.name().to_string();
            let element_type = element_type(&vartype).unwrap_or_else(|| {
                warn!(variable = %name, "variable type cannot be compared; reads will fail");
                ElementType::Numeric
            });
            variables.push(VariableInfo {
                name,
                element_type,
                shape: variable
                    .dimensions()
                    .iter()
                    .map(|dimension| dimension.len())
                    .collect(),
            });
            type_names.push(type_name(&vartype));
        }

        debug!(
            path = %path.display(),
            dimensions = dimensions.len(),
            variables = variables.len(),
            "opened netCDF file"
        );
        Ok(Self {
            file,
            dimensions,
            variables,
            type_names,
        })
    }

    /// Global attributes.
    pub fn attributes(&self) -> Result<Vec<Attribute>, DatasetError> {
        self.file.attributes().map(convert_attribute).collect()
    }

    /// CDL name of the stored type, e.g. `double` or `char`.
    pub fn variable_type(&self, name: &str) -> Option<&'static str> {
        self.variable_index(name).map(|index| self.type_names[index])
    }

    fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|variable| variable.name == name)
    }
}

impl Dataset for NetcdfFile {
    fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    fn read_array(&mut self, name: &str) -> Result<Array, DatasetError> {
        let index = self
            .variable_index(name)
            .ok_or_else(|| DatasetError::VariableNotFound(name.to_string()))?;
        let shape = self.variables[index].shape.clone();
        let type_name = self.type_names[index];
        let len = element_count(&shape)
            .filter(|len| len.checked_mul(size_of::<f64>()).is_some())
            .ok_or_else(|| DatasetError::TooLarge {
                shape: shape.clone(),
            })?;
        let variable = self
            .file
            .variable(name)
            .ok_or_else(|| DatasetError::VariableNotFound(name.to_string()))?;
        let read_failed = |source| DatasetError::Read {
            variable: name.to_string(),
            source,
        };

        let data = match element_type(&variable.vartype()) {
            // nothing to read
            _ if len == 0 => match self.variables[index].element_type {
                ElementType::Text => ArrayData::Text(Vec::new()),
                ElementType::Numeric => ArrayData::Numeric(Vec::new()),
            },
            Some(ElementType::Text) => ArrayData::Text(variable.get_raw_values(..).map_err(read_failed)?),
            Some(ElementType::Numeric) => {
                ArrayData::Numeric(variable.get_values::<f64, _>(..).map_err(read_failed)?)
            }
            None => {
                return Err(DatasetError::UnsupportedType {
                    variable: name.to_string(),
                    type_name,
                });
            }
        };
        debug!(variable = name, type_name, ?shape, "read variable");
        Array::new(shape, data)
    }
}

fn element_type(vartype: &NcVariableType) -> Option<ElementType> {
    match vartype {
        NcVariableType::Char => Some(ElementType::Text),
        NcVariableType::Int(_) | NcVariableType::Float(_) => Some(ElementType::Numeric),
        _ => None,
    }
}

fn type_name(vartype: &NcVariableType) -> &'static str {
    match vartype {
        NcVariableType::Char => "char",
        NcVariableType::Int(IntType::I8) => "byte",
        NcVariableType::Int(IntType::U8) => "ubyte",
        NcVariableType::Int(IntType::I16) => "short",
        NcVariableType::Int(IntType::U16) => "ushort",
        NcVariableType::Int(IntType::I32) => "int",
        NcVariableType::Int(IntType::U32) => "uint",
        NcVariableType::Int(IntType::I64) => "int64",
        NcVariableType::Int(IntType::U64) => "uint64",
        NcVariableType::Float(FloatType::F32) => "float",
        NcVariableType::Float(FloatType::F64) => "double",
        NcVariableType::String => "string",
        _ => "user-defined",
    }
}

fn convert_attribute(attribute: ::netcdf::Attribute<'_>) -> Result<Attribute, DatasetError> {
    let name = attribute.name().to_string();
    let value = attribute.value().map_err(|source| DatasetError::Attribute {
        name: name.clone(),
        source,
    })?;
    Ok(Attribute {
        name,
        value: AttributeValue::from(value),
    })
}

impl From<::netcdf::AttributeValue> for AttributeValue {
    fn from(value: ::netcdf::AttributeValue) -> Self {
        use ::netcdf::AttributeValue as Nc;

        match value {
            Nc::Str(text) => Self::Text(text),
            Nc::Strs(texts) => Self::Text(texts.join(", ")),
            Nc::Double(number) => Self::Numbers(vec![number]),
            Nc::Doubles(numbers) => Self::Numbers(numbers),
            Nc::Float(number) => Self::Numbers(vec![f64::from(number)]),
            Nc::Floats(numbers) => Self::Numbers(numbers.into_iter().map(f64::from).collect()),
            Nc::Int(number) => Self::Numbers(vec![f64::from(number)]),
            Nc::Ints(numbers) => Self::Numbers(numbers.into_iter().map(f64::from).collect()),
            Nc::Short(number) => Self::Numbers(vec![f64::from(number)]),
            Nc::Shorts(numbers) => Self::Numbers(numbers.into_iter().map(f64::from).collect()),
            other => Self::Text(format!("{other:?}")),
        }
    }
}
