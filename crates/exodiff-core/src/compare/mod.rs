//! Structural and numerical comparison of two datasets.

mod dimensions;
mod engine;
pub mod numeric;
pub mod order;
pub mod report;
pub mod strings;

pub use dimensions::compare_dimensions;
pub use engine::{CompareError, compare_datasets, compare_files};
pub use numeric::{Tolerance, ValueDiff, compare_values};
pub use order::{FamilyVariable, IndexedFamily, PermutationError, PermutationMap};
pub use report::{DiffReport, DimensionDiff, Finding, MissingCounterpart, ShapeDiff};

use crate::dataset::{ElementType, VariableInfo};

/// Which comparison a variable goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableRoute {
    /// Character arrays holding name tables, QA and info records.
    Names,
    Values,
}

pub fn classify(variable: &VariableInfo) -> VariableRoute {
    match variable.element_type {
        ElementType::Text => VariableRoute::Names,
        ElementType::Numeric => VariableRoute::Values,
    }
}
