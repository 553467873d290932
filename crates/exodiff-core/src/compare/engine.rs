use super::dimensions::compare_dimensions;
use super::numeric::{ValueDiff, compare_values};
use super::order::{
    COMBINED_NODAL_VALUES, FamilyVariable, IndexedFamily, PermutationError, PermutationMap,
    resolve_permutation,
};
use super::report::{DiffReport, Finding, MissingCounterpart, ShapeDiff};
use super::strings::{mismatched_names, normalize_text_rows, same_names};
use super::{VariableRoute, classify};
use crate::dataset::{Array, Dataset, DatasetError};
use crate::domain::{CollectionMode, ExodiffError, Side};
use crate::netcdf;
use crate::policy::ComparisonOptions;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// First difference of a fail-fast comparison.
    #[error("{0}")]
    Difference(Box<Finding>),
    #[error("{side}: {source}")]
    Dataset {
        side: Side,
        #[source]
        source: DatasetError,
    },
    #[error("variable '{variable}' is {file1} in file1 but {file2} in file2")]
    TypeMismatch {
        variable: String,
        file1: &'static str,
        file2: &'static str,
    },
    #[error(transparent)]
    Permutation(#[from] PermutationError),
}

impl CompareError {
    fn dataset(side: Side) -> impl FnOnce(DatasetError) -> Self {
        move |source| Self::Dataset { side, source }
    }

    pub fn finding(&self) -> Option<&Finding> {
        match self {
            Self::Difference(finding) => Some(finding),
            _ => None,
        }
    }
}

impl From<CompareError> for ExodiffError {
    fn from(error: CompareError) -> Self {
        let message = error.to_string();
        match error {
            CompareError::Difference(finding) => {
                ExodiffError::different(finding.placeholder(), message)
            }
            CompareError::Dataset { .. } => ExodiffError::io_system("IO.DATASET", message),
            CompareError::TypeMismatch { .. } => {
                ExodiffError::input_validation("INPUT.VARIABLE_TYPE", message)
            }
            CompareError::Permutation(_) => {
                ExodiffError::internal("INTERNAL.PERMUTATION", message)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Init,
    DimensionsChecked,
    NamesChecked,
    NamesDifferent,
    ValuesChecked,
}

/// Outcome of comparing one numeric variable.
#[derive(Debug, Clone, PartialEq)]
enum VariableOutcome {
    Equal,
    Missing(MissingCounterpart),
    Shape(ShapeDiff),
    Values(ValueDiff),
}

struct Comparison<'o> {
    options: &'o ComparisonOptions,
    report: DiffReport,
    stage: Stage,
}

impl<'o> Comparison<'o> {
    fn new(options: &'o ComparisonOptions) -> Self {
        Self {
            options,
            report: DiffReport::default(),
            stage: Stage::Init,
        }
    }

    fn advance(&mut self, stage: Stage) {
        debug!(from = ?self.stage, to = ?stage, "comparison stage");
        self.stage = stage;
    }

    /// Stores a finding, or ends the comparison when failing fast.
    fn record(&mut self, finding: Finding) -> Result<(), CompareError> {
        if self.options.mode == CollectionMode::FailFast {
            return Err(CompareError::Difference(Box::new(finding)));
        }
        match finding {
            Finding::Dimension { name, diff } => {
                self.report.dimensions.insert(name, diff);
            }
            Finding::Names { table, names } => {
                self.report.names.insert(table, names);
            }
            Finding::Shape { variable, diff } => {
                self.report.shapes.insert(variable, diff);
            }
            Finding::Value { variable, diff } => {
                self.report.values.insert(variable, diff);
            }
            Finding::MissingCounterpart(missing) => {
                self.report.missing_counterparts.push(missing);
            }
        }
        Ok(())
    }
}

/// Compares two opened datasets.
///
/// Name tables are compared before any values; if one disagrees, values are
/// not compared and the report is returned with
/// [`DiffReport::names_short_circuited`] set. With
/// [`CollectionMode::FailFast`] the first difference is returned as
/// [`CompareError::Difference`].
pub fn compare_datasets<A, B>(
    file1: &mut A,
    file2: &mut B,
    options: &ComparisonOptions,
) -> Result<DiffReport, CompareError>
where
    A: Dataset + ?Sized,
    B: Dataset + ?Sized,
{
    let mut comparison = Comparison::new(options);

    for (name, diff) in compare_dimensions(
        file1.dimensions(),
        file2.dimensions(),
        &options.excluded_dimensions,
    ) {
        debug!(dimension = %name, ?diff, "dimension differs");
        comparison.record(Finding::Dimension { name, diff })?;
    }
    comparison.advance(Stage::DimensionsChecked);

    let mut text_variables = Vec::new();
    let mut numeric_variables = Vec::new();
    for variable in file1.variables() {
        if options.is_variable_ignored(&variable.name) {
            debug!(variable = %variable.name, "ignored by policy");
            continue;
        }
        match classify(variable) {
            VariableRoute::Names => text_variables.push(variable.name.clone()),
            VariableRoute::Values => numeric_variables.push(variable.name.clone()),
        }
    }
    info!(
        text = text_variables.len(),
        numeric = numeric_variables.len(),
        "classified variables"
    );

    let mut family_names = BTreeMap::new();
    for name in &text_variables {
        let (names1, names2) = read_name_tables(file1, file2, name)?;
        if !same_names(&names1, &names2) {
            let names = mismatched_names(&names1, &names2);
            info!(table = %name, differing = names.len(), "name table differs");
            comparison.record(Finding::Names {
                table: name.clone(),
                names,
            })?;
            continue;
        }
        if let Some(family) = IndexedFamily::ALL
            .into_iter()
            .find(|family| family.name_table() == name)
        {
            family_names.insert(family, (names1, names2));
        }
    }

    if !comparison.report.names.is_empty() {
        comparison.advance(Stage::NamesDifferent);
        comparison.report.names_short_circuited = true;
        info!("name tables differ; values are not compared");
        return Ok(comparison.report);
    }
    comparison.advance(Stage::NamesChecked);

    let mut permutations = BTreeMap::new();
    for (family, (names1, names2)) in &family_names {
        let map = resolve_permutation(family.name_table(), names1, names2)?;
        debug!(%family, positions = ?map.positions(), "resolved permutation");
        permutations.insert(*family, map);
    }

    for name in &numeric_variables {
        let outcome = compare_numeric_variable(file1, file2, name, &permutations, options)?;
        match outcome {
            VariableOutcome::Equal => {}
            VariableOutcome::Missing(missing) => {
                warn!(
                    variable = %missing.variable,
                    counterpart = %missing.counterpart,
                    "no counterpart in file2; variable not compared"
                );
                comparison.record(Finding::MissingCounterpart(missing))?;
            }
            VariableOutcome::Shape(diff) => {
                comparison.record(Finding::Shape {
                    variable: name.clone(),
                    diff,
                })?;
            }
            VariableOutcome::Values(diff) => {
                comparison.record(Finding::Value {
                    variable: name.clone(),
                    diff,
                })?;
            }
        }
    }
    comparison.advance(Stage::ValuesChecked);

    info!(
        identical = comparison.report.is_identical(),
        differences = comparison.report.difference_count(),
        "comparison finished"
    );
    Ok(comparison.report)
}

/// Opens both files, compares them and releases them again, whatever the
/// outcome.
pub fn compare_files(
    file1: impl AsRef<Path>,
    file2: impl AsRef<Path>,
    options: &ComparisonOptions,
) -> Result<DiffReport, CompareError> {
    let mut dataset1 = netcdf::open(file1).map_err(CompareError::dataset(Side::File1))?;
    let mut dataset2 = netcdf::open(file2).map_err(CompareError::dataset(Side::File2))?;
    compare_datasets(&mut dataset1, &mut dataset2, options)
}

fn read_name_tables<A, B>(
    file1: &mut A,
    file2: &mut B,
    name: &str,
) -> Result<(Vec<String>, Vec<String>), CompareError>
where
    A: Dataset + ?Sized,
    B: Dataset + ?Sized,
{
    let array1 = file1
        .read_array(name)
        .map_err(CompareError::dataset(Side::File1))?;
    if !file2.has_variable(name) {
        return Err(CompareError::Dataset {
            side: Side::File2,
            source: DatasetError::VariableNotFound(name.to_string()),
        });
    }
    let array2 = file2
        .read_array(name)
        .map_err(CompareError::dataset(Side::File2))?;

    let names1 = text_rows(&array1);
    let names2 = if array2.as_text().is_some() {
        text_rows(&array2)
    } else {
        warn!(table = name, "numeric in file2; treating it as an empty name table");
        Vec::new()
    };
    Ok((names1, names2))
}

fn text_rows(array: &Array) -> Vec<String> {
    match array.as_text() {
        Some(bytes) => normalize_text_rows(array.shape(), bytes),
        None => Vec::new(),
    }
}

fn counterpart_name(name: &str, permutations: &BTreeMap<IndexedFamily, PermutationMap>) -> String {
    let Some(parsed) = FamilyVariable::parse(name) else {
        return name.to_string();
    };
    match permutations
        .get(&parsed.family)
        .and_then(|map| map.remap(parsed.index))
    {
        Some(index) => parsed.name_with_index(index),
        None => name.to_string(),
    }
}

fn compare_numeric_variable<A, B>(
    file1: &mut A,
    file2: &mut B,
    name: &str,
    permutations: &BTreeMap<IndexedFamily, PermutationMap>,
    options: &ComparisonOptions,
) -> Result<VariableOutcome, CompareError>
where
    A: Dataset + ?Sized,
    B: Dataset + ?Sized,
{
    let counterpart = counterpart_name(name, permutations);
    if counterpart != name {
        debug!(variable = name, %counterpart, "remapped through permutation");
    }
    if !file2.has_variable(&counterpart) {
        return Ok(VariableOutcome::Missing(MissingCounterpart {
            variable: name.to_string(),
            counterpart,
        }));
    }

    let array1 = file1
        .read_array(name)
        .map_err(CompareError::dataset(Side::File1))?;
    let array2 = file2
        .read_array(&counterpart)
        .map_err(CompareError::dataset(Side::File2))?;

    let values1 = array1.as_numeric().unwrap_or_default();
    let Some(values2) = array2.as_numeric() else {
        return Err(CompareError::TypeMismatch {
            variable: name.to_string(),
            file1: "numeric",
            file2: "text",
        });
    };

    if array1.shape() != array2.shape() {
        return Ok(VariableOutcome::Shape(ShapeDiff {
            file1: array1.shape().to_vec(),
            file2: array2.shape().to_vec(),
        }));
    }

    let reordered;
    let values2 = match permutations.get(&IndexedFamily::Nodal) {
        Some(map) if name == COMBINED_NODAL_VALUES && !map.is_identity() => {
            match reorder_axis(array2.shape(), values2, 1, map) {
                Some(values) => {
                    reordered = values;
                    debug!(variable = name, "reordered combined nodal values");
                    reordered.as_slice()
                }
                None => values2,
            }
        }
        _ => values2,
    };

    let outcome = match compare_values(
        array1.shape(),
        values1,
        values2,
        options.tolerance,
        options.nan_equal,
    ) {
        Some(diff) => {
            debug!(variable = name, failing = diff.failing_values, "values differ");
            VariableOutcome::Values(diff)
        }
        None => VariableOutcome::Equal,
    };
    Ok(outcome)
}

/// Gathers `values` so that slot `i` along `axis` holds file 2's slot
/// `map[i] - 1`. Returns `None` when the axis does not match the map.
fn reorder_axis(
    shape: &[usize],
    values: &[f64],
    axis: usize,
    map: &PermutationMap,
) -> Option<Vec<f64>> {
    let extent = *shape.get(axis)?;
    if extent != map.len() {
        return None;
    }
    let inner: usize = shape[axis + 1..].iter().product();
    let outer: usize = shape[..axis].iter().product();

    let mut reordered = Vec::with_capacity(values.len());
    for block in 0..outer {
        for position in map.positions() {
            let start = (block * extent + (position - 1)) * inner;
            reordered.extend_from_slice(values.get(start..start + inner)?);
        }
    }
    Some(reordered)
}
