use super::numeric::ValueDiff;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DimensionDiff {
    pub file1: u64,
    /// `None` when the dimension does not exist in the second file.
    pub file2: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeDiff {
    pub file1: Vec<usize>,
    pub file2: Vec<usize>,
}

/// A numeric variable of file 1 with nothing to compare against in file 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCounterpart {
    pub variable: String,
    /// Name looked up in file 2, after permutation remapping.
    pub counterpart: String,
}

/// Everything found while comparing two datasets.
///
/// Maps keep file 1 declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffReport {
    pub dimensions: IndexMap<String, DimensionDiff>,
    pub names: IndexMap<String, BTreeSet<String>>,
    pub values: IndexMap<String, ValueDiff>,
    pub shapes: IndexMap<String, ShapeDiff>,
    pub missing_counterparts: Vec<MissingCounterpart>,
    /// Set when value comparison was skipped because name tables disagree.
    pub names_short_circuited: bool,
}

impl DiffReport {
    pub fn is_identical(&self) -> bool {
        self.dimensions.is_empty()
            && self.names.is_empty()
            && self.values.is_empty()
            && self.shapes.is_empty()
    }

    pub fn difference_count(&self) -> usize {
        self.dimensions.len() + self.names.len() + self.values.len() + self.shapes.len()
    }
}

/// A single difference, as raised by a fail-fast comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    Dimension {
        name: String,
        diff: DimensionDiff,
    },
    Names {
        table: String,
        names: BTreeSet<String>,
    },
    Shape {
        variable: String,
        diff: ShapeDiff,
    },
    Value {
        variable: String,
        diff: ValueDiff,
    },
    MissingCounterpart(MissingCounterpart),
}

impl Finding {
    pub const fn placeholder(&self) -> &'static str {
        match self {
            Self::Dimension { .. } => "DIFF.DIMENSION",
            Self::Names { .. } => "DIFF.NAMES",
            Self::Shape { .. } => "DIFF.SHAPE",
            Self::Value { .. } => "DIFF.VALUE",
            Self::MissingCounterpart(_) => "DIFF.MISSING_COUNTERPART",
        }
    }
}

impl Display for Finding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dimension { name, diff } => f.write_str(&dimension_line(name, diff)),
            Self::Names { table, names } => write!(
                f,
                "{} is different: {} not in both files",
                table,
                join_names(names)
            ),
            Self::Shape { variable, diff } => f.write_str(&shape_line(variable, diff)),
            Self::Value { variable, diff } => write!(
                f,
                "{} is different: max absolute diff {} at position {}; max relative diff {}",
                variable,
                format_diff(diff.max_abs_diff),
                format_position(&diff.max_abs_diff_position),
                relative_text(diff)
            ),
            Self::MissingCounterpart(missing) => write!(
                f,
                "{} has no counterpart '{}' in file2",
                missing.variable, missing.counterpart
            ),
        }
    }
}

const INDENT: &str = "    ";

/// Multi-line summary of a report, mirroring the classic exodiff printout.
pub fn render_human_summary(report: &DiffReport) -> String {
    let mut lines = Vec::new();
    lines.push("exodiff-rs: difference summary:".to_string());
    lines.push(String::new());

    if !report.dimensions.is_empty() {
        lines.push("Dimensions:".to_string());
        for (name, diff) in &report.dimensions {
            lines.push(format!("{INDENT}{}", dimension_line(name, diff)));
        }
    }

    let has_variable_lines = !report.names.is_empty()
        || !report.shapes.is_empty()
        || !report.values.is_empty()
        || !report.missing_counterparts.is_empty();
    if has_variable_lines {
        lines.push("Variables:".to_string());
    }

    if !report.names.is_empty() {
        for (table, names) in &report.names {
            if names.is_empty() {
                lines.push(format!("{INDENT}{table} is different: name lists differ"));
            }
            for name in names {
                lines.push(format!(
                    "{INDENT}{table} is different: variable {name} not in both files"
                ));
            }
        }
        // values were not compared, so there is nothing more to show
        return lines.join("\n");
    }

    for (variable, diff) in &report.shapes {
        lines.push(format!("{INDENT}{}", shape_line(variable, diff)));
    }

    for (variable, diff) in &report.values {
        lines.push(format!("{INDENT}{variable} is different: "));
        lines.push(format!(
            "{INDENT}{INDENT}max absolute diff {} at position {}",
            format_diff(diff.max_abs_diff),
            format_position(&diff.max_abs_diff_position)
        ));
        lines.push(format!(
            "{INDENT}{INDENT}max relative diff {}",
            relative_text(diff)
        ));
    }

    for missing in &report.missing_counterparts {
        lines.push(format!(
            "{INDENT}{} not compared: no variable {} in file2",
            missing.variable, missing.counterpart
        ));
    }

    lines.join("\n")
}

pub fn verdict_line(report: &DiffReport) -> &'static str {
    if report.is_identical() {
        "exodiff-rs: files are identical"
    } else {
        "exodiff-rs: files are different"
    }
}

fn dimension_line(name: &str, diff: &DimensionDiff) -> String {
    match diff.file2 {
        Some(file2) => format!(
            "{} is different: file1 size is {}; file2 size is {}",
            name, diff.file1, file2
        ),
        None => format!(
            "{} is different: file1 size is {}; missing in file2",
            name, diff.file1
        ),
    }
}

fn shape_line(variable: &str, diff: &ShapeDiff) -> String {
    format!(
        "{} is different: file1 shape is {:?}; file2 shape is {:?}",
        variable, diff.file1, diff.file2
    )
}

fn relative_text(diff: &ValueDiff) -> String {
    match (&diff.max_rel_diff, &diff.max_rel_diff_position) {
        (Some(value), Some(position)) => format!(
            "{} at position {}",
            format_diff(*value),
            format_position(position)
        ),
        _ => "not applicable (all file2 values are zero)".to_string(),
    }
}

fn join_names(names: &BTreeSet<String>) -> String {
    if names.is_empty() {
        return "duplicate names".to_string();
    }
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}

pub fn format_diff(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    format!("{value:.4e}")
}

pub fn format_position(position: &[usize]) -> String {
    let parts: Vec<String> = position.iter().map(|index| index.to_string()).collect();
    format!("({})", parts.join(", "))
}
