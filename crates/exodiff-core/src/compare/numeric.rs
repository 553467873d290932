use crate::policy::PolicyError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Tolerance {
    pub const DEFAULT: Self = Self {
        rtol: 1e-6,
        atol: 1e-6,
    };

    pub fn new(rtol: f64, atol: f64) -> Result<Self, PolicyError> {
        let tolerance = Self { rtol, atol };
        tolerance.validate()?;
        Ok(tolerance)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        for (label, value) in [("rtol", self.rtol), ("atol", self.atol)] {
            if !value.is_finite() || value < 0.0 {
                return Err(PolicyError::InvalidTolerance(format!(
                    "{label} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// `|a - b| <= atol + rtol * |b|`, with `b` taken from the second file.
    ///
    /// Infinities compare equal to infinities of the same sign. NaN only
    /// compares equal to NaN when `nan_equal` is set.
    pub fn is_close(&self, a: f64, b: f64, nan_equal: bool) -> bool {
        if a.is_finite() && b.is_finite() {
            return (a - b).abs() <= self.atol + self.rtol * b.abs();
        }
        non_finite_match(a, b, nan_equal)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn non_finite_match(a: f64, b: f64, nan_equal: bool) -> bool {
    if a.is_nan() || b.is_nan() {
        return nan_equal && a.is_nan() && b.is_nan();
    }
    a == b
}

/// Where and by how much two numeric arrays disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDiff {
    pub max_abs_diff: f64,
    pub max_abs_diff_position: Vec<usize>,
    /// `None` when every value of the second array is zero.
    pub max_rel_diff: Option<f64>,
    pub max_rel_diff_position: Option<Vec<usize>>,
    pub failing_values: usize,
}

/// Compares two arrays of the same shape element by element.
///
/// Returns `None` when every pair is within tolerance. Otherwise reports the
/// largest absolute and relative differences; ties go to the lowest row-major
/// index and a NaN difference outranks any number. Pairs whose second value
/// is zero do not take part in the relative maximum.
pub fn compare_values(
    shape: &[usize],
    file1: &[f64],
    file2: &[f64],
    tolerance: Tolerance,
    nan_equal: bool,
) -> Option<ValueDiff> {
    debug_assert_eq!(file1.len(), file2.len());

    let mut failing_values = 0usize;
    let mut max_abs = Maximum::default();
    let mut max_rel = Maximum::default();

    for (index, (&a, &b)) in file1.iter().zip(file2).enumerate() {
        if tolerance.is_close(a, b, nan_equal) {
            if a.is_finite() && b.is_finite() {
                max_abs.offer(index, (a - b).abs());
                if b != 0.0 {
                    max_rel.offer(index, ((a - b) / b).abs());
                }
            }
            continue;
        }

        failing_values += 1;
        max_abs.offer(index, (a - b).abs());
        if b != 0.0 {
            max_rel.offer(index, ((a - b) / b).abs());
        }
    }

    if failing_values == 0 {
        return None;
    }

    let (abs_index, max_abs_diff) = max_abs.best?;
    Some(ValueDiff {
        max_abs_diff,
        max_abs_diff_position: unravel_index(abs_index, shape),
        max_rel_diff: max_rel.best.map(|(_, value)| value),
        max_rel_diff_position: max_rel.best.map(|(index, _)| unravel_index(index, shape)),
        failing_values,
    })
}

#[derive(Debug, Default)]
struct Maximum {
    best: Option<(usize, f64)>,
}

impl Maximum {
    fn offer(&mut self, index: usize, value: f64) {
        let replace = match self.best {
            None => true,
            Some((_, best)) if best.is_nan() => false,
            Some((_, best)) => value.is_nan() || value > best,
        };
        if replace {
            self.best = Some((index, value));
        }
    }
}

/// Converts a flat row-major index into per-axis coordinates.
pub fn unravel_index(mut index: usize, shape: &[usize]) -> Vec<usize> {
    if shape.is_empty() {
        return Vec::new();
    }
    let mut position = vec![0usize; shape.len()];
    for (axis, &extent) in shape.iter().enumerate().rev() {
        if extent == 0 {
            continue;
        }
        position[axis] = index % extent;
        index /= extent;
    }
    position
}
