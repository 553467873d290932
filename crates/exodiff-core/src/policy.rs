//! Comparison settings: tolerances, collection mode and name filters.
//!
//! Settings can be loaded from a JSON policy file:
//!
//! ```json
//! {
//!   "rtol": 1e-6,
//!   "atol": 1e-6,
//!   "nanEqual": false,
//!   "excludedDimensions": ["num_qa_rec"],
//!   "ignoredVariables": ["qa_records", "info_records"]
//! }
//! ```
//!
//! Every field is optional. Dimension and variable filters are glob patterns.

use crate::compare::Tolerance;
use crate::domain::{CollectionMode, ExodiffError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// String-length bookkeeping dimensions. They encode storage width, not
/// model content, and are never compared.
pub const STRING_LENGTH_DIMENSIONS: [&str; 3] = ["len_name", "len_line", "len_string"];

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComparisonPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atol: Option<f64>,
    #[serde(default)]
    pub nan_equal: bool,
    #[serde(default)]
    pub excluded_dimensions: Vec<String>,
    #[serde(default)]
    pub ignored_variables: Vec<String>,
}

impl ComparisonPolicy {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| PolicyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| PolicyError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        serde_json::from_str(json).map_err(|source| PolicyError::Parse {
            path: PathBuf::from("<inline-policy>"),
            source,
        })
    }

    pub fn compile(&self) -> Result<ComparisonOptions, PolicyError> {
        let tolerance = Tolerance {
            rtol: self.rtol.unwrap_or(Tolerance::DEFAULT.rtol),
            atol: self.atol.unwrap_or(Tolerance::DEFAULT.atol),
        };
        tolerance.validate()?;

        let excluded_dimensions = STRING_LENGTH_DIMENSIONS
            .iter()
            .map(|name| name.to_string())
            .chain(self.excluded_dimensions.iter().cloned())
            .collect::<Vec<_>>();

        Ok(ComparisonOptions {
            tolerance,
            mode: CollectionMode::Collect,
            nan_equal: self.nan_equal,
            excluded_dimensions: NameFilter::new(&excluded_dimensions)?,
            ignored_variables: NameFilter::new(&self.ignored_variables)?,
        })
    }
}

/// Ready-to-use settings for one comparison.
#[derive(Debug, Clone)]
pub struct ComparisonOptions {
    pub tolerance: Tolerance,
    pub mode: CollectionMode,
    pub nan_equal: bool,
    pub excluded_dimensions: NameFilter,
    pub ignored_variables: NameFilter,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self::with_tolerance(Tolerance::DEFAULT)
    }
}

impl ComparisonOptions {
    pub fn with_tolerance(tolerance: Tolerance) -> Self {
        Self {
            tolerance,
            mode: CollectionMode::Collect,
            nan_equal: false,
            excluded_dimensions: NameFilter::string_lengths(),
            ignored_variables: NameFilter::empty(),
        }
    }

    pub fn fail_fast(mut self) -> Self {
        self.mode = CollectionMode::FailFast;
        self
    }

    pub fn is_dimension_excluded(&self, name: &str) -> bool {
        self.excluded_dimensions.matches(name)
    }

    pub fn is_variable_ignored(&self, name: &str) -> bool {
        self.ignored_variables.matches(name)
    }
}

/// A set of glob patterns matched against dimension or variable names.
#[derive(Debug, Clone)]
pub struct NameFilter {
    patterns: Vec<String>,
    set: GlobSet,
}

impl NameFilter {
    pub fn new(patterns: &[String]) -> Result<Self, PolicyError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| PolicyError::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| PolicyError::InvalidGlob {
            pattern: patterns.join(", "),
            source,
        })?;
        Ok(Self {
            patterns: patterns.to_vec(),
            set,
        })
    }

    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn string_lengths() -> Self {
        let mut builder = GlobSetBuilder::new();
        for name in STRING_LENGTH_DIMENSIONS {
            if let Ok(glob) = Glob::new(name) {
                builder.add(glob);
            }
        }
        Self {
            patterns: STRING_LENGTH_DIMENSIONS.iter().map(|name| name.to_string()).collect(),
            set: builder.build().unwrap_or_else(|_| GlobSet::empty()),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.set.is_match(name)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to read comparison policy '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse comparison policy '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },
    #[error("invalid tolerance: {0}")]
    InvalidTolerance(String),
}

impl From<PolicyError> for ExodiffError {
    fn from(error: PolicyError) -> Self {
        let message = error.to_string();
        match error {
            PolicyError::Read { .. } => ExodiffError::io_system("IO.POLICY_ACCESS", message),
            PolicyError::Parse { .. }
            | PolicyError::InvalidGlob { .. }
            | PolicyError::InvalidTolerance(_) => {
                ExodiffError::input_validation("INPUT.POLICY", message)
            }
        }
    }
}
