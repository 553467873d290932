pub mod errors;

pub use errors::{ExodiffError, ExodiffErrorCategory, ExodiffResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Which file of a comparison a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    File1,
    File2,
}

impl Side {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File1 => "file1",
            Self::File2 => "file2",
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Whether a comparison collects every difference or stops at the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionMode {
    #[default]
    Collect,
    FailFast,
}
