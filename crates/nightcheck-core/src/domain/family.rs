//! Interpreter families.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::CheckError;

/// Interpreter family a script belongs to.
///
/// `Python` is the bare interpreter declaration (`#!/.../python`) and
/// `Python3` the version-suffixed one; both share the `.py` extension and
/// are told apart by the declaration line. `Php` is recognised by extension
/// but has no syntax checker. `Unclassified` holds files whose shared
/// extension could not be resolved to a single family.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Python,
    Python3,
    Perl,
    Php,
    Unclassified,
}

impl Family {
    /// Get the family name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Family::Python => "python",
            Family::Python3 => "python3",
            Family::Perl => "perl",
            Family::Php => "php",
            Family::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "python2" | "py2" => Ok(Family::Python),
            "python3" | "py3" => Ok(Family::Python3),
            "perl" => Ok(Family::Perl),
            "php" => Ok(Family::Php),
            "unclassified" => Ok(Family::Unclassified),
            other => Err(CheckError::UnknownFamily(other.to_string())),
        }
    }
}
