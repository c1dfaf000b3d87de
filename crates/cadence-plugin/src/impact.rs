//! Release impact.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The SemVer component a set of commits requires bumping.
///
/// Variants are declared in ascending order so the derived `Ord` gives
/// `None < Patch < Minor < Major`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseImpact {
    /// No release needed.
    #[default]
    None,
    /// Patch release (bug fixes).
    Patch,
    /// Minor release (new features).
    Minor,
    /// Major release (breaking changes).
    Major,
}

impl ReleaseImpact {
    /// Returns true if this impact warrants a release.
    #[must_use]
    pub fn is_release(self) -> bool {
        self != Self::None
    }
}

impl fmt::Display for ReleaseImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
            Self::None => write!(f, "none"),
        }
    }
}

/// A release token outside of `none`, `patch`, `minor`, `major`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized release impact `{0}` (expected none, patch, minor or major)")]
pub struct UnknownImpact(pub String);

impl FromStr for ReleaseImpact {
    type Err = UnknownImpact;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "patch" => Ok(Self::Patch),
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            other => Err(UnknownImpact(other.to_string())),
        }
    }
}
