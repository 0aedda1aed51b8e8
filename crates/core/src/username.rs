//! Username value object.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Canonical username: the key for assignments, exemptions and the leaderboard.
///
/// Normalized on construction (trimmed, lowercased) so that fairness counting
/// and exemption matching never depend on how the caller spelled the name.
/// Ordering is lexicographic on the normalized form, which is what leaderboard
/// tie-breaking relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn new(raw: impl AsRef<str>) -> DomainResult<Self> {
        let normalized = raw.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Username {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Username {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
