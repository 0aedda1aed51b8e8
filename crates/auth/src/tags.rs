//! Role tags.

use serde::{Deserialize, Serialize};

use crewdesk_core::{DomainError, DomainResult};

/// Membership role tag.
///
/// A closed set rather than opaque strings: the elevated tier is a fixed,
/// known list, and capability derivation must not depend on ad-hoc tag
/// spellings showing up in profile data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTag {
    Owner,
    Lead,
    Moderator,
    Member,
    Guest,
}

impl RoleTag {
    /// Tags granting lead-level authority (generate, confirm, deny, exempt).
    pub fn is_elevated(self) -> bool {
        matches!(self, RoleTag::Owner | RoleTag::Lead | RoleTag::Moderator)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoleTag::Owner => "owner",
            RoleTag::Lead => "lead",
            RoleTag::Moderator => "moderator",
            RoleTag::Member => "member",
            RoleTag::Guest => "guest",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "owner" => Ok(RoleTag::Owner),
            "lead" => Ok(RoleTag::Lead),
            "moderator" => Ok(RoleTag::Moderator),
            "member" => Ok(RoleTag::Member),
            "guest" => Ok(RoleTag::Guest),
            other => Err(DomainError::validation(format!("unknown role tag: {other}"))),
        }
    }
}

impl core::fmt::Display for RoleTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevated_tier_is_exactly_owner_lead_moderator() {
        assert!(RoleTag::Owner.is_elevated());
        assert!(RoleTag::Lead.is_elevated());
        assert!(RoleTag::Moderator.is_elevated());
        assert!(!RoleTag::Member.is_elevated());
        assert!(!RoleTag::Guest.is_elevated());
    }

    #[test]
    fn parse_round_trips_every_tag() {
        for tag in [
            RoleTag::Owner,
            RoleTag::Lead,
            RoleTag::Moderator,
            RoleTag::Member,
            RoleTag::Guest,
        ] {
            assert_eq!(RoleTag::parse(tag.as_str()).unwrap(), tag);
        }
        assert!(RoleTag::parse("superuser").is_err());
    }
}
