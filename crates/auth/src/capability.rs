//! Capability derivation.

use serde::{Deserialize, Serialize};

use crewdesk_core::Username;

use crate::{Profile, RoleTag};

/// Resolved capability of the acting user.
///
/// Computed **once** from the profile's tags and passed by reference into every
/// engine operation. The engine trusts these flags; it never re-derives them
/// from tag membership mid-operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub username: Username,
    pub has_lead_authority: bool,
    pub is_guest: bool,
}

impl Capability {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            username: profile.username.clone(),
            has_lead_authority: profile.tags.iter().any(|t| t.is_elevated()),
            is_guest: profile.tags.contains(&RoleTag::Guest),
        }
    }

    /// Capability for a plain member (tests, fallback identity).
    pub fn member(username: Username) -> Self {
        Self {
            username,
            has_lead_authority: false,
            is_guest: false,
        }
    }

    /// Capability for a lead (tests, trusted contexts).
    pub fn lead(username: Username) -> Self {
        Self {
            username,
            has_lead_authority: true,
            is_guest: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> Username {
        Username::new(name).unwrap()
    }

    #[test]
    fn any_elevated_tag_grants_lead_authority() {
        let p = Profile::new(user("dana"), "Dana", vec![RoleTag::Member, RoleTag::Moderator]);
        let caps = Capability::from_profile(&p);
        assert!(caps.has_lead_authority);
        assert!(!caps.is_guest);
    }

    #[test]
    fn plain_member_has_no_authority() {
        let p = Profile::new(user("eli"), "Eli", vec![RoleTag::Member]);
        let caps = Capability::from_profile(&p);
        assert!(!caps.has_lead_authority);
        assert!(!caps.is_guest);
    }

    #[test]
    fn guest_tag_is_reflected_even_alongside_lead() {
        let p = Profile::new(user("fay"), "Fay", vec![RoleTag::Guest, RoleTag::Lead]);
        let caps = Capability::from_profile(&p);
        assert!(caps.has_lead_authority);
        assert!(caps.is_guest);
    }
}
