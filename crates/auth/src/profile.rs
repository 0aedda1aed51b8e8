//! Member profile record.

use serde::{Deserialize, Serialize};

use crewdesk_core::{Entity, Username};

use crate::RoleTag;

/// A member's profile as stored in the `profiles` collection.
///
/// The profile is the only source of role tags; everything downstream works
/// from a [`crate::Capability`] derived from it once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: Username,
    pub display_name: String,
    pub tags: Vec<RoleTag>,
}

impl Profile {
    pub fn new(username: Username, display_name: impl Into<String>, tags: Vec<RoleTag>) -> Self {
        Self {
            username,
            display_name: display_name.into(),
            tags,
        }
    }
}

impl Entity for Profile {
    type Id = Username;

    fn id(&self) -> &Self::Id {
        &self.username
    }
}
