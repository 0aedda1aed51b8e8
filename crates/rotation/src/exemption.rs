//! Session exemption record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crewdesk_core::{Entity, ExemptionId, SessionId, Username};

/// A lead's removal of a user from a session's obligations.
///
/// Append-only: exemptions are never deleted, they only accumulate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exemption {
    pub id: ExemptionId,
    pub session_id: SessionId,
    pub username: Username,
    pub exempted_by: Username,
    pub created_at: DateTime<Utc>,
}

impl Entity for Exemption {
    type Id = ExemptionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
