//! Cleanup session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crewdesk_core::{Entity, SessionId, Username};

/// One invocation of the cleanup-generation algorithm.
///
/// Never mutated after creation; the session with the greatest `created_at` is
/// the *current* one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupSession {
    pub id: SessionId,
    pub generated_by: Username,
    pub created_at: DateTime<Utc>,
}

impl Entity for CleanupSession {
    type Id = SessionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// The current session: greatest `created_at`, ties broken by id.
///
/// Racy by construction: two leads generating concurrently both succeed and
/// the later `created_at` wins. Self-healing (every client converges on the
/// same winner) but the loser's intended rotation is silently superseded.
pub fn latest_session(sessions: &[CleanupSession]) -> Option<&CleanupSession> {
    sessions.iter().max_by_key(|s| (s.created_at, s.id))
}
