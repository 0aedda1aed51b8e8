//! Row change events.

use serde::{Deserialize, Serialize};

use crewdesk_core::Entity;

/// The entity collections the store exposes a change feed for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Jobs,
    CleanupSessions,
    CleanupAssignments,
    CleanupExemptions,
    Profiles,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Jobs => "jobs",
            Table::CleanupSessions => "cleanup_sessions",
            Table::CleanupAssignments => "cleanup_assignments",
            Table::CleanupExemptions => "cleanup_exemptions",
            Table::Profiles => "profiles",
        }
    }
}

impl core::fmt::Display for Table {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row change pushed by the store.
///
/// Delivery is at-least-once and ordering is only guaranteed within a table,
/// never across tables. Consumers merge these by id and must be idempotent.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<T: Entity> {
    Inserted(T),
    Updated(T),
    Deleted(T::Id),
}

impl<T: Entity> ChangeEvent<T> {
    /// The id of the affected row, whichever variant this is.
    pub fn row_id(&self) -> &T::Id {
        match self {
            ChangeEvent::Inserted(record) | ChangeEvent::Updated(record) => record.id(),
            ChangeEvent::Deleted(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Inserted(_) => "insert",
            ChangeEvent::Updated(_) => "update",
            ChangeEvent::Deleted(_) => "delete",
        }
    }
}
