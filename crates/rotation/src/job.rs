//! Cleanup job record.

use serde::{Deserialize, Serialize};

use crewdesk_core::{Entity, JobId};

/// A recurring cleanup job (e.g. "sweep floor").
///
/// Created and deactivated by admin actions outside the engine; generation only
/// ever reads the `active` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub active: bool,
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            name: name.into(),
            active: true,
        }
    }
}

impl Entity for Job {
    type Id = JobId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
