//! Job assignment record and its confirmation state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crewdesk_auth::Capability;
use crewdesk_core::{AssignmentId, DomainError, DomainResult, Entity, JobId, SessionId, Username};

/// Points credited when a lead confirms an assignment.
pub const POINTS_PER_CONFIRMATION: u32 = 1;

/// Assignment life cycle.
///
/// Moves forward only: `Assigned → PendingConfirmation → {Confirmed | Denied}`.
/// Removal via exemption is a deletion, not a status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    PendingConfirmation,
    Confirmed,
    Denied,
}

impl AssignmentStatus {
    /// Terminal statuses admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, AssignmentStatus::Confirmed | AssignmentStatus::Denied)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::PendingConfirmation => "pending_confirmation",
            AssignmentStatus::Confirmed => "confirmed",
            AssignmentStatus::Denied => "denied",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "assigned" => Ok(AssignmentStatus::Assigned),
            "pending_confirmation" => Ok(AssignmentStatus::PendingConfirmation),
            "confirmed" => Ok(AssignmentStatus::Confirmed),
            "denied" => Ok(AssignmentStatus::Denied),
            other => Err(DomainError::validation(format!(
                "unknown assignment status: {other}"
            ))),
        }
    }
}

impl core::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One job handed to one user within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub session_id: SessionId,
    pub job_id: JobId,
    pub assigned_to: Username,
    pub status: AssignmentStatus,
    pub confirmed_by: Option<Username>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub points_awarded: u32,
}

impl Assignment {
    /// A freshly issued assignment, as created in bulk at session generation.
    pub fn issued(session_id: SessionId, job_id: JobId, assigned_to: Username) -> Self {
        Self {
            id: AssignmentId::new(),
            session_id,
            job_id,
            assigned_to,
            status: AssignmentStatus::Assigned,
            confirmed_by: None,
            confirmed_at: None,
            points_awarded: 0,
        }
    }

    /// Self-service completion claim: `Assigned → PendingConfirmation`.
    ///
    /// Only the assignee may claim their own assignment.
    pub fn mark_complete(&self, requested_by: &Username) -> DomainResult<Assignment> {
        if &self.assigned_to != requested_by {
            return Err(DomainError::Unauthorized);
        }
        if self.status != AssignmentStatus::Assigned {
            return Err(DomainError::invariant(format!(
                "cannot mark a {} assignment complete",
                self.status
            )));
        }

        let mut updated = self.clone();
        updated.status = AssignmentStatus::PendingConfirmation;
        Ok(updated)
    }

    /// Lead confirmation: `PendingConfirmation → Confirmed`, awarding points.
    ///
    /// Confirming straight from `Assigned` is rejected: the claim step is part
    /// of the workflow, not an optimization.
    pub fn confirm(&self, caps: &Capability, now: DateTime<Utc>) -> DomainResult<Assignment> {
        self.ensure_lead(caps)?;
        self.ensure_pending("confirm")?;

        let mut updated = self.clone();
        updated.status = AssignmentStatus::Confirmed;
        updated.confirmed_by = Some(caps.username.clone());
        updated.confirmed_at = Some(now);
        updated.points_awarded = POINTS_PER_CONFIRMATION;
        Ok(updated)
    }

    /// Lead denial: `PendingConfirmation → Denied`, terminal, no points.
    ///
    /// A denied assignment is never reassigned or reopened; regenerating the
    /// session is the only recovery path.
    pub fn deny(&self, caps: &Capability, now: DateTime<Utc>) -> DomainResult<Assignment> {
        self.ensure_lead(caps)?;
        self.ensure_pending("deny")?;

        let mut updated = self.clone();
        updated.status = AssignmentStatus::Denied;
        updated.confirmed_by = Some(caps.username.clone());
        updated.confirmed_at = Some(now);
        updated.points_awarded = 0;
        Ok(updated)
    }

    fn ensure_lead(&self, caps: &Capability) -> DomainResult<()> {
        if !caps.has_lead_authority {
            return Err(DomainError::Unauthorized);
        }
        Ok(())
    }

    fn ensure_pending(&self, action: &str) -> DomainResult<()> {
        if self.status != AssignmentStatus::PendingConfirmation {
            return Err(DomainError::invariant(format!(
                "cannot {action} a {} assignment",
                self.status
            )));
        }
        Ok(())
    }
}

impl Entity for Assignment {
    type Id = AssignmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
