//! Client session service: engine + replica + store wiring.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::error;

use crewdesk_auth::{Capability, Profile};
use crewdesk_core::{AssignmentId, DomainError, DomainResult, Entity, SessionId, Username};
use crewdesk_events::{ChangeEvent, Subscription, Table};
use crewdesk_rotation::{
    Assignment, CleanupSession, Exemption, GeneratedSession, Job, LeaderboardEntry,
    compute_leaderboard, exempt_user, generate_session, latest_session,
};

use crate::replica::{ReplicaSet, WriteOp};
use crate::store::{Collection, StoreError};

/// Store access for every collection the service touches.
#[derive(Clone)]
pub struct StoreHandles {
    pub jobs: Arc<dyn Collection<Job>>,
    pub sessions: Arc<dyn Collection<CleanupSession>>,
    pub assignments: Arc<dyn Collection<Assignment>>,
    pub exemptions: Arc<dyn Collection<Exemption>>,
    pub profiles: Arc<dyn Collection<Profile>>,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

struct ChangeFeeds {
    jobs: Subscription<ChangeEvent<Job>>,
    sessions: Subscription<ChangeEvent<CleanupSession>>,
    assignments: Subscription<ChangeEvent<Assignment>>,
    exemptions: Subscription<ChangeEvent<Exemption>>,
}

/// One client session over the shared store.
///
/// Single logical actor: operations run to completion, mutate the local
/// replicas first, then push the durable writes. A failed write is logged and
/// left for reconciliation: the local state stays authoritative for this
/// client until the change feed says otherwise. Nothing here coordinates
/// across clients; see [`latest_session`] for how concurrent generation
/// resolves.
pub struct RotationService {
    caps: Capability,
    jobs: ReplicaSet<Job>,
    sessions: ReplicaSet<CleanupSession>,
    assignments: ReplicaSet<Assignment>,
    exemptions: ReplicaSet<Exemption>,
    store: StoreHandles,
    feeds: ChangeFeeds,
}

impl RotationService {
    /// Connect as `username`: subscribe to the change feeds, hydrate the
    /// replicas, derive the capability from the stored profile.
    ///
    /// Subscribing before listing means a change landing mid-hydration is
    /// re-applied afterwards instead of lost; the merge being idempotent makes
    /// the overlap harmless.
    pub async fn connect(store: StoreHandles, username: &Username) -> Result<Self, ServiceError> {
        let feeds = ChangeFeeds {
            jobs: store.jobs.subscribe(),
            sessions: store.sessions.subscribe(),
            assignments: store.assignments.subscribe(),
            exemptions: store.exemptions.subscribe(),
        };

        let profiles = store.profiles.list().await?;
        let profile = profiles
            .iter()
            .find(|p| &p.username == username)
            .ok_or(DomainError::NotFound)?;
        let caps = Capability::from_profile(profile);

        Ok(Self {
            caps,
            jobs: ReplicaSet::hydrate(store.jobs.list().await?),
            sessions: ReplicaSet::hydrate(store.sessions.list().await?),
            assignments: ReplicaSet::hydrate(store.assignments.list().await?),
            exemptions: ReplicaSet::hydrate(store.exemptions.list().await?),
            store,
            feeds,
        })
    }

    pub fn capability(&self) -> &Capability {
        &self.caps
    }

    pub fn jobs(&self) -> &[Job] {
        self.jobs.records()
    }

    pub fn assignments(&self) -> &[Assignment] {
        self.assignments.records()
    }

    pub fn exemptions(&self) -> &[Exemption] {
        self.exemptions.records()
    }

    pub fn current_session(&self) -> Option<&CleanupSession> {
        latest_session(self.sessions.records())
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        compute_leaderboard(self.assignments.records())
    }

    /// Generate a cleanup session over the currently active jobs.
    pub async fn generate_session(
        &mut self,
        selected: &[Username],
        now: DateTime<Utc>,
    ) -> DomainResult<GeneratedSession> {
        let generated = generate_session(
            &self.caps,
            selected,
            self.jobs.records(),
            self.assignments.records(),
            now,
        )?;

        self.sessions
            .apply_local(WriteOp::Insert(generated.session.clone()));
        for assignment in &generated.assignments {
            self.assignments
                .apply_local(WriteOp::Insert(assignment.clone()));
        }
        self.flush().await;
        Ok(generated)
    }

    /// Claim own assignment as done.
    pub async fn mark_complete(&mut self, id: AssignmentId) -> DomainResult<Assignment> {
        let current = self.assignments.get(&id).ok_or(DomainError::NotFound)?;
        let updated = current.mark_complete(&self.caps.username)?;
        self.assignments.apply_local(WriteOp::Update(updated.clone()));
        self.flush().await;
        Ok(updated)
    }

    /// Confirm a claimed assignment, awarding its point.
    pub async fn confirm(
        &mut self,
        id: AssignmentId,
        now: DateTime<Utc>,
    ) -> DomainResult<Assignment> {
        let current = self.assignments.get(&id).ok_or(DomainError::NotFound)?;
        let updated = current.confirm(&self.caps, now)?;
        self.assignments.apply_local(WriteOp::Update(updated.clone()));
        self.flush().await;
        Ok(updated)
    }

    /// Deny a claimed assignment.
    pub async fn deny(&mut self, id: AssignmentId, now: DateTime<Utc>) -> DomainResult<Assignment> {
        let current = self.assignments.get(&id).ok_or(DomainError::NotFound)?;
        let updated = current.deny(&self.caps, now)?;
        self.assignments.apply_local(WriteOp::Update(updated.clone()));
        self.flush().await;
        Ok(updated)
    }

    /// Exempt a user from the current session, dropping their assignments.
    pub async fn exempt(
        &mut self,
        session_id: SessionId,
        username: &Username,
        now: DateTime<Utc>,
    ) -> DomainResult<Exemption> {
        let outcome = exempt_user(
            &self.caps,
            self.sessions.records(),
            self.assignments.records(),
            session_id,
            username,
            now,
        )?;

        self.exemptions
            .apply_local(WriteOp::Insert(outcome.exemption.clone()));
        if !outcome.removed.is_empty() {
            self.assignments
                .apply_local(WriteOp::DeleteMany(outcome.removed));
        }
        self.flush().await;
        Ok(outcome.exemption)
    }

    /// Merge everything queued on the change feeds into the local replicas.
    pub fn sync(&mut self) {
        for event in self.feeds.jobs.drain() {
            self.jobs.apply_remote(event);
        }
        for event in self.feeds.sessions.drain() {
            self.sessions.apply_remote(event);
        }
        for event in self.feeds.assignments.drain() {
            self.assignments.apply_remote(event);
        }
        for event in self.feeds.exemptions.drain() {
            self.exemptions.apply_remote(event);
        }
    }

    /// Push queued writes to the store, in dependency order (sessions before
    /// the assignments that reference them).
    async fn flush(&mut self) {
        flush_collection(
            Table::CleanupSessions,
            self.sessions.take_pending(),
            self.store.sessions.as_ref(),
        )
        .await;
        flush_collection(
            Table::CleanupExemptions,
            self.exemptions.take_pending(),
            self.store.exemptions.as_ref(),
        )
        .await;
        flush_collection(
            Table::CleanupAssignments,
            self.assignments.take_pending(),
            self.store.assignments.as_ref(),
        )
        .await;
    }
}

/// Execute queued writes, logging failures and moving on.
///
/// No retry and no rollback of the optimistic local state: the replica stays
/// ahead of the store until reconciliation catches the divergence.
async fn flush_collection<T>(table: Table, ops: Vec<WriteOp<T>>, collection: &dyn Collection<T>)
where
    T: Entity + Clone,
{
    for op in ops {
        let result = match op {
            WriteOp::Insert(record) => collection.insert(record).await,
            WriteOp::Update(record) => collection.update(record).await,
            WriteOp::Delete(id) => collection.delete(&id).await,
            WriteOp::DeleteMany(ids) => collection.delete_many(&ids).await,
        };
        if let Err(e) = result {
            error!(%table, error = %e, "durable write failed; leaving local state ahead of store");
        }
    }
}
