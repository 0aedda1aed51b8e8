//! Postgres-backed store implementation.
//!
//! One table per entity collection, matching the hosted platform's layout:
//!
//! ```sql
//! CREATE TABLE jobs (
//!     id          UUID PRIMARY KEY,
//!     name        TEXT NOT NULL,
//!     active      BOOLEAN NOT NULL
//! );
//! CREATE TABLE cleanup_sessions (
//!     id           UUID PRIMARY KEY,
//!     generated_by TEXT NOT NULL,
//!     created_at   TIMESTAMPTZ NOT NULL
//! );
//! CREATE TABLE cleanup_assignments (
//!     id             UUID PRIMARY KEY,
//!     session_id     UUID NOT NULL,
//!     job_id         UUID NOT NULL,
//!     assigned_to    TEXT NOT NULL,
//!     status         TEXT NOT NULL,
//!     confirmed_by   TEXT,
//!     confirmed_at   TIMESTAMPTZ,
//!     points_awarded INTEGER NOT NULL DEFAULT 0,
//!     UNIQUE (session_id, job_id)
//! );
//! CREATE TABLE cleanup_exemptions (
//!     id          UUID PRIMARY KEY,
//!     session_id  UUID NOT NULL,
//!     username    TEXT NOT NULL,
//!     exempted_by TEXT NOT NULL,
//!     created_at  TIMESTAMPTZ NOT NULL
//! );
//! CREATE TABLE profiles (
//!     username     TEXT PRIMARY KEY,
//!     display_name TEXT NOT NULL,
//!     tags         TEXT[] NOT NULL DEFAULT '{}'
//! );
//! ```
//!
//! Change feeds ride `LISTEN`/`NOTIFY`: each table carries a trigger that
//! `pg_notify`s the `crewdesk_<table>` channel with a JSON payload of the form
//! `{"kind":"insert","record":{...}}`, `{"kind":"update","record":{...}}` or
//! `{"kind":"delete","id":...}`. [`PostgresStore::run_change_pump`] decodes
//! those notifications and fans them out to local subscribers.
//!
//! ## Error Mapping
//!
//! | SQLx error | Code | `StoreError` |
//! |------------|------|--------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | RowNotFound | N/A | `NotFound` |
//! | anything else | N/A | `Backend` |

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sqlx::postgres::{PgListener, PgRow};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crewdesk_auth::{Profile, RoleTag};
use crewdesk_core::{
    AssignmentId, Entity, ExemptionId, JobId, SessionId, Username,
};
use crewdesk_events::{ChangeEvent, EventBus, InMemoryEventBus, Subscription, Table};
use crewdesk_rotation::{Assignment, AssignmentStatus, CleanupSession, Exemption, Job};

use super::{Collection, StoreError};

/// Postgres store: five collections over one connection pool.
///
/// Writes do not echo onto the local buses; the database trigger notifies all
/// clients (this one included), so a client's own writes come back through the
/// same reconciliation path as everyone else's.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    job_changes: Arc<InMemoryEventBus<ChangeEvent<Job>>>,
    session_changes: Arc<InMemoryEventBus<ChangeEvent<CleanupSession>>>,
    assignment_changes: Arc<InMemoryEventBus<ChangeEvent<Assignment>>>,
    exemption_changes: Arc<InMemoryEventBus<ChangeEvent<Exemption>>>,
    profile_changes: Arc<InMemoryEventBus<ChangeEvent<Profile>>>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            job_changes: Arc::new(InMemoryEventBus::new()),
            session_changes: Arc::new(InMemoryEventBus::new()),
            assignment_changes: Arc::new(InMemoryEventBus::new()),
            exemption_changes: Arc::new(InMemoryEventBus::new()),
            profile_changes: Arc::new(InMemoryEventBus::new()),
        }
    }

    fn channel(table: Table) -> String {
        format!("crewdesk_{table}")
    }

    /// Pump database notifications into the local subscriber buses.
    ///
    /// Runs until the connection drops; callers spawn it on the runtime. A
    /// payload that fails to decode is logged and skipped; the replica stays
    /// behind until the next change or a re-list, never crashes.
    pub async fn run_change_pump(&self) -> Result<(), StoreError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("listen: {e}")))?;
        for table in [
            Table::Jobs,
            Table::CleanupSessions,
            Table::CleanupAssignments,
            Table::CleanupExemptions,
            Table::Profiles,
        ] {
            listener
                .listen(&Self::channel(table))
                .await
                .map_err(|e| StoreError::Backend(format!("listen {table}: {e}")))?;
        }

        loop {
            let notification = listener
                .recv()
                .await
                .map_err(|e| StoreError::Backend(format!("change feed: {e}")))?;
            let channel = notification.channel();
            let payload = notification.payload();

            let outcome = if channel == Self::channel(Table::Jobs) {
                decode_change::<Job>(payload).map(|ev| {
                    let _ = self.job_changes.publish(ev);
                })
            } else if channel == Self::channel(Table::CleanupSessions) {
                decode_change::<CleanupSession>(payload).map(|ev| {
                    let _ = self.session_changes.publish(ev);
                })
            } else if channel == Self::channel(Table::CleanupAssignments) {
                decode_change::<Assignment>(payload).map(|ev| {
                    let _ = self.assignment_changes.publish(ev);
                })
            } else if channel == Self::channel(Table::CleanupExemptions) {
                decode_change::<Exemption>(payload).map(|ev| {
                    let _ = self.exemption_changes.publish(ev);
                })
            } else if channel == Self::channel(Table::Profiles) {
                decode_change::<Profile>(payload).map(|ev| {
                    let _ = self.profile_changes.publish(ev);
                })
            } else {
                warn!(channel, "notification on unknown channel");
                Ok(())
            };

            if let Err(e) = outcome {
                warn!(channel, error = %e, "skipping undecodable change payload");
            }
        }
    }
}

/// Wire shape of a change notification payload.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WireChange<T, I> {
    Insert { record: T },
    Update { record: T },
    Delete { id: I },
}

fn decode_change<T>(payload: &str) -> Result<ChangeEvent<T>, StoreError>
where
    T: Entity + DeserializeOwned,
    T::Id: DeserializeOwned,
{
    let wire: WireChange<T, T::Id> =
        serde_json::from_str(payload).map_err(|e| StoreError::Decode(e.to_string()))?;
    Ok(match wire {
        WireChange::Insert { record } => ChangeEvent::Inserted(record),
        WireChange::Update { record } => ChangeEvent::Updated(record),
        WireChange::Delete { id } => ChangeEvent::Deleted(id),
    })
}

fn map_sqlx_error(op: &'static str, e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::Conflict(db.message().to_string())
        }
        _ => StoreError::Backend(format!("{op}: {e}")),
    }
}

fn decode_err(e: sqlx::Error) -> StoreError {
    StoreError::Decode(e.to_string())
}

fn username_from(raw: String) -> Result<Username, StoreError> {
    Username::new(raw).map_err(|e| StoreError::Decode(e.to_string()))
}

fn job_from_row(row: &PgRow) -> Result<Job, StoreError> {
    Ok(Job {
        id: JobId::from_uuid(row.try_get("id").map_err(decode_err)?),
        name: row.try_get("name").map_err(decode_err)?,
        active: row.try_get("active").map_err(decode_err)?,
    })
}

fn session_from_row(row: &PgRow) -> Result<CleanupSession, StoreError> {
    Ok(CleanupSession {
        id: SessionId::from_uuid(row.try_get("id").map_err(decode_err)?),
        generated_by: username_from(row.try_get("generated_by").map_err(decode_err)?)?,
        created_at: row.try_get("created_at").map_err(decode_err)?,
    })
}

fn assignment_from_row(row: &PgRow) -> Result<Assignment, StoreError> {
    let status: String = row.try_get("status").map_err(decode_err)?;
    let confirmed_by = row
        .try_get::<Option<String>, _>("confirmed_by")
        .map_err(decode_err)?
        .map(Username::new)
        .transpose()
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    let points: i32 = row.try_get("points_awarded").map_err(decode_err)?;

    Ok(Assignment {
        id: AssignmentId::from_uuid(row.try_get("id").map_err(decode_err)?),
        session_id: SessionId::from_uuid(row.try_get("session_id").map_err(decode_err)?),
        job_id: JobId::from_uuid(row.try_get("job_id").map_err(decode_err)?),
        assigned_to: username_from(row.try_get("assigned_to").map_err(decode_err)?)?,
        status: AssignmentStatus::parse(&status).map_err(|e| StoreError::Decode(e.to_string()))?,
        confirmed_by,
        confirmed_at: row.try_get("confirmed_at").map_err(decode_err)?,
        points_awarded: u32::try_from(points)
            .map_err(|_| StoreError::Decode(format!("negative points: {points}")))?,
    })
}

fn exemption_from_row(row: &PgRow) -> Result<Exemption, StoreError> {
    Ok(Exemption {
        id: ExemptionId::from_uuid(row.try_get("id").map_err(decode_err)?),
        session_id: SessionId::from_uuid(row.try_get("session_id").map_err(decode_err)?),
        username: username_from(row.try_get("username").map_err(decode_err)?)?,
        exempted_by: username_from(row.try_get("exempted_by").map_err(decode_err)?)?,
        created_at: row.try_get("created_at").map_err(decode_err)?,
    })
}

fn profile_from_row(row: &PgRow) -> Result<Profile, StoreError> {
    let tags: Vec<String> = row.try_get("tags").map_err(decode_err)?;
    let tags = tags
        .iter()
        .map(|t| RoleTag::parse(t))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::Decode(e.to_string()))?;

    Ok(Profile {
        username: username_from(row.try_get("username").map_err(decode_err)?)?,
        display_name: row.try_get("display_name").map_err(decode_err)?,
        tags,
    })
}

#[async_trait]
impl Collection<Job> for PostgresStore {
    #[instrument(skip(self), fields(table = %Table::Jobs), err)]
    async fn list(&self) -> Result<Vec<Job>, StoreError> {
        // UUIDv7 ids are time-ordered, so ordering by id is creation order.
        let rows = sqlx::query("SELECT id, name, active FROM jobs ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list jobs", e))?;
        rows.iter().map(job_from_row).collect()
    }

    #[instrument(skip(self, record), fields(table = %Table::Jobs, id = %record.id), err)]
    async fn insert(&self, record: Job) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO jobs (id, name, active) VALUES ($1, $2, $3)")
            .bind(record.id.as_uuid())
            .bind(&record.name)
            .bind(record.active)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert job", e))?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(table = %Table::Jobs, id = %record.id), err)]
    async fn update(&self, record: Job) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE jobs SET name = $2, active = $3 WHERE id = $1")
            .bind(record.id.as_uuid())
            .bind(&record.name)
            .bind(record.active)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update job", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(table = %Table::Jobs, id = %id), err)]
    async fn delete(&self, id: &JobId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete job", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, ids), fields(table = %Table::Jobs, count = ids.len()), err)]
    async fn delete_many(&self, ids: &[JobId]) -> Result<(), StoreError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        sqlx::query("DELETE FROM jobs WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete jobs", e))?;
        Ok(())
    }

    fn subscribe(&self) -> Subscription<ChangeEvent<Job>> {
        self.job_changes.subscribe()
    }
}

#[async_trait]
impl Collection<CleanupSession> for PostgresStore {
    #[instrument(skip(self), fields(table = %Table::CleanupSessions), err)]
    async fn list(&self) -> Result<Vec<CleanupSession>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, generated_by, created_at FROM cleanup_sessions ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list sessions", e))?;
        rows.iter().map(session_from_row).collect()
    }

    #[instrument(skip(self, record), fields(table = %Table::CleanupSessions, id = %record.id), err)]
    async fn insert(&self, record: CleanupSession) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO cleanup_sessions (id, generated_by, created_at) VALUES ($1, $2, $3)",
        )
        .bind(record.id.as_uuid())
        .bind(record.generated_by.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert session", e))?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(table = %Table::CleanupSessions, id = %record.id), err)]
    async fn update(&self, record: CleanupSession) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE cleanup_sessions SET generated_by = $2, created_at = $3 WHERE id = $1",
        )
        .bind(record.id.as_uuid())
        .bind(record.generated_by.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update session", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(table = %Table::CleanupSessions, id = %id), err)]
    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM cleanup_sessions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete session", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, ids), fields(table = %Table::CleanupSessions, count = ids.len()), err)]
    async fn delete_many(&self, ids: &[SessionId]) -> Result<(), StoreError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        sqlx::query("DELETE FROM cleanup_sessions WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete sessions", e))?;
        Ok(())
    }

    fn subscribe(&self) -> Subscription<ChangeEvent<CleanupSession>> {
        self.session_changes.subscribe()
    }
}

#[async_trait]
impl Collection<Assignment> for PostgresStore {
    #[instrument(skip(self), fields(table = %Table::CleanupAssignments), err)]
    async fn list(&self) -> Result<Vec<Assignment>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, session_id, job_id, assigned_to, status, confirmed_by, confirmed_at, \
             points_awarded FROM cleanup_assignments ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list assignments", e))?;
        rows.iter().map(assignment_from_row).collect()
    }

    #[instrument(skip(self, record), fields(table = %Table::CleanupAssignments, id = %record.id), err)]
    async fn insert(&self, record: Assignment) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO cleanup_assignments \
             (id, session_id, job_id, assigned_to, status, confirmed_by, confirmed_at, points_awarded) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(record.id.as_uuid())
        .bind(record.session_id.as_uuid())
        .bind(record.job_id.as_uuid())
        .bind(record.assigned_to.as_str())
        .bind(record.status.as_str())
        .bind(record.confirmed_by.as_ref().map(|u| u.as_str()))
        .bind(record.confirmed_at)
        .bind(record.points_awarded as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert assignment", e))?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(table = %Table::CleanupAssignments, id = %record.id), err)]
    async fn update(&self, record: Assignment) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE cleanup_assignments SET session_id = $2, job_id = $3, assigned_to = $4, \
             status = $5, confirmed_by = $6, confirmed_at = $7, points_awarded = $8 WHERE id = $1",
        )
        .bind(record.id.as_uuid())
        .bind(record.session_id.as_uuid())
        .bind(record.job_id.as_uuid())
        .bind(record.assigned_to.as_str())
        .bind(record.status.as_str())
        .bind(record.confirmed_by.as_ref().map(|u| u.as_str()))
        .bind(record.confirmed_at)
        .bind(record.points_awarded as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update assignment", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(table = %Table::CleanupAssignments, id = %id), err)]
    async fn delete(&self, id: &AssignmentId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM cleanup_assignments WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete assignment", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Single statement, so exemption cleanup removes the whole batch or
    /// nothing.
    #[instrument(skip(self, ids), fields(table = %Table::CleanupAssignments, count = ids.len()), err)]
    async fn delete_many(&self, ids: &[AssignmentId]) -> Result<(), StoreError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        sqlx::query("DELETE FROM cleanup_assignments WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete assignments", e))?;
        Ok(())
    }

    fn subscribe(&self) -> Subscription<ChangeEvent<Assignment>> {
        self.assignment_changes.subscribe()
    }
}

#[async_trait]
impl Collection<Exemption> for PostgresStore {
    #[instrument(skip(self), fields(table = %Table::CleanupExemptions), err)]
    async fn list(&self) -> Result<Vec<Exemption>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, session_id, username, exempted_by, created_at \
             FROM cleanup_exemptions ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list exemptions", e))?;
        rows.iter().map(exemption_from_row).collect()
    }

    #[instrument(skip(self, record), fields(table = %Table::CleanupExemptions, id = %record.id), err)]
    async fn insert(&self, record: Exemption) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO cleanup_exemptions (id, session_id, username, exempted_by, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.id.as_uuid())
        .bind(record.session_id.as_uuid())
        .bind(record.username.as_str())
        .bind(record.exempted_by.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert exemption", e))?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(table = %Table::CleanupExemptions, id = %record.id), err)]
    async fn update(&self, record: Exemption) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE cleanup_exemptions SET session_id = $2, username = $3, exempted_by = $4, \
             created_at = $5 WHERE id = $1",
        )
        .bind(record.id.as_uuid())
        .bind(record.session_id.as_uuid())
        .bind(record.username.as_str())
        .bind(record.exempted_by.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update exemption", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(table = %Table::CleanupExemptions, id = %id), err)]
    async fn delete(&self, id: &ExemptionId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM cleanup_exemptions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete exemption", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, ids), fields(table = %Table::CleanupExemptions, count = ids.len()), err)]
    async fn delete_many(&self, ids: &[ExemptionId]) -> Result<(), StoreError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        sqlx::query("DELETE FROM cleanup_exemptions WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete exemptions", e))?;
        Ok(())
    }

    fn subscribe(&self) -> Subscription<ChangeEvent<Exemption>> {
        self.exemption_changes.subscribe()
    }
}

#[async_trait]
impl Collection<Profile> for PostgresStore {
    #[instrument(skip(self), fields(table = %Table::Profiles), err)]
    async fn list(&self) -> Result<Vec<Profile>, StoreError> {
        let rows =
            sqlx::query("SELECT username, display_name, tags FROM profiles ORDER BY username")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("list profiles", e))?;
        rows.iter().map(profile_from_row).collect()
    }

    #[instrument(skip(self, record), fields(table = %Table::Profiles, username = %record.username), err)]
    async fn insert(&self, record: Profile) -> Result<(), StoreError> {
        let tags: Vec<String> = record.tags.iter().map(|t| t.as_str().to_string()).collect();
        sqlx::query("INSERT INTO profiles (username, display_name, tags) VALUES ($1, $2, $3)")
            .bind(record.username.as_str())
            .bind(&record.display_name)
            .bind(tags)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert profile", e))?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(table = %Table::Profiles, username = %record.username), err)]
    async fn update(&self, record: Profile) -> Result<(), StoreError> {
        let tags: Vec<String> = record.tags.iter().map(|t| t.as_str().to_string()).collect();
        let result =
            sqlx::query("UPDATE profiles SET display_name = $2, tags = $3 WHERE username = $1")
                .bind(record.username.as_str())
                .bind(&record.display_name)
                .bind(tags)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("update profile", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(table = %Table::Profiles, username = %id), err)]
    async fn delete(&self, id: &Username) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM profiles WHERE username = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete profile", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, ids), fields(table = %Table::Profiles, count = ids.len()), err)]
    async fn delete_many(&self, ids: &[Username]) -> Result<(), StoreError> {
        let ids: Vec<String> = ids.iter().map(|u| u.as_str().to_string()).collect();
        sqlx::query("DELETE FROM profiles WHERE username = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete profiles", e))?;
        Ok(())
    }

    fn subscribe(&self) -> Subscription<ChangeEvent<Profile>> {
        self.profile_changes.subscribe()
    }
}
