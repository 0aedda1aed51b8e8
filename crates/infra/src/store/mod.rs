//! Persistent store contract.
//!
//! The backing platform exposes CRUD per entity collection plus a per-table
//! change feed. This module defines that boundary; `in_memory` implements it
//! for tests/dev, `postgres` against a managed Postgres.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crewdesk_core::Entity;
use crewdesk_events::{ChangeEvent, Subscription};

pub use in_memory::InMemoryCollection;
pub use postgres::PostgresStore;

/// Store operation error.
///
/// Infrastructure failures only; domain failures never reach this layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// One entity collection of the remote store.
///
/// Writes are durable once they return `Ok`; every mutation is also pushed to
/// the table's change feed (at-least-once), which is how *other* clients learn
/// about it. `delete_many` removes the whole batch atomically (all rows gone
/// or none).
#[async_trait]
pub trait Collection<T: Entity>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>, StoreError>;

    async fn insert(&self, record: T) -> Result<(), StoreError>;

    async fn update(&self, record: T) -> Result<(), StoreError>;

    async fn delete(&self, id: &T::Id) -> Result<(), StoreError>;

    async fn delete_many(&self, ids: &[T::Id]) -> Result<(), StoreError>;

    /// Tap this table's change feed.
    fn subscribe(&self) -> Subscription<ChangeEvent<T>>;
}
