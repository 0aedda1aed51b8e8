//! In-memory store for tests/dev.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crewdesk_core::Entity;
use crewdesk_events::{ChangeEvent, EventBus, InMemoryEventBus, Subscription};

use super::{Collection, StoreError};

/// In-memory collection with change-feed fan-out.
///
/// Records keep insertion order (the store lists in creation order, which is
/// what job ordering relies on). Every successful mutation is published to the
/// attached bus, so in-process clients reconcile exactly as they would against
/// the hosted platform.
#[derive(Debug)]
pub struct InMemoryCollection<T: Entity> {
    records: RwLock<Vec<T>>,
    changes: Arc<InMemoryEventBus<ChangeEvent<T>>>,
}

impl<T: Entity> InMemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            changes: Arc::new(InMemoryEventBus::new()),
        }
    }

    /// Seed without publishing (initial fixture state).
    pub fn seed(&self, records: impl IntoIterator<Item = T>) {
        if let Ok(mut all) = self.records.write() {
            all.extend(records);
        }
    }

    fn publish(&self, event: ChangeEvent<T>)
    where
        T: Clone + Send + 'static,
        T::Id: Send + 'static,
    {
        // Best-effort fan-out; a poisoned bus only stops notifications.
        let _ = self.changes.publish(event);
    }
}

impl<T: Entity> Default for InMemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Collection<T> for InMemoryCollection<T>
where
    T: Entity + Clone + Send + Sync + 'static,
    T::Id: Send + Sync + 'static,
{
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Backend("records lock poisoned".into()))?;
        Ok(records.clone())
    }

    async fn insert(&self, record: T) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("records lock poisoned".into()))?;
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(StoreError::Conflict(format!(
                "duplicate id {:?}",
                record.id()
            )));
        }
        records.push(record.clone());
        drop(records);
        self.publish(ChangeEvent::Inserted(record));
        Ok(())
    }

    async fn update(&self, record: T) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("records lock poisoned".into()))?;
        let slot = records
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or(StoreError::NotFound)?;
        *slot = record.clone();
        drop(records);
        self.publish(ChangeEvent::Updated(record));
        Ok(())
    }

    async fn delete(&self, id: &T::Id) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("records lock poisoned".into()))?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(StoreError::NotFound);
        }
        drop(records);
        self.publish(ChangeEvent::Deleted(id.clone()));
        Ok(())
    }

    async fn delete_many(&self, ids: &[T::Id]) -> Result<(), StoreError> {
        // Single write lock: the batch lands atomically, matching the
        // Postgres single-statement delete.
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("records lock poisoned".into()))?;
        records.retain(|r| !ids.contains(r.id()));
        drop(records);
        for id in ids {
            self.publish(ChangeEvent::Deleted(id.clone()));
        }
        Ok(())
    }

    fn subscribe(&self) -> Subscription<ChangeEvent<T>> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewdesk_rotation::Job;

    #[tokio::test]
    async fn insert_then_list_preserves_order() {
        let store = InMemoryCollection::new();
        let sweep = Job::new("Sweep");
        let trash = Job::new("Trash");
        store.insert(sweep.clone()).await.unwrap();
        store.insert(trash.clone()).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![sweep, trash]);
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts() {
        let store = InMemoryCollection::new();
        let job = Job::new("Sweep");
        store.insert(job.clone()).await.unwrap();
        assert!(matches!(
            store.insert(job).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn mutations_reach_subscribers() {
        let store = InMemoryCollection::new();
        let feed = store.subscribe();

        let mut job = Job::new("Sweep");
        store.insert(job.clone()).await.unwrap();
        job.active = false;
        store.update(job.clone()).await.unwrap();
        store.delete(&job.id).await.unwrap();

        let events = feed.drain();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], ChangeEvent::Inserted(_)));
        assert!(matches!(events[1], ChangeEvent::Updated(_)));
        assert!(matches!(events[2], ChangeEvent::Deleted(id) if id == job.id));
    }

    #[tokio::test]
    async fn delete_many_removes_the_whole_batch() {
        let store = InMemoryCollection::new();
        let jobs: Vec<Job> = (0..4).map(|i| Job::new(format!("job-{i}"))).collect();
        for job in &jobs {
            store.insert(job.clone()).await.unwrap();
        }

        let ids: Vec<_> = jobs[..3].iter().map(|j| j.id).collect();
        store.delete_many(&ids).await.unwrap();

        let remaining = store.list().await.unwrap();
        assert_eq!(remaining, vec![jobs[3].clone()]);
    }
}
