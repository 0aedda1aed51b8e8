//! Client-side replica of one store collection.

use std::collections::VecDeque;

use crewdesk_core::Entity;
use crewdesk_events::ChangeEvent;

/// A durable write queued behind an optimistic local mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp<T: Entity> {
    Insert(T),
    Update(T),
    Delete(T::Id),
    /// Atomic batch delete (exemption cleanup).
    DeleteMany(Vec<T::Id>),
}

/// Local view of a collection plus the writes not yet pushed to the store.
///
/// Mutations go through [`apply_local`](Self::apply_local): the record list is
/// updated immediately (the optimistic state this client renders from) and the
/// write op is queued for the service to flush. Remote changes arrive through
/// [`apply_remote`](Self::apply_remote), a pure merge by id: idempotent, so
/// at-least-once delivery and echoes of our own writes are no-ops, and tolerant
/// of out-of-order events across tables.
#[derive(Debug, Clone)]
pub struct ReplicaSet<T: Entity> {
    records: Vec<T>,
    pending: VecDeque<WriteOp<T>>,
}

impl<T> ReplicaSet<T>
where
    T: Entity + Clone,
{
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Replace the whole view (initial hydration or re-list after a gap).
    pub fn hydrate(records: Vec<T>) -> Self {
        Self {
            records,
            pending: VecDeque::new(),
        }
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Optimistic mutation: update the local view now, queue the durable write.
    pub fn apply_local(&mut self, op: WriteOp<T>) {
        match &op {
            WriteOp::Insert(record) => self.upsert(record.clone()),
            WriteOp::Update(record) => self.upsert(record.clone()),
            WriteOp::Delete(id) => self.remove(id),
            WriteOp::DeleteMany(ids) => {
                for id in ids {
                    self.remove(id);
                }
            }
        }
        self.pending.push_back(op);
    }

    /// Hand the queued writes to the flusher, leaving the queue empty.
    pub fn take_pending(&mut self) -> Vec<WriteOp<T>> {
        self.pending.drain(..).collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Merge one change-feed event into the local view.
    ///
    /// Insert applies only if the id is absent, update replaces by id (or
    /// inserts, covering an update that overtook its insert), delete filters
    /// by id. Applying the same event twice leaves the view unchanged.
    pub fn apply_remote(&mut self, event: ChangeEvent<T>) {
        match event {
            ChangeEvent::Inserted(record) => {
                if self.get(record.id()).is_none() {
                    self.records.push(record);
                }
            }
            ChangeEvent::Updated(record) => self.upsert(record),
            ChangeEvent::Deleted(id) => self.remove(&id),
        }
    }

    fn upsert(&mut self, record: T) {
        match self.records.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => *slot = record,
            None => self.records.push(record),
        }
    }

    fn remove(&mut self, id: &T::Id) {
        self.records.retain(|r| r.id() != id);
    }
}

impl<T> Default for ReplicaSet<T>
where
    T: Entity + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewdesk_rotation::Job;

    #[test]
    fn apply_local_updates_view_and_queues_write() {
        let mut replica: ReplicaSet<Job> = ReplicaSet::new();
        let job = Job::new("Sweep");

        replica.apply_local(WriteOp::Insert(job.clone()));
        assert_eq!(replica.records(), &[job.clone()]);
        assert_eq!(replica.take_pending(), vec![WriteOp::Insert(job)]);
        assert_eq!(replica.pending_len(), 0);
    }

    #[test]
    fn remote_insert_is_idempotent() {
        let mut replica: ReplicaSet<Job> = ReplicaSet::new();
        let job = Job::new("Sweep");

        replica.apply_remote(ChangeEvent::Inserted(job.clone()));
        replica.apply_remote(ChangeEvent::Inserted(job.clone()));
        assert_eq!(replica.len(), 1);
    }

    #[test]
    fn own_write_echo_is_a_no_op() {
        let mut replica: ReplicaSet<Job> = ReplicaSet::new();
        let job = Job::new("Sweep");

        replica.apply_local(WriteOp::Insert(job.clone()));
        replica.apply_remote(ChangeEvent::Inserted(job.clone()));
        assert_eq!(replica.records(), &[job]);
    }

    #[test]
    fn update_overtaking_insert_still_lands() {
        let mut replica: ReplicaSet<Job> = ReplicaSet::new();
        let mut job = Job::new("Sweep");
        job.active = false;

        // The update event arrives before the insert it logically follows.
        replica.apply_remote(ChangeEvent::Updated(job.clone()));
        replica.apply_remote(ChangeEvent::Inserted(Job {
            active: true,
            ..job.clone()
        }));

        // The stale insert must not resurrect the pre-update record.
        assert_eq!(replica.get(&job.id), Some(&job));
    }

    #[test]
    fn delete_then_redelivered_delete_is_harmless() {
        let mut replica: ReplicaSet<Job> = ReplicaSet::new();
        let job = Job::new("Sweep");

        replica.apply_remote(ChangeEvent::Inserted(job.clone()));
        replica.apply_remote(ChangeEvent::Deleted(job.id));
        replica.apply_remote(ChangeEvent::Deleted(job.id));
        assert!(replica.is_empty());
    }

    #[test]
    fn delete_many_clears_records_and_queues_one_batch() {
        let mut replica: ReplicaSet<Job> = ReplicaSet::new();
        let jobs: Vec<Job> = (0..3).map(|i| Job::new(format!("job-{i}"))).collect();
        for job in &jobs {
            replica.apply_remote(ChangeEvent::Inserted(job.clone()));
        }

        let ids: Vec<_> = jobs[..2].iter().map(|j| j.id).collect();
        replica.apply_local(WriteOp::DeleteMany(ids.clone()));

        assert_eq!(replica.records(), &jobs[2..]);
        assert_eq!(replica.take_pending(), vec![WriteOp::DeleteMany(ids)]);
    }
}
