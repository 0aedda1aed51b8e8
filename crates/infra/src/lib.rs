//! Infrastructure layer: store adapters, client replica, service wiring.

pub mod notify;
pub mod replica;
pub mod service;
pub mod store;


pub use notify::{Notifier, NotifyRequest, TracingNotifier};
pub use replica::{ReplicaSet, WriteOp};
pub use service::{RotationService, ServiceError, StoreHandles};
pub use store::{Collection, InMemoryCollection, PostgresStore, StoreError};
