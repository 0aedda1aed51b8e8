//! `crewdesk-events` — store change-feed types and fan-out.
//!
//! The backing store notifies clients of row changes per table; this crate
//! defines those events and the pub/sub mechanics used to distribute them to
//! local replicas.

pub mod bus;
pub mod change;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use change::{ChangeEvent, Table};
pub use in_memory_bus::InMemoryEventBus;
