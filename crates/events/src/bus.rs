//! Change-feed publishing/subscription abstraction (mechanics only).
//!
//! The bus is the **transport layer** for row changes after they have been
//! applied to the store: each durable write is followed by a publish, and every
//! connected client replica holds a subscription it drains into its local view.
//!
//! The contract is intentionally lightweight:
//!
//! - **Transport-agnostic**: in-memory channels here, websocket/replication
//!   streams in production deployments.
//! - **At-least-once delivery**: a change may be delivered more than once;
//!   replicas merge by id, so duplicates are no-ops.
//! - **No cross-table ordering**: subscriptions are per table and only that
//!   table's relative order can be relied on.
//! - **No persistence**: the store is the source of truth; a replica that
//!   missed events re-lists the collection instead of replaying the bus.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to a table's change stream.
///
/// Designed for single-threaded consumption: one replica drains one
/// subscription, typically with `recv_timeout` in a loop that also checks for
/// shutdown.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next change is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a change without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a change.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently queued without blocking.
    pub fn drain(&self) -> Vec<M> {
        let mut out = Vec::new();
        while let Ok(m) = self.try_recv() {
            out.push(m);
        }
        out
    }
}

/// Broadcast bus for one table's change feed.
///
/// Each subscriber gets a copy of every published change. `publish()` can fail;
/// since the write already landed in the store, callers log and move on rather
/// than retrying.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
