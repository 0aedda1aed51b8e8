//! Outbound push-notification side-channel.

use serde::{Deserialize, Serialize};

use crewdesk_core::Username;

/// One outbound "notify user" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub username: Username,
    pub title: String,
    pub body: String,
    /// Deliver even if the user muted the category.
    pub force: bool,
}

/// Fire-and-forget delivery contract.
///
/// The transport (webhook-triggered outbound push in production) is out of
/// scope; callers treat failure as log-and-continue, never as an operation
/// failure. The rotation engine itself never notifies; callers higher in the
/// stack do.
pub trait Notifier: Send + Sync {
    fn notify(&self, request: NotifyRequest);
}

/// Dev/test notifier: logs the request instead of delivering it.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, request: NotifyRequest) {
        tracing::info!(
            username = %request.username,
            title = %request.title,
            force = request.force,
            "notification dispatched"
        );
    }
}
