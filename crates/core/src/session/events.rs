//! Session lifecycle notifications.

use tokio::sync::broadcast;
use tracing::debug;

/// Events published when the backend invalidates the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The backend answered 401/403; all persisted client state was cleared.
    /// Hosts react by sending the user back to the start (re-login).
    Invalidated {
        /// HTTP status that triggered the invalidation.
        status: u16,
        /// URL of the rejected request.
        url: String,
    },
}

/// Broadcast publisher for [`SessionEvent`]s.
///
/// Cheaply cloneable. Publishing with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Register for session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("No subscribers for session event");
        }
    }
}
