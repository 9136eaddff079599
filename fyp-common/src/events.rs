//! Portal event types and broadcast bus
//!
//! Live views and the mutation coordinator publish what happened here;
//! the CLI (or any other front-end) subscribes to render it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::status::{DocumentStatus, Role};

/// Portal event types
///
/// Events are broadcast via [`EventBus`] and serialize with a `type` tag so a
/// front-end can consume them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PortalEvent {
    /// A document moved to a new status (optimistically or confirmed)
    DocumentStatusChanged {
        document_id: i64,
        from: DocumentStatus,
        to: DocumentStatus,
        timestamp: DateTime<Utc>,
    },

    /// The backend accepted a mutation
    MutationConfirmed {
        label: String,
        timestamp: DateTime<Utc>,
    },

    /// A mutation failed and the view was restored to its snapshot
    MutationRolledBack {
        label: String,
        /// Error kind, e.g. `network_failure`
        kind: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A strictly newer unread notification arrived
    NotificationPopup {
        notification_id: i64,
        title: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// The popup for this notification timed out
    PopupDismissed {
        notification_id: i64,
        timestamp: DateTime<Utc>,
    },

    /// Unread badge count changed
    UnreadCountChanged {
        count: u64,
        timestamp: DateTime<Utc>,
    },

    /// New messages in the watched chat group
    ChatUpdated {
        group_id: i64,
        message_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A user signed in or a stored session was hydrated
    SessionStarted {
        user_id: i64,
        role: Role,
        timestamp: DateTime<Utc>,
    },

    /// The session was torn down (logout or auth failure)
    SessionEnded {
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl PortalEvent {
    /// Event type name (matches the serde tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            PortalEvent::DocumentStatusChanged { .. } => "DocumentStatusChanged",
            PortalEvent::MutationConfirmed { .. } => "MutationConfirmed",
            PortalEvent::MutationRolledBack { .. } => "MutationRolledBack",
            PortalEvent::NotificationPopup { .. } => "NotificationPopup",
            PortalEvent::PopupDismissed { .. } => "PopupDismissed",
            PortalEvent::UnreadCountChanged { .. } => "UnreadCountChanged",
            PortalEvent::ChatUpdated { .. } => "ChatUpdated",
            PortalEvent::SessionStarted { .. } => "SessionStarted",
            PortalEvent::SessionEnded { .. } => "SessionEnded",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Wraps `tokio::sync::broadcast`: publishing never blocks, slow
/// subscribers see `Lagged` instead of stalling producers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PortalEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PortalEvent> {
        self.tx.subscribe()
    }

    /// Emit an event; `Err` when nobody is listening
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PortalEvent,
    ) -> Result<usize, broadcast::error::SendError<PortalEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PortalEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
