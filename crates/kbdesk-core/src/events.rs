//! Desk event types, envelope schema, and event bus for UI notifications.
//!
//! Every state change the UI has to react to (a confirmation dialog to open,
//! upload progress, an optimistic delete being committed or rolled back) is
//! published on one broadcast channel. Renderers subscribe independently.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::DocumentId;

// ============================================================================
// Event Envelope
// ============================================================================

/// Versioned envelope around a [`DeskEvent`].
///
/// `event_type` uses dot-namespaced names (e.g. `"upload.item_progress"`).
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// Namespaced event type.
    pub event_type: String,
    /// When the event occurred (UTC).
    pub occurred_at: DateTime<Utc>,
    /// Payload schema version.
    pub payload_version: u32,
    pub payload: DeskEvent,
}

impl EventEnvelope {
    pub fn new(event: DeskEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            payload_version: 1,
            payload: event,
        }
    }
}

// ============================================================================
// Desk Event (domain payloads)
// ============================================================================

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Transient, self-clearing.
    Success,
    /// Persistent until dismissed.
    Error,
}

/// Domain events, serialized with a `type` tag field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DeskEvent {
    /// An intent was staged and needs the user's confirmation.
    ConfirmationRequested { intent: String, count: usize },
    /// A staged intent was discarded.
    ConfirmationCancelled { intent: String },
    /// A confirmed upload batch began.
    BatchStarted { batch_id: Uuid, file_count: usize },
    /// The file at `index` is now the one uploading.
    ItemStarted {
        batch_id: Uuid,
        index: usize,
        name: String,
    },
    /// Progress of the uploading file changed.
    ItemProgress {
        batch_id: Uuid,
        index: usize,
        progress: f64,
    },
    /// A file was uploaded and merged into the collection.
    ItemCompleted {
        batch_id: Uuid,
        index: usize,
        document_id: DocumentId,
    },
    /// A file failed; the batch continues.
    ItemFailed {
        batch_id: Uuid,
        index: usize,
        name: String,
        error: String,
    },
    /// Every file of the batch was attempted.
    BatchFinished {
        batch_id: Uuid,
        added: usize,
        failed: usize,
    },
    /// Documents were removed optimistically; the remote call is pending.
    DeletePending { count: usize, message: String },
    /// The store confirmed the delete.
    DeleteCommitted { count: usize },
    /// The store refused the delete and local state was restored.
    DeleteRolledBack { count: usize, error: String },
    /// The collection was replaced by a fresh list.
    DocumentsLoaded { count: usize },
    /// A notice was raised for the user.
    NoticeRaised { level: NoticeLevel, message: String },
}

impl DeskEvent {
    /// Dot-namespaced type used in the envelope.
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            DeskEvent::ConfirmationRequested { .. } => "confirm.requested",
            DeskEvent::ConfirmationCancelled { .. } => "confirm.cancelled",
            DeskEvent::BatchStarted { .. } => "upload.batch_started",
            DeskEvent::ItemStarted { .. } => "upload.item_started",
            DeskEvent::ItemProgress { .. } => "upload.item_progress",
            DeskEvent::ItemCompleted { .. } => "upload.item_completed",
            DeskEvent::ItemFailed { .. } => "upload.item_failed",
            DeskEvent::BatchFinished { .. } => "upload.batch_finished",
            DeskEvent::DeletePending { .. } => "delete.pending",
            DeskEvent::DeleteCommitted { .. } => "delete.committed",
            DeskEvent::DeleteRolledBack { .. } => "delete.rolled_back",
            DeskEvent::DocumentsLoaded { .. } => "documents.loaded",
            DeskEvent::NoticeRaised { .. } => "notice.raised",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast channel for [`DeskEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    ///
    /// Recommended: 256 for production, 32 for tests.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers.
    ///
    /// With no active subscribers the event is silently dropped.
    pub fn emit(&self, event: DeskEvent) {
        let envelope = EventEnvelope::new(event);
        tracing::trace!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive enveloped events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
