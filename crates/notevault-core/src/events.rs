//! Catalog event types, envelope, and event bus.
//!
//! Side effects that belong to the view layer (redirecting a guest to the
//! login screen, showing a rollback toast, refreshing a list) are published
//! here instead of being performed by the catalog. Views subscribe
//! independently; emitting with no subscribers is a silent drop.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Versioned event envelope.
///
/// The `event_type` field uses dot-namespaced names (e.g.
/// `"bookmark.rolled_back"`); `payload` holds the domain event.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// Namespaced event type.
    pub event_type: String,
    /// When the event occurred (UTC).
    pub occurred_at: DateTime<Utc>,
    /// Type of entity this event relates to (`"note"`, `"request"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// ID of the entity this event relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Domain-specific event data.
    pub payload: VaultEvent,
}

impl EventEnvelope {
    pub fn new(event: VaultEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            entity_type: event.entity_type().map(String::from),
            entity_id: event.entity_id().map(String::from),
            payload: event,
        }
    }
}

/// Domain events published by the catalog services.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum VaultEvent {
    /// A guest attempted an action that needs an identity; the view should
    /// redirect to the login screen.
    LoginRequired { action: String },
    /// The note snapshot was replaced.
    NotesLoaded { count: usize },
    /// A fetch failed; the previous snapshot is still shown.
    FetchFailed { resource: String, error: String },
    /// Optimistic bookmark value applied locally, remote call in flight.
    BookmarkApplied { note_id: String, bookmarked: bool },
    /// Remote bookmark mutation succeeded.
    BookmarkCommitted { note_id: String, bookmarked: bool },
    /// Remote bookmark mutation failed; the pre-toggle value was restored.
    BookmarkRolledBack {
        note_id: String,
        restored: bool,
        error: String,
    },
    NoteUploaded { note_id: String },
    NoteDeleted { note_id: String },
    RequestCreated { request_id: String },
    RequestFulfilled { request_id: String, note_id: String },
}

impl VaultEvent {
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            VaultEvent::LoginRequired { .. } => "auth.login_required",
            VaultEvent::NotesLoaded { .. } => "catalog.notes_loaded",
            VaultEvent::FetchFailed { .. } => "catalog.fetch_failed",
            VaultEvent::BookmarkApplied { .. } => "bookmark.applied",
            VaultEvent::BookmarkCommitted { .. } => "bookmark.committed",
            VaultEvent::BookmarkRolledBack { .. } => "bookmark.rolled_back",
            VaultEvent::NoteUploaded { .. } => "note.uploaded",
            VaultEvent::NoteDeleted { .. } => "note.deleted",
            VaultEvent::RequestCreated { .. } => "request.created",
            VaultEvent::RequestFulfilled { .. } => "request.fulfilled",
        }
    }

    pub fn entity_type(&self) -> Option<&'static str> {
        match self {
            VaultEvent::LoginRequired { .. }
            | VaultEvent::NotesLoaded { .. }
            | VaultEvent::FetchFailed { .. } => None,
            VaultEvent::BookmarkApplied { .. }
            | VaultEvent::BookmarkCommitted { .. }
            | VaultEvent::BookmarkRolledBack { .. }
            | VaultEvent::NoteUploaded { .. }
            | VaultEvent::NoteDeleted { .. } => Some("note"),
            VaultEvent::RequestCreated { .. } | VaultEvent::RequestFulfilled { .. } => {
                Some("request")
            }
        }
    }

    pub fn entity_id(&self) -> Option<&str> {
        match self {
            VaultEvent::LoginRequired { .. }
            | VaultEvent::NotesLoaded { .. }
            | VaultEvent::FetchFailed { .. } => None,
            VaultEvent::BookmarkApplied { note_id, .. }
            | VaultEvent::BookmarkCommitted { note_id, .. }
            | VaultEvent::BookmarkRolledBack { note_id, .. }
            | VaultEvent::NoteUploaded { note_id }
            | VaultEvent::NoteDeleted { note_id } => Some(note_id),
            VaultEvent::RequestCreated { request_id }
            | VaultEvent::RequestFulfilled { request_id, .. } => Some(request_id),
        }
    }
}

/// Broadcast bus shared by every catalog service.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: VaultEvent) {
        let envelope = EventEnvelope::new(event);
        let subscriber_count = self.tx.receiver_count();
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count,
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive enveloped events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
